//! Pure URL classification shared by every interception hook.
//!
//! [`NavigationPolicy`] is the single source of truth for what the content view
//! may load. The navigation guard consumes it for top-level and redirect
//! decisions, the subresource filter for everything else.

use crate::security::{BuildMode, GatewaySettings};
use url::{Host, Url};

/// Scheme serving packaged application content.
pub const APP_SCHEME: &str = "app";

/// Scheme of the host runtime's built-in error page.
pub const INTERNAL_ERROR_SCHEME: &str = "chrome-error";

/// Domains whose links may be handed to the system browser from a new-window intent.
pub const TRUSTED_EXTERNAL_DOMAINS: &[&str] = &[
    "github.com",
    "discord.gg",
    "discord.com",
    "store.steampowered.com",
];

/// Host suffixes of the crash/telemetry ingestion endpoints.
pub const TELEMETRY_HOST_SUFFIXES: &[&str] = &["ingest.sentry.io", "ingest.us.sentry.io"];

/// Parse a raw URL coming from the content view. Malformed input yields `None`.
pub fn parse_target(raw: &str) -> Option<Url> {
    Url::parse(raw.trim()).ok()
}

pub fn is_web_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

pub fn is_app_scheme(url: &Url) -> bool {
    url.scheme() == APP_SCHEME
}

/// Whether the URL points at the host's internal error surface.
pub fn is_internal_error_surface(raw: &str) -> bool {
    raw.trim_start()
        .get(..INTERNAL_ERROR_SCHEME.len() + 1)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("chrome-error:"))
}

/// Whether the URL host is a loopback name or address.
pub fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(addr)) => addr.is_loopback(),
        Some(Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    }
}

/// Whether `host` equals `domain` or is a subdomain of it.
fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// http(s) URL whose host is on [`TRUSTED_EXTERNAL_DOMAINS`].
pub fn is_trusted_external(url: &Url) -> bool {
    if !is_web_scheme(url) {
        return false;
    }
    url.host_str().is_some_and(|host| {
        TRUSTED_EXTERNAL_DOMAINS
            .iter()
            .any(|domain| host_matches(host, domain))
    })
}

/// https URL pointing at a telemetry ingestion endpoint.
pub fn is_telemetry_endpoint(url: &Url) -> bool {
    url.scheme() == "https"
        && url.host_str().is_some_and(|host| {
            TELEMETRY_HOST_SUFFIXES
                .iter()
                .any(|suffix| host_matches(host, suffix))
        })
}

/// Same scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str().map(str::to_ascii_lowercase) == b.host_str().map(str::to_ascii_lowercase)
        && a.port_or_known_default() == b.port_or_known_default()
}

/// URL allow-lists for one process, derived from the startup settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationPolicy {
    mode: BuildMode,
    dev_origin: Option<Url>,
}

impl NavigationPolicy {
    pub fn new(settings: &GatewaySettings) -> Self {
        Self {
            mode: settings.mode,
            dev_origin: settings.effective_dev_origin(),
        }
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn dev_origin(&self) -> Option<&Url> {
        self.dev_origin.as_ref()
    }

    fn is_dev_origin(&self, url: &Url) -> bool {
        self.dev_origin
            .as_ref()
            .is_some_and(|origin| same_origin(origin, url))
    }

    /// Targets the content view itself may navigate to.
    pub fn allows_top_level(&self, url: &Url) -> bool {
        if is_app_scheme(url) {
            return true;
        }
        if !self.mode.is_development() {
            return false;
        }
        self.is_dev_origin(url) || (is_web_scheme(url) && is_loopback(url))
    }

    /// Targets a page may fetch as a subresource.
    pub fn allows_subresource(&self, url: &Url) -> bool {
        match url.scheme() {
            APP_SCHEME | "file" | "data" | "blob" => return true,
            _ => {}
        }
        if is_telemetry_endpoint(url) {
            return true;
        }
        if !self.mode.is_development() {
            return false;
        }
        let loopback_scheme = matches!(url.scheme(), "http" | "https" | "ws" | "wss");
        self.is_dev_origin(url) || (loopback_scheme && is_loopback(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    fn dev_policy() -> NavigationPolicy {
        NavigationPolicy::new(&GatewaySettings::new(BuildMode::Development))
    }

    fn prod_policy() -> NavigationPolicy {
        NavigationPolicy::new(&GatewaySettings::new(BuildMode::Production))
    }

    #[test]
    fn test_loopback_detection() {
        assert!(is_loopback(&url("http://localhost:5173/")));
        assert!(is_loopback(&url("http://127.0.0.1:8080/")));
        assert!(is_loopback(&url("http://[::1]:3000/")));
        assert!(is_loopback(&url("http://app.localhost/")));
        assert!(!is_loopback(&url("http://localhost.evil.com/")));
        assert!(!is_loopback(&url("http://10.0.0.1/")));
    }

    #[test]
    fn test_trusted_external_requires_web_scheme() {
        assert!(is_trusted_external(&url("https://github.com/org/repo")));
        assert!(is_trusted_external(&url("https://gist.github.com/x")));
        assert!(!is_trusted_external(&url("https://github.com.evil.io/")));
        assert!(!is_trusted_external(&url("ftp://github.com/")));
    }

    #[test]
    fn test_internal_error_surface() {
        assert!(is_internal_error_surface("chrome-error://chromewebdata/"));
        assert!(is_internal_error_surface("CHROME-ERROR://x"));
        assert!(!is_internal_error_surface("app://index.html"));
        assert!(!is_internal_error_surface("chrome"));
    }

    #[test]
    fn test_top_level_production() {
        let policy = prod_policy();
        assert!(policy.allows_top_level(&url("app://index.html")));
        assert!(!policy.allows_top_level(&url("http://localhost:5173/")));
        assert!(!policy.allows_top_level(&url("file:///etc/passwd")));
        assert!(!policy.allows_top_level(&url("https://github.com/")));
    }

    #[test]
    fn test_top_level_development() {
        let policy = dev_policy();
        assert!(policy.allows_top_level(&url("http://localhost:5173/game")));
        assert!(policy.allows_top_level(&url("http://127.0.0.1:4000/")));
        assert!(!policy.allows_top_level(&url("ws://localhost:5173/")));
        assert!(!policy.allows_top_level(&url("https://example.com/")));
    }

    #[test]
    fn test_subresource_allow_list() {
        let policy = prod_policy();
        assert!(policy.allows_subresource(&url("app://assets/logo.png")));
        assert!(policy.allows_subresource(&url("data:image/png;base64,AAAA")));
        assert!(policy.allows_subresource(&url("blob:app://index/1234")));
        assert!(policy.allows_subresource(&url("file:///opt/game/dist/a.js")));
        assert!(policy.allows_subresource(&url(
            "https://o1.ingest.sentry.io/api/1/envelope/"
        )));
        assert!(!policy.allows_subresource(&url("http://o1.ingest.sentry.io/api/")));
        assert!(!policy.allows_subresource(&url("http://localhost:5173/src/main.ts")));
        assert!(dev_policy().allows_subresource(&url("ws://localhost:5173/")));
    }

    #[test]
    fn test_same_origin_default_ports() {
        assert!(same_origin(&url("https://a.test/"), &url("https://a.test:443/x")));
        assert!(!same_origin(&url("http://a.test/"), &url("https://a.test/")));
    }
}
