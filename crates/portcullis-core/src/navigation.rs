//! Per-window navigation guard.
//!
//! Three hooks feed this guard: will-navigate (top-level), window-open
//! (new-window) and will-redirect. Each produces exactly one
//! [`NavigationIntent`] and gets exactly one [`NavigationDecision`].

use crate::error::GatewayError;
use crate::predicates::{is_trusted_external, is_web_scheme, parse_target, NavigationPolicy};
use crate::security::WindowId;
use std::sync::{Arc, Mutex};
use url::Url;

/// Which hook raised the intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    TopLevel,
    NewWindow,
    Redirect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub target_url: String,
    pub window_id: WindowId,
    pub kind: NavigationKind,
}

impl NavigationIntent {
    pub fn new(kind: NavigationKind, window_id: WindowId, target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            window_id,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Let the content view proceed.
    Allow,
    /// Cancel silently.
    Deny,
    /// Cancel and hand the URL to the system browser.
    OpenExternal(Url),
}

impl NavigationDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Answer to a window-open hook. Creating a content view is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOpenResponse {
    Deny,
}

/// Hands URLs to the operating system's default browser.
pub trait ExternalOpener: Send + Sync {
    fn open_external(&self, url: &Url) -> Result<(), GatewayError>;
}

/// Records every URL instead of opening it.
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<Url>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<Url> {
        self.opened
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

impl ExternalOpener for RecordingOpener {
    fn open_external(&self, url: &Url) -> Result<(), GatewayError> {
        self.opened
            .lock()
            .map_err(|_| GatewayError::ExternalOpen("recorder poisoned".to_string()))?
            .push(url.clone());
        Ok(())
    }
}

pub struct NavigationGuard {
    policy: NavigationPolicy,
    opener: Arc<dyn ExternalOpener>,
}

impl NavigationGuard {
    pub fn new(policy: NavigationPolicy, opener: Arc<dyn ExternalOpener>) -> Self {
        Self { policy, opener }
    }

    pub fn policy(&self) -> &NavigationPolicy {
        &self.policy
    }

    /// Pure decision for an intent.
    ///
    /// Scheme allow-list first, trusted domains second: a trusted http(s) URL
    /// can only ever open externally.
    pub fn decide(&self, intent: &NavigationIntent) -> NavigationDecision {
        let Some(target) = parse_target(&intent.target_url) else {
            return NavigationDecision::Deny;
        };

        match intent.kind {
            NavigationKind::TopLevel | NavigationKind::Redirect => {
                if self.policy.allows_top_level(&target) {
                    NavigationDecision::Allow
                } else if is_web_scheme(&target) {
                    NavigationDecision::OpenExternal(target)
                } else {
                    NavigationDecision::Deny
                }
            }
            NavigationKind::NewWindow => {
                if is_trusted_external(&target) {
                    NavigationDecision::OpenExternal(target)
                } else {
                    NavigationDecision::Deny
                }
            }
        }
    }

    /// Decide and carry out the side effects. Consumes the intent.
    pub fn handle(&self, intent: NavigationIntent) -> NavigationDecision {
        let decision = self.decide(&intent);
        match &decision {
            NavigationDecision::Allow => {
                tracing::trace!(window = %intent.window_id, kind = ?intent.kind, url = %intent.target_url, "navigation allowed");
            }
            NavigationDecision::Deny => {
                tracing::debug!(window = %intent.window_id, kind = ?intent.kind, url = %intent.target_url, "navigation denied");
            }
            NavigationDecision::OpenExternal(url) => {
                tracing::debug!(window = %intent.window_id, kind = ?intent.kind, url = %url, "navigation handed to system browser");
                if let Err(err) = self.opener.open_external(url) {
                    tracing::warn!(url = %url, error = %err, "failed to open external url");
                }
            }
        }
        decision
    }

    /// Top-level hook: returns whether the content view may proceed.
    pub fn on_will_navigate(&self, window: WindowId, url: &str) -> bool {
        self.handle(NavigationIntent::new(NavigationKind::TopLevel, window, url))
            .is_allow()
    }

    /// Redirect hook: returns whether the redirect may proceed.
    pub fn on_will_redirect(&self, window: WindowId, url: &str) -> bool {
        self.handle(NavigationIntent::new(NavigationKind::Redirect, window, url))
            .is_allow()
    }

    /// New-window hook: never creates a content view.
    pub fn on_window_open(&self, window: WindowId, url: &str) -> WindowOpenResponse {
        self.handle(NavigationIntent::new(NavigationKind::NewWindow, window, url));
        WindowOpenResponse::Deny
    }
}

impl std::fmt::Debug for NavigationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationGuard")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{BuildMode, GatewaySettings};
    use proptest::prelude::*;

    const W: WindowId = WindowId(1);

    fn guard(mode: BuildMode) -> (NavigationGuard, Arc<RecordingOpener>) {
        let opener = Arc::new(RecordingOpener::new());
        let guard = NavigationGuard::new(
            NavigationPolicy::new(&GatewaySettings::new(mode)),
            opener.clone(),
        );
        (guard, opener)
    }

    #[test]
    fn test_top_level_packaged_allowed() {
        let (guard, opener) = guard(BuildMode::Production);
        assert!(guard.on_will_navigate(W, "app://index.html"));
        assert!(opener.opened().is_empty());
    }

    #[test]
    fn test_top_level_external_opens_in_browser() {
        let (guard, opener) = guard(BuildMode::Production);
        assert!(!guard.on_will_navigate(W, "https://example.com/login"));
        assert_eq!(opener.opened()[0].as_str(), "https://example.com/login");
    }

    #[test]
    fn test_top_level_non_web_dropped() {
        let (guard, opener) = guard(BuildMode::Production);
        for url in ["file:///etc/passwd", "javascript:alert(1)", "ftp://x.test/", "%%%"] {
            assert!(!guard.on_will_navigate(W, url));
        }
        assert!(opener.opened().is_empty());
    }

    #[test]
    fn test_dev_origin_and_loopback_only_in_development() {
        let (dev, _) = guard(BuildMode::Development);
        assert!(dev.on_will_navigate(W, "http://localhost:5173/"));
        assert!(dev.on_will_navigate(W, "http://127.0.0.1:9000/"));

        let (prod, opener) = guard(BuildMode::Production);
        assert!(!prod.on_will_navigate(W, "http://localhost:5173/"));
        assert_eq!(opener.opened().len(), 1);
    }

    #[test]
    fn test_new_window_trusted_opens_externally() {
        let (guard, opener) = guard(BuildMode::Production);
        assert_eq!(
            guard.on_window_open(W, "https://github.com/org/repo"),
            WindowOpenResponse::Deny
        );
        assert_eq!(opener.opened().len(), 1);
    }

    #[test]
    fn test_new_window_untrusted_dropped() {
        let (guard, opener) = guard(BuildMode::Development);
        guard.on_window_open(W, "https://evil.example/");
        guard.on_window_open(W, "app://index.html");
        guard.on_window_open(W, "http://localhost:5173/");
        assert!(opener.opened().is_empty());
    }

    #[test]
    fn test_trusted_domain_never_loads_inside() {
        let (guard, _) = guard(BuildMode::Production);
        let intent = NavigationIntent::new(NavigationKind::TopLevel, W, "https://github.com/");
        assert!(matches!(
            guard.decide(&intent),
            NavigationDecision::OpenExternal(_)
        ));
    }

    #[test]
    fn test_redirect_uses_top_level_list() {
        let (guard, opener) = guard(BuildMode::Production);
        assert!(guard.on_will_redirect(W, "app://bundle/index.html"));
        assert!(!guard.on_will_redirect(W, "http://tracker.example/r"));
        assert!(!guard.on_will_redirect(W, "data:text/html,hi"));
        assert_eq!(opener.opened().len(), 1);
    }

    proptest! {
        #[test]
        fn prop_new_window_never_allowed(url in ".{0,80}") {
            let (guard, _) = guard(BuildMode::Development);
            let intent = NavigationIntent::new(NavigationKind::NewWindow, W, url);
            prop_assert!(!guard.decide(&intent).is_allow());
        }

        #[test]
        fn prop_foreign_top_level_denied(
            host in "[a-z]{1,10}\\.(com|dev|example)",
            scheme in prop_oneof![Just("http"), Just("https"), Just("ftp"), Just("ws")],
        ) {
            let (guard, _) = guard(BuildMode::Development);
            let url = format!("{scheme}://{host}/page");
            prop_assert!(!guard.on_will_navigate(W, &url));
            prop_assert!(!guard.on_will_redirect(W, &url));
        }
    }
}
