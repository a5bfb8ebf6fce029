//! Hand-off of external links to the operating system's default browser.

use portcullis_core::predicates::is_web_scheme;
use portcullis_core::{ExternalOpener, GatewayError};
use tokio::process::Command;
use url::Url;

/// Opens http(s) URLs with the platform opener (`open`, `xdg-open`, `url.dll`).
///
/// The child process is reaped on a background task; the caller never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowserOpener;

impl SystemBrowserOpener {
    pub fn new() -> Self {
        Self
    }
}

impl ExternalOpener for SystemBrowserOpener {
    fn open_external(&self, url: &Url) -> Result<(), GatewayError> {
        if !is_web_scheme(url) {
            return Err(GatewayError::ExternalOpen(format!(
                "refusing to open non-web URL '{url}'"
            )));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| GatewayError::ExternalOpen(format!("no async runtime: {e}")))?;

        let (program, args) = opener_command();
        let mut child = {
            let _guard = runtime.enter();
            Command::new(program)
                .args(args)
                .arg(url.as_str())
                .kill_on_drop(false)
                .spawn()
                .map_err(|e| GatewayError::ExternalOpen(format!("{program}: {e}")))?
        };

        let url = url.to_string();
        runtime.spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {}
                Ok(status) => tracing::warn!(url = %url, ?status, "system browser opener exited with failure"),
                Err(err) => tracing::warn!(url = %url, error = %err, "failed to wait for system browser opener"),
            }
        });
        Ok(())
    }
}

const NO_ARGS: &[&str] = &[];
const URL_DLL_ARGS: &[&str] = &["url.dll,FileProtocolHandler"];

fn opener_command() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", NO_ARGS)
    } else if cfg!(target_os = "windows") {
        ("rundll32", URL_DLL_ARGS)
    } else {
        ("xdg-open", NO_ARGS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_web_urls() {
        let opener = SystemBrowserOpener::new();
        for raw in ["file:///etc/passwd", "app://index.html", "javascript:alert(1)"] {
            let url = Url::parse(raw).unwrap();
            assert!(opener.open_external(&url).is_err(), "{raw}");
        }
    }

    #[test]
    fn test_requires_runtime() {
        let url = Url::parse("https://github.com/").unwrap();
        assert!(matches!(
            SystemBrowserOpener::new().open_external(&url),
            Err(GatewayError::ExternalOpen(_))
        ));
    }
}
