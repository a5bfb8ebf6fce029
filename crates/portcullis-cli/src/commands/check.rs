use crate::cli::IntentKind;
use portcullis_core::{
    FetchDecision, FetchRequest, GatewaySettings, NavigationDecision, NavigationGuard,
    NavigationIntent, NavigationKind, NavigationPolicy, RecordingOpener, ResourceType,
    SubresourceFilter, WindowId,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub url: String,
    pub kind: &'static str,
    pub decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<String>,
}

pub fn run(settings: &GatewaySettings, url: &str, kind: IntentKind) -> anyhow::Result<()> {
    let report = evaluate(settings, url, kind);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Decision the gateway would take, without side effects.
pub fn evaluate(settings: &GatewaySettings, url: &str, kind: IntentKind) -> CheckReport {
    let policy = NavigationPolicy::new(settings);
    let (kind_label, navigation_kind) = match kind {
        IntentKind::TopLevel => ("top-level", NavigationKind::TopLevel),
        IntentKind::NewWindow => ("new-window", NavigationKind::NewWindow),
        IntentKind::Redirect => ("redirect", NavigationKind::Redirect),
        IntentKind::Subresource => {
            let decision = SubresourceFilter::new(policy)
                .before_fetch(&FetchRequest::new(url, ResourceType::Other));
            return CheckReport {
                url: url.to_string(),
                kind: "subresource",
                decision: match decision {
                    FetchDecision::Allow => "allow",
                    FetchDecision::Cancel => "cancel",
                },
                external: None,
            };
        }
    };

    let guard = NavigationGuard::new(policy, Arc::new(RecordingOpener::new()));
    let decision = guard.decide(&NavigationIntent::new(navigation_kind, WindowId(0), url));
    let (label, external) = match decision {
        NavigationDecision::Allow => ("allow", None),
        NavigationDecision::Deny => ("deny", None),
        NavigationDecision::OpenExternal(target) => ("open-external", Some(target.to_string())),
    };
    CheckReport {
        url: url.to_string(),
        kind: kind_label,
        decision: label,
        external,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_core::BuildMode;

    #[test]
    fn test_evaluate_top_level() {
        let settings = GatewaySettings::new(BuildMode::Production);
        assert_eq!(evaluate(&settings, "app://index.html", IntentKind::TopLevel).decision, "allow");

        let report = evaluate(&settings, "https://example.com/", IntentKind::TopLevel);
        assert_eq!(report.decision, "open-external");
        assert_eq!(report.external.as_deref(), Some("https://example.com/"));

        assert_eq!(evaluate(&settings, "file:///etc/passwd", IntentKind::Redirect).decision, "deny");
    }

    #[test]
    fn test_evaluate_new_window_and_subresource() {
        let settings = GatewaySettings::new(BuildMode::Production);
        assert_eq!(evaluate(&settings, "https://github.com/x", IntentKind::NewWindow).decision, "open-external");
        assert_eq!(evaluate(&settings, "https://evil.example/", IntentKind::NewWindow).decision, "deny");
        assert_eq!(evaluate(&settings, "https://cdn.example/x.js", IntentKind::Subresource).decision, "cancel");
        assert_eq!(evaluate(&settings, "data:image/png;base64,AA==", IntentKind::Subresource).decision, "allow");
    }
}
