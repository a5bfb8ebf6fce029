//! Session-wide allow-list filter for non-top-level fetches.

use crate::predicates::{parse_target, NavigationPolicy};
use crate::security::WindowId;
use serde::{Deserialize, Serialize};

/// Kind of resource a request is fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    MainFrame,
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Font,
    Xhr,
    Media,
    WebSocket,
    Other,
}

impl ResourceType {
    pub fn is_top_level(self) -> bool {
        self == Self::MainFrame
    }
}

/// A fetch about to leave the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub resource_type: ResourceType,
    pub window_id: Option<WindowId>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            url: url.into(),
            resource_type,
            window_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
    Allow,
    Cancel,
}

/// Cancels subresource fetches outside the allow-list before any bytes move.
///
/// Main-frame requests pass untouched: the navigation guard owns those.
#[derive(Debug, Clone)]
pub struct SubresourceFilter {
    policy: NavigationPolicy,
}

impl SubresourceFilter {
    pub fn new(policy: NavigationPolicy) -> Self {
        Self { policy }
    }

    pub fn before_fetch(&self, request: &FetchRequest) -> FetchDecision {
        if request.resource_type.is_top_level() {
            return FetchDecision::Allow;
        }

        let allowed = parse_target(&request.url)
            .map(|url| self.policy.allows_subresource(&url))
            .unwrap_or(false);

        if allowed {
            FetchDecision::Allow
        } else {
            tracing::debug!(
                url = %request.url,
                resource_type = ?request.resource_type,
                window = ?request.window_id,
                "subresource fetch cancelled"
            );
            FetchDecision::Cancel
        }
    }
}
