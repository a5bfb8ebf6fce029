//! Session-wide default-deny permission gate.

use serde::{Deserialize, Serialize};

/// Permissions the content view may ever receive. Extending this is a code change.
pub const ALLOWED_PERMISSIONS: &[&str] = &["clipboard-read", "clipboard-sanitized-write"];

/// A permission request raised by the content view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRequest {
    pub name: String,
    pub requesting_origin: String,
}

impl PermissionRequest {
    pub fn new(name: impl Into<String>, requesting_origin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requesting_origin: requesting_origin.into(),
        }
    }
}

/// Check and request handlers installed on the shared session.
///
/// Stateless; the origin is logged but never widens the decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionGate;

impl PermissionGate {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous permission check.
    pub fn check(&self, name: &str, origin: &str) -> bool {
        let granted = is_allowed_permission(name);
        if !granted {
            tracing::debug!(permission = name, origin, "permission check denied");
        }
        granted
    }

    /// Permission request; consumes the request.
    pub fn request(&self, request: PermissionRequest) -> bool {
        let granted = is_allowed_permission(&request.name);
        if granted {
            tracing::debug!(permission = %request.name, origin = %request.requesting_origin, "permission granted");
        } else {
            tracing::debug!(permission = %request.name, origin = %request.requesting_origin, "permission request denied");
        }
        granted
    }
}

/// Static allow-list lookup. Exact, case-sensitive match.
pub fn is_allowed_permission(name: &str) -> bool {
    ALLOWED_PERMISSIONS.contains(&name)
}
