//! portcullis-core: policy decisions for the content-view security gateway.

pub mod config;
pub mod csp;
mod error;
pub mod headers;
pub mod navigation;
pub mod permission;
pub mod predicates;
pub mod recovery;
pub mod security;
pub mod subresource;

pub use config::{Config, ConfigStore, WindowOptions};
pub use csp::ContentSecurityPolicy;
pub use error::GatewayError;
pub use headers::{
    FixedNonce, HeaderPolicyEngine, HeaderSet, NonceSource, OsNonceSource, ResponseDetails,
};
pub use navigation::{
    ExternalOpener, NavigationDecision, NavigationGuard, NavigationIntent, NavigationKind,
    RecordingOpener, WindowOpenResponse,
};
pub use permission::{PermissionGate, PermissionRequest};
pub use predicates::NavigationPolicy;
pub use recovery::{ErrorRecoveryMonitor, LoadFailure, LoadState, RecoveryAction};
pub use security::{
    BuildMode, E2eMode, GatewaySettings, SecurityPolicyConfig, WindowId, DEFAULT_DEV_ORIGIN,
};
pub use subresource::{FetchDecision, FetchRequest, ResourceType, SubresourceFilter};
