//! Seams between the gateway and the native window host.

use crate::error::ShellError;
use async_trait::async_trait;
use portcullis_core::{HeaderPolicyEngine, PermissionGate, SecurityPolicyConfig, SubresourceFilter, WindowId};
use portcullis_protocol::ProtocolResourceServer;
use std::path::PathBuf;
use std::sync::Arc;

/// Desktop platform, for process-signal semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// Whether the app stays alive with no windows (dock-integrated platforms).
    pub fn keeps_running_without_windows(self) -> bool {
        self == Self::MacOs
    }
}

/// Everything the host needs to build a native window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAttributes {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub background_color: String,
    /// Whether the window is shown immediately.
    pub show: bool,
    pub security: SecurityPolicyConfig,
    /// Capability bridge script, when one was found.
    pub bridge: Option<PathBuf>,
}

/// A native window hosting one content view.
pub trait ContentWindow: Send + Sync {
    fn id(&self) -> WindowId;

    /// Start loading `url` in the content view.
    fn load_url(&self, url: &str);

    fn current_url(&self) -> Option<String>;

    fn show(&self);

    fn is_visible(&self) -> bool;

    /// True once the native window has been torn down.
    fn is_destroyed(&self) -> bool;
}

/// Handlers installed once on the shared session.
#[derive(Clone)]
pub struct SessionHandlers {
    pub permissions: PermissionGate,
    pub headers: Arc<HeaderPolicyEngine>,
    pub subresources: Arc<SubresourceFilter>,
    pub protocol: Arc<ProtocolResourceServer>,
}

/// The session shared by every window.
pub trait SessionContext: Send + Sync {
    /// Install the handlers. A second call must fail with [`ShellError::SessionAlreadyInstalled`].
    fn install(&self, handlers: SessionHandlers) -> Result<(), ShellError>;
}

/// The native application runtime.
#[async_trait]
pub trait HostRuntime: Send + Sync {
    /// Resolves once the runtime has finished booting.
    async fn when_ready(&self);

    fn platform(&self) -> Platform;

    fn session(&self) -> Arc<dyn SessionContext>;

    fn create_window(&self, attributes: &WindowAttributes) -> Arc<dyn ContentWindow>;

    /// Number of windows that are still open.
    fn window_count(&self) -> usize;

    fn quit(&self);
}

// Compile-time check: host traits must be object-safe
const _: () = {
    fn _assert_object_safe(_: &dyn HostRuntime, _: &dyn SessionContext, _: &dyn ContentWindow) {}
};
