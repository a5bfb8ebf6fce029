//! portcullis-shell: window composition, host seams and application lifecycle.

mod error;
pub mod headless;
pub mod host;
pub mod lifecycle;
pub mod opener;
pub mod timers;
pub mod window;

pub use error::ShellError;
pub use headless::{HeadlessHost, HeadlessSession, HeadlessWindow};
pub use host::{ContentWindow, HostRuntime, Platform, SessionContext, SessionHandlers, WindowAttributes};
pub use lifecycle::{start_url, ApplicationLifecycle, LifecycleBuilder};
pub use opener::SystemBrowserOpener;
pub use timers::{TimerId, TimerRegistry};
pub use window::{HardenedWindow, WindowFactory, BASELINE_DOCUMENT, RECOVERY_DELAY, SHOW_FALLBACK_DELAY};
