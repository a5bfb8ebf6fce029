//! Hardened window construction and per-window hook wiring.

use crate::host::{ContentWindow, HostRuntime, WindowAttributes};
use crate::timers::TimerRegistry;
use portcullis_core::{
    ErrorRecoveryMonitor, ExternalOpener, GatewaySettings, LoadFailure, LoadState,
    NavigationGuard, NavigationPolicy, RecoveryAction, SecurityPolicyConfig, WindowId,
    WindowOpenResponse, WindowOptions,
};
use portcullis_protocol::locate_bridge;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Packaged document every window falls back to.
pub const BASELINE_DOCUMENT: &str = "app://index.html";

/// Delay before a hidden window is shown if the host never reports ready-to-show.
pub const SHOW_FALLBACK_DELAY: Duration = Duration::from_secs(3);

/// Delay before a corrective reload outside CI.
pub const RECOVERY_DELAY: Duration = Duration::from_millis(250);

/// Builds windows whose security attributes cannot be overridden.
#[derive(Clone)]
pub struct WindowFactory {
    settings: GatewaySettings,
    policy: NavigationPolicy,
    output_root: PathBuf,
    opener: Arc<dyn ExternalOpener>,
    timers: TimerRegistry,
}

impl WindowFactory {
    pub fn new(
        settings: GatewaySettings,
        output_root: impl Into<PathBuf>,
        opener: Arc<dyn ExternalOpener>,
        timers: TimerRegistry,
    ) -> Self {
        Self {
            policy: NavigationPolicy::new(&settings),
            settings,
            output_root: output_root.into(),
            opener,
            timers,
        }
    }

    /// Baseline document for recovery: the dev origin in development, packaged index otherwise.
    pub fn baseline_url(&self) -> String {
        self.settings
            .effective_dev_origin()
            .map(|origin| origin.to_string())
            .unwrap_or_else(|| BASELINE_DOCUMENT.to_string())
    }

    /// Attributes for `requested`. Only cosmetic fields are taken from the request.
    pub fn attributes(&self, requested: &WindowOptions) -> WindowAttributes {
        for key in requested.web_preferences.keys() {
            if SecurityPolicyConfig::is_critical_flag(key) {
                tracing::warn!(flag = %key, "ignoring requested override of a critical security flag");
            } else {
                tracing::debug!(preference = %key, "ignoring requested web preference");
            }
        }

        let bridge = locate_bridge(&self.output_root);
        if bridge.is_none() {
            tracing::warn!(
                output_root = %self.output_root.display(),
                "capability bridge not found; content view will start without it"
            );
        }

        WindowAttributes {
            title: requested.title.clone(),
            width: requested.width.max(requested.min_width),
            height: requested.height.max(requested.min_height),
            min_width: requested.min_width,
            min_height: requested.min_height,
            background_color: requested.background_color.clone(),
            show: false,
            security: SecurityPolicyConfig::for_mode(self.settings.mode),
            bridge,
        }
    }

    /// Create a native window and attach its guard and recovery monitor.
    pub fn create_window(
        &self,
        host: &dyn HostRuntime,
        requested: &WindowOptions,
    ) -> Arc<HardenedWindow> {
        let attributes = self.attributes(requested);
        let content = host.create_window(&attributes);
        tracing::info!(window = %content.id(), mode = ?self.settings.mode, "window created");

        let window = Arc::new(HardenedWindow {
            guard: NavigationGuard::new(self.policy.clone(), self.opener.clone()),
            monitor: Arc::new(Mutex::new(ErrorRecoveryMonitor::new(
                self.settings.mode,
                self.baseline_url(),
            ))),
            timers: self.timers.clone(),
            ci: self.settings.ci,
            content,
        });

        if !self.settings.ci {
            window.timers.schedule(&window.content, SHOW_FALLBACK_DELAY, |w| {
                if !w.is_visible() {
                    tracing::debug!(window = %w.id(), "ready-to-show never arrived; showing window");
                    w.show();
                }
            });
        }
        window
    }
}

/// A content window with its navigation guard and recovery monitor attached.
///
/// The host forwards its native events to the `on_*` methods.
pub struct HardenedWindow {
    content: Arc<dyn ContentWindow>,
    guard: NavigationGuard,
    monitor: Arc<Mutex<ErrorRecoveryMonitor>>,
    timers: TimerRegistry,
    ci: bool,
}

impl HardenedWindow {
    pub fn id(&self) -> WindowId {
        self.content.id()
    }

    pub fn content(&self) -> &Arc<dyn ContentWindow> {
        &self.content
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn load_state(&self) -> LoadState {
        self.monitor().state()
    }

    /// Load a URL chosen by the privileged side (start URL, recovery).
    pub fn load(&self, url: &str) {
        self.monitor().on_load_started();
        self.content.load_url(url);
    }

    /// Content-initiated navigation: consult the guard, then load if allowed.
    pub fn request_navigation(&self, url: &str) -> bool {
        let allowed = self.on_will_navigate(url);
        if allowed {
            self.load(url);
        }
        allowed
    }

    pub fn on_will_navigate(&self, url: &str) -> bool {
        self.guard.on_will_navigate(self.id(), url)
    }

    pub fn on_will_redirect(&self, url: &str) -> bool {
        self.guard.on_will_redirect(self.id(), url)
    }

    pub fn on_window_open(&self, url: &str) -> WindowOpenResponse {
        self.guard.on_window_open(self.id(), url)
    }

    pub fn on_ready_to_show(&self) {
        if self.ci {
            return;
        }
        if !self.content.is_visible() {
            self.content.show();
        }
    }

    pub fn on_did_start_loading(&self) {
        self.monitor().on_load_started();
    }

    pub fn on_did_finish_load(&self, url: &str) {
        self.monitor().on_load_finished(url);
    }

    /// Forward a load failure; schedules at most one corrective reload.
    pub fn on_did_fail_load(&self, failure: &LoadFailure) {
        let action = self.monitor().on_load_failed(failure);
        if let RecoveryAction::ReloadBaseline(baseline) = action {
            let delay = if self.ci { Duration::ZERO } else { RECOVERY_DELAY };
            tracing::info!(window = %self.id(), url = %baseline, "scheduling corrective reload");
            let monitor = Arc::clone(&self.monitor);
            self.timers.schedule(&self.content, delay, move |w| {
                lock_monitor(&monitor).on_load_started();
                w.load_url(&baseline);
            });
        }
    }

    /// Native window is gone: drop every pending timer.
    pub fn on_closed(&self) -> usize {
        self.timers.drain(self.id())
    }

    fn monitor(&self) -> MutexGuard<'_, ErrorRecoveryMonitor> {
        lock_monitor(&self.monitor)
    }
}

fn lock_monitor(monitor: &Mutex<ErrorRecoveryMonitor>) -> MutexGuard<'_, ErrorRecoveryMonitor> {
    monitor.lock().unwrap_or_else(|e| e.into_inner())
}
