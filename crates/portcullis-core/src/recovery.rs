//! Load-failure classification and the corrective reload decision.

use crate::predicates::is_internal_error_surface;
use crate::security::BuildMode;

/// Error code the host reports when a navigation is cancelled (e.g. by the guard).
pub const ERR_ABORTED: i32 = -3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed,
}

/// A did-fail-load event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub url: String,
    pub error_code: i32,
    pub description: String,
    pub is_main_frame: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    None,
    /// Navigate the window to this URL.
    ReloadBaseline(String),
}

/// Tracks one window's load state and decides when to force it back to the baseline.
///
/// At most one corrective reload is outstanding; it is released by the next
/// successful load.
#[derive(Debug, Clone)]
pub struct ErrorRecoveryMonitor {
    mode: BuildMode,
    baseline: String,
    state: LoadState,
    recovery_in_flight: bool,
}

impl ErrorRecoveryMonitor {
    pub fn new(mode: BuildMode, baseline: impl Into<String>) -> Self {
        Self {
            mode,
            baseline: baseline.into(),
            state: LoadState::Loading,
            recovery_in_flight: false,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    pub fn recovery_in_flight(&self) -> bool {
        self.recovery_in_flight
    }

    pub fn on_load_started(&mut self) {
        self.state = LoadState::Loading;
    }

    pub fn on_load_finished(&mut self, url: &str) {
        if is_internal_error_surface(url) {
            self.state = LoadState::Failed;
            return;
        }
        self.state = LoadState::Loaded;
        self.recovery_in_flight = false;
    }

    pub fn on_load_failed(&mut self, failure: &LoadFailure) -> RecoveryAction {
        if !failure.is_main_frame || failure.error_code == ERR_ABORTED {
            return RecoveryAction::None;
        }
        self.state = LoadState::Failed;

        let internal_surface = is_internal_error_surface(&failure.url);
        if !internal_surface && self.mode.is_development() {
            tracing::warn!(url = %failure.url, code = failure.error_code, description = %failure.description, "main frame load failed");
            return RecoveryAction::None;
        }

        if self.recovery_in_flight {
            tracing::error!(
                url = %failure.url,
                code = failure.error_code,
                "corrective reload failed; not retrying"
            );
            return RecoveryAction::None;
        }

        if internal_surface {
            tracing::error!(url = %failure.url, code = failure.error_code, "internal error surface detected");
        } else {
            tracing::error!(url = %failure.url, code = failure.error_code, description = %failure.description, "main frame load failed");
        }
        self.recovery_in_flight = true;
        RecoveryAction::ReloadBaseline(self.baseline.clone())
    }
}
