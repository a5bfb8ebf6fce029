//! Application startup and process-level signals.
//!
//! Startup order: wait for the host, install the session handlers exactly
//! once, create the main window, load the start URL.

use crate::error::ShellError;
use crate::host::{HostRuntime, SessionHandlers};
use crate::opener::SystemBrowserOpener;
use crate::timers::TimerRegistry;
use crate::window::{HardenedWindow, WindowFactory, BASELINE_DOCUMENT};
use portcullis_core::{
    Config, ExternalOpener, GatewaySettings, HeaderPolicyEngine, NavigationPolicy, NonceSource,
    OsNonceSource, PermissionGate, SubresourceFilter, WindowId, WindowOptions,
};
use portcullis_protocol::{default_output_root, ProtocolResourceServer, RouteRegistry};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// URL the main window loads first.
pub fn start_url(settings: &GatewaySettings) -> String {
    let mut url = settings
        .effective_dev_origin()
        .map(|origin| origin.to_string())
        .unwrap_or_else(|| BASELINE_DOCUMENT.to_string());
    if let Some(e2e) = settings.e2e {
        url.push('?');
        url.push_str(e2e.query());
    }
    url
}

/// Builder for [`ApplicationLifecycle`]; every collaborator can be swapped for tests.
pub struct LifecycleBuilder {
    settings: GatewaySettings,
    output_root: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    opener: Option<Arc<dyn ExternalOpener>>,
    nonce_source: Option<Arc<dyn NonceSource>>,
    window: WindowOptions,
}

impl LifecycleBuilder {
    pub fn new(settings: GatewaySettings) -> Self {
        Self {
            settings,
            output_root: None,
            log_dir: None,
            opener: None,
            nonce_source: None,
            window: WindowOptions::default(),
        }
    }

    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = Some(root.into());
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn opener(mut self, opener: Arc<dyn ExternalOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn nonce_source(mut self, source: Arc<dyn NonceSource>) -> Self {
        self.nonce_source = Some(source);
        self
    }

    pub fn window_options(mut self, options: WindowOptions) -> Self {
        self.window = options;
        self
    }

    /// Apply the file-based config; explicit builder values set earlier win.
    pub fn config(mut self, config: &Config) -> Self {
        if self.output_root.is_none() {
            self.output_root = config.output_root.clone();
        }
        if self.log_dir.is_none() {
            self.log_dir = Some(config.effective_log_dir());
        }
        self.window = config.window.clone();
        self
    }

    pub fn build(self, host: Arc<dyn HostRuntime>) -> Result<ApplicationLifecycle, ShellError> {
        let output_root = match self.output_root {
            Some(root) => root,
            None => default_output_root()?,
        };
        let log_dir = self
            .log_dir
            .unwrap_or_else(|| Config::default().effective_log_dir());
        let opener: Arc<dyn ExternalOpener> = match self.opener {
            Some(opener) => opener,
            None => Arc::new(SystemBrowserOpener::new()),
        };
        let nonce_source: Arc<dyn NonceSource> = match self.nonce_source {
            Some(source) => source,
            None => Arc::new(OsNonceSource),
        };

        let policy = NavigationPolicy::new(&self.settings);
        let headers = Arc::new(HeaderPolicyEngine::new(policy.clone(), nonce_source));
        let protocol = ProtocolResourceServer::new(
            output_root.clone(),
            RouteRegistry::with_defaults(log_dir),
            headers.clone(),
        );
        let handlers = SessionHandlers {
            permissions: PermissionGate::new(),
            headers,
            subresources: Arc::new(SubresourceFilter::new(policy)),
            protocol: Arc::new(protocol),
        };
        let timers = TimerRegistry::new();
        let factory = WindowFactory::new(self.settings.clone(), output_root, opener, timers.clone());

        Ok(ApplicationLifecycle {
            settings: self.settings,
            host,
            handlers,
            factory,
            timers,
            window_options: self.window,
            installed: AtomicBool::new(false),
            windows: Mutex::new(BTreeMap::new()),
        })
    }
}

pub struct ApplicationLifecycle {
    settings: GatewaySettings,
    host: Arc<dyn HostRuntime>,
    handlers: SessionHandlers,
    factory: WindowFactory,
    timers: TimerRegistry,
    window_options: WindowOptions,
    installed: AtomicBool,
    windows: Mutex<BTreeMap<WindowId, Arc<HardenedWindow>>>,
}

impl ApplicationLifecycle {
    pub fn builder(settings: GatewaySettings) -> LifecycleBuilder {
        LifecycleBuilder::new(settings)
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub fn handlers(&self) -> &SessionHandlers {
        &self.handlers
    }

    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    /// Boot the application and return the main window.
    pub async fn start(&self) -> Result<Arc<HardenedWindow>, ShellError> {
        self.host.when_ready().await;
        tracing::info!(mode = ?self.settings.mode, ci = self.settings.ci, "host ready");
        self.install_session()?;
        Ok(self.open_main_window())
    }

    /// Install permission, header, fetch and protocol handlers on the shared session.
    pub fn install_session(&self) -> Result<(), ShellError> {
        if self.installed.swap(true, Ordering::SeqCst) {
            return Err(ShellError::SessionAlreadyInstalled);
        }
        if let Err(err) = self.host.session().install(self.handlers.clone()) {
            self.installed.store(false, Ordering::SeqCst);
            return Err(err);
        }
        tracing::debug!("session handlers installed");
        Ok(())
    }

    /// Create a hardened window and load the start URL into it.
    pub fn open_main_window(&self) -> Arc<HardenedWindow> {
        let window = self
            .factory
            .create_window(self.host.as_ref(), &self.window_options);
        let url = start_url(&self.settings);
        tracing::info!(window = %window.id(), url = %url, "loading start URL");
        window.load(&url);
        self.lock_windows().insert(window.id(), window.clone());
        window
    }

    pub fn window(&self, id: WindowId) -> Option<Arc<HardenedWindow>> {
        self.lock_windows().get(&id).cloned()
    }

    pub fn windows(&self) -> Vec<Arc<HardenedWindow>> {
        self.lock_windows().values().cloned().collect()
    }

    /// The host destroyed a window: drop its timers and nonce.
    pub fn on_window_closed(&self, id: WindowId) {
        let removed = self.lock_windows().remove(&id);
        let drained = match removed {
            Some(window) => window.on_closed(),
            None => self.timers.drain(id),
        };
        self.handlers.headers.forget_window(id);
        tracing::debug!(window = %id, drained, "window closed");
        if self.host.window_count() == 0 {
            self.on_all_windows_closed();
        }
    }

    /// Quit, except on platforms where apps outlive their windows.
    pub fn on_all_windows_closed(&self) {
        if self.host.platform().keeps_running_without_windows() {
            tracing::debug!("all windows closed; staying resident");
            return;
        }
        self.host.quit();
    }

    /// Dock activation: reopen the main window if none is left.
    pub fn on_activate(&self) -> Option<Arc<HardenedWindow>> {
        if self.host.window_count() > 0 {
            return None;
        }
        Some(self.open_main_window())
    }

    fn lock_windows(&self) -> MutexGuard<'_, BTreeMap<WindowId, Arc<HardenedWindow>>> {
        self.windows.lock().unwrap_or_else(|e| e.into_inner())
    }
}
