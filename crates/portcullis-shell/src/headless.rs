//! In-process host with no native windows.
//!
//! Used by the CLI simulator and by tests: windows record the URLs they were
//! asked to load, the session records the handlers installed on it.

use crate::error::ShellError;
use crate::host::{ContentWindow, HostRuntime, Platform, SessionContext, SessionHandlers, WindowAttributes};
use async_trait::async_trait;
use portcullis_core::WindowId;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug)]
pub struct HeadlessWindow {
    id: WindowId,
    visible: AtomicBool,
    destroyed: AtomicBool,
    loads: Mutex<Vec<String>>,
}

impl HeadlessWindow {
    pub fn new(id: WindowId, visible: bool) -> Self {
        Self {
            id,
            visible: AtomicBool::new(visible),
            destroyed: AtomicBool::new(false),
            loads: Mutex::new(Vec::new()),
        }
    }

    /// Every URL passed to `load_url`, oldest first.
    pub fn loads(&self) -> Vec<String> {
        lock(&self.loads).clone()
    }

    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.visible.store(false, Ordering::SeqCst);
    }
}

impl ContentWindow for HeadlessWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn load_url(&self, url: &str) {
        if self.is_destroyed() {
            tracing::warn!(window = %self.id, url, "load on destroyed window ignored");
            return;
        }
        lock(&self.loads).push(url.to_string());
    }

    fn current_url(&self) -> Option<String> {
        lock(&self.loads).last().cloned()
    }

    fn show(&self) {
        if !self.is_destroyed() {
            self.visible.store(true, Ordering::SeqCst);
        }
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

/// Session that accepts exactly one handler installation.
#[derive(Default)]
pub struct HeadlessSession {
    handlers: Mutex<Option<SessionHandlers>>,
}

impl HeadlessSession {
    pub fn handlers(&self) -> Option<SessionHandlers> {
        lock(&self.handlers).clone()
    }

    pub fn is_installed(&self) -> bool {
        lock(&self.handlers).is_some()
    }
}

impl SessionContext for HeadlessSession {
    fn install(&self, handlers: SessionHandlers) -> Result<(), ShellError> {
        let mut slot = lock(&self.handlers);
        if slot.is_some() {
            return Err(ShellError::SessionAlreadyInstalled);
        }
        *slot = Some(handlers);
        Ok(())
    }
}

pub struct HeadlessHost {
    platform: Platform,
    ready: watch::Sender<bool>,
    session: Arc<HeadlessSession>,
    windows: Mutex<BTreeMap<WindowId, Arc<HeadlessWindow>>>,
    next_id: AtomicU32,
    quit: AtomicBool,
}

impl HeadlessHost {
    /// A host that is already ready.
    pub fn new() -> Self {
        let host = Self::pending();
        host.mark_ready();
        host
    }

    /// A host whose `when_ready` blocks until [`HeadlessHost::mark_ready`].
    pub fn pending() -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            platform: Platform::current(),
            ready,
            session: Arc::new(HeadlessSession::default()),
            windows: Mutex::new(BTreeMap::new()),
            next_id: AtomicU32::new(1),
            quit: AtomicBool::new(false),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn mark_ready(&self) {
        self.ready.send_replace(true);
    }

    pub fn headless_session(&self) -> &Arc<HeadlessSession> {
        &self.session
    }

    pub fn window(&self, id: WindowId) -> Option<Arc<HeadlessWindow>> {
        lock(&self.windows).get(&id).cloned()
    }

    /// Simulate the user closing a window. Returns false for unknown ids.
    pub fn close_window(&self, id: WindowId) -> bool {
        match lock(&self.windows).remove(&id) {
            Some(window) => {
                window.destroy();
                true
            }
            None => false,
        }
    }

    pub fn has_quit(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostRuntime for HeadlessHost {
    async fn when_ready(&self) {
        let mut ready = self.ready.subscribe();
        // The sender lives as long as `self`, so this only errors on a dropped host.
        let _ = ready.wait_for(|ready| *ready).await;
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn session(&self) -> Arc<dyn SessionContext> {
        self.session.clone()
    }

    fn create_window(&self, attributes: &WindowAttributes) -> Arc<dyn ContentWindow> {
        let id = WindowId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let window = Arc::new(HeadlessWindow::new(id, attributes.show));
        lock(&self.windows).insert(id, window.clone());
        window
    }

    fn window_count(&self) -> usize {
        lock(&self.windows).len()
    }

    fn quit(&self) {
        tracing::info!("headless host quitting");
        self.quit.store(true, Ordering::SeqCst);
    }
}
