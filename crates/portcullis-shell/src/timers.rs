//! Per-window registry of delayed callbacks.
//!
//! One registry is built per process and handed to whatever schedules work
//! against a window. Callbacks only hold a weak reference to their window and
//! re-check it before running; closing a window drains its entries and leaves
//! every other window's timers alone.

use crate::host::ContentWindow;
use portcullis_core::WindowId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::AbortHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Default)]
struct Inner {
    next_id: u64,
    entries: HashMap<WindowId, HashMap<TimerId, AbortHandle>>,
}

#[derive(Clone, Default)]
pub struct TimerRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` against `window` after `delay`, unless the window is gone by then.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, window: &Arc<dyn ContentWindow>, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce(Arc<dyn ContentWindow>) + Send + 'static,
    {
        let window_id = window.id();
        let weak = Arc::downgrade(window);
        let registry = self.clone();

        // Held across the spawn so a zero-delay task cannot finish before it is registered.
        let mut inner = self.lock();
        inner.next_id += 1;
        let timer = TimerId(inner.next_id);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            registry.complete(window_id, timer);
            match weak.upgrade() {
                Some(window) if !window.is_destroyed() => callback(window),
                _ => tracing::debug!(window = %window_id, ?timer, "timer skipped: window destroyed"),
            }
        });

        inner
            .entries
            .entry(window_id)
            .or_default()
            .insert(timer, handle.abort_handle());
        timer
    }

    /// Cancel one timer. Returns whether it was still pending.
    pub fn cancel(&self, window: WindowId, timer: TimerId) -> bool {
        let mut inner = self.lock();
        let Some(timers) = inner.entries.get_mut(&window) else {
            return false;
        };
        let removed = timers.remove(&timer);
        if timers.is_empty() {
            inner.entries.remove(&window);
        }
        match removed {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every pending timer of `window`. Returns how many were drained.
    pub fn drain(&self, window: WindowId) -> usize {
        let drained = self.lock().entries.remove(&window).unwrap_or_default();
        for handle in drained.values() {
            handle.abort();
        }
        if !drained.is_empty() {
            tracing::debug!(%window, count = drained.len(), "drained window timers");
        }
        drained.len()
    }

    pub fn pending(&self, window: WindowId) -> usize {
        self.lock().entries.get(&window).map_or(0, HashMap::len)
    }

    pub fn total_pending(&self) -> usize {
        self.lock().entries.values().map(HashMap::len).sum()
    }

    fn complete(&self, window: WindowId, timer: TimerId) {
        let mut inner = self.lock();
        if let Some(timers) = inner.entries.get_mut(&window) {
            timers.remove(&timer);
            if timers.is_empty() {
                inner.entries.remove(&window);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessWindow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn window(id: u32) -> (Arc<HeadlessWindow>, Arc<dyn ContentWindow>) {
        let concrete = Arc::new(HeadlessWindow::new(WindowId(id), true));
        let dynamic: Arc<dyn ContentWindow> = concrete.clone();
        (concrete, dynamic)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let registry = TimerRegistry::new();
        let (concrete, dynamic) = window(1);

        registry.schedule(&dynamic, Duration::from_millis(500), |w| w.load_url("app://index.html"));
        assert_eq!(registry.pending(WindowId(1)), 1);

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(concrete.loads().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(concrete.loads(), vec!["app://index.html".to_string()]);
        assert_eq!(registry.pending(WindowId(1)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_before_delay_never_touches_window() {
        let registry = TimerRegistry::new();
        let (concrete, dynamic) = window(1);
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        registry.schedule(&dynamic, Duration::from_secs(2), move |w| {
            counter.fetch_add(1, Ordering::SeqCst);
            w.load_url("app://index.html");
        });

        concrete.destroy();
        assert_eq!(registry.drain(WindowId(1)), 1);
        drop(dynamic);

        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(concrete.loads().is_empty());
        assert_eq!(registry.total_pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroyed_window_skipped_without_drain() {
        let registry = TimerRegistry::new();
        let (concrete, dynamic) = window(1);
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        registry.schedule(&dynamic, Duration::from_millis(10), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        concrete.destroy();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(registry.pending(WindowId(1)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_is_scoped_per_window() {
        let registry = TimerRegistry::new();
        let (first, first_dyn) = window(1);
        let (second, second_dyn) = window(2);

        registry.schedule(&first_dyn, Duration::from_millis(10), |w| w.load_url("app://a"));
        registry.schedule(&second_dyn, Duration::from_millis(10), |w| w.load_url("app://b"));

        first.destroy();
        registry.drain(WindowId(1));
        assert_eq!(registry.pending(WindowId(2)), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(first.loads().is_empty());
        assert_eq!(second.loads(), vec!["app://b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_single_timer() {
        let registry = TimerRegistry::new();
        let (concrete, dynamic) = window(1);

        let keep = registry.schedule(&dynamic, Duration::from_millis(10), |w| w.load_url("app://keep"));
        let drop_me = registry.schedule(&dynamic, Duration::from_millis(10), |w| w.load_url("app://drop"));
        assert!(registry.cancel(WindowId(1), drop_me));
        assert!(!registry.cancel(WindowId(1), drop_me));
        assert_ne!(keep, drop_me);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(concrete.loads(), vec!["app://keep".to_string()]);
    }
}
