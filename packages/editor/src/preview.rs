//! # Preview Sync
//!
//! Debounces preview regeneration. Every document change asks for a
//! preview; requests arriving within the debounce window collapse into one
//! render fired after the window elapses.
//!
//! A new request cancels the pending timer only. A render that has already
//! started is never cancelled; instead every render gets a sequence number
//! and results older than the newest accepted one are dropped.
//!
//! Rendering is always a full-document regeneration.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Default debounce window
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Latest preview output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewOutput {
    pub html: Option<String>,
    pub error: Option<String>,
    /// Sequence number of the render that produced this output
    pub seq: u64,
}

/// Debounce timer plus the latest rendered output
#[derive(Debug)]
pub struct PreviewSync {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    next_seq: AtomicU64,
    output: Mutex<PreviewOutput>,
}

impl PreviewSync {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
            next_seq: AtomicU64::new(0),
            output: Mutex::new(PreviewOutput::default()),
        }
    }

    /// Schedule `render` to run after the debounce window, replacing any
    /// pending request. Returns false when there is no tokio runtime to run
    /// the timer on.
    pub fn schedule<F, Fut>(&self, render: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            trace!("No runtime; preview request dropped");
            return false;
        };

        let delay = self.delay;
        let spawner = runtime.clone();
        let timer = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Detach the render so a later request can't abort it mid-flight
            spawner.spawn(render());
        });

        if let Some(previous) = self.pending().replace(timer) {
            previous.abort();
            trace!("Debounced preview request");
        }
        true
    }

    /// Drop the pending request, if any
    pub fn cancel(&self) {
        if let Some(pending) = self.pending().take() {
            pending.abort();
            debug!("Cancelled pending preview");
        }
    }

    /// Whether a debounce timer is still waiting
    pub fn is_pending(&self) -> bool {
        self.pending()
            .as_ref()
            .map_or(false, |timer| !timer.is_finished())
    }

    /// Reserve a sequence number for a render about to start
    pub fn begin_render(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Store a render result unless a newer one already landed.
    /// Returns whether it was accepted.
    pub fn complete(&self, seq: u64, result: Result<String, String>) -> bool {
        let mut output = self.output();
        if seq <= output.seq {
            debug!(seq, latest = output.seq, "Dropping out-of-order preview");
            return false;
        }

        output.seq = seq;
        match result {
            Ok(html) => {
                output.html = Some(html);
                output.error = None;
            }
            Err(error) => output.error = Some(error),
        }
        true
    }

    pub(crate) fn output(&self) -> MutexGuard<'_, PreviewOutput> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget rendered output (e.g. when another document is loaded)
    pub fn clear(&self) {
        *self.output() = PreviewOutput {
            seq: self.next_seq.load(Ordering::SeqCst),
            ..PreviewOutput::default()
        };
    }

    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PreviewSync {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Drop for PreviewSync {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_schedule_without_runtime_is_dropped() {
        let preview = PreviewSync::default();
        assert!(!preview.schedule(|| async {}));
        assert!(!preview.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_within_window_collapse() {
        let preview = PreviewSync::new(Duration::from_millis(500));
        let renders = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let renders = renders.clone();
            preview.schedule(move || async move {
                renders.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        assert_eq!(renders.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_request() {
        let preview = PreviewSync::new(Duration::from_millis(500));
        let renders = Arc::new(AtomicUsize::new(0));

        let counter = renders.clone();
        preview.schedule(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(preview.is_pending());

        preview.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(renders.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_out_of_order_results_are_dropped() {
        let preview = PreviewSync::default();
        let first = preview.begin_render();
        let second = preview.begin_render();

        assert!(preview.complete(second, Ok("<p>new</p>".to_string())));
        assert!(!preview.complete(first, Ok("<p>old</p>".to_string())));

        assert_eq!(preview.output().html.as_deref(), Some("<p>new</p>"));
    }

    #[test]
    fn test_failed_render_keeps_last_html() {
        let preview = PreviewSync::default();
        let first = preview.begin_render();
        preview.complete(first, Ok("<p>ok</p>".to_string()));

        let second = preview.begin_render();
        preview.complete(second, Err("renderer down".to_string()));

        let output = preview.output();
        assert_eq!(output.html.as_deref(), Some("<p>ok</p>"));
        assert_eq!(output.error.as_deref(), Some("renderer down"));
    }
}
