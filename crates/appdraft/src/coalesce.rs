//! Debounced delivery of document-changed notifications.
//!
//! Rapid edits must not flood the observer, so notifications fire on the
//! trailing edge of a quiet interval. Only the latest document state is ever
//! delivered: a newer mutation supersedes a pending notification instead of
//! queueing behind it.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time};
use tracing::trace;

use crate::crd::Application;

/// Quiet interval after the last mutation before the observer is notified.
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(800);

type Callback = Arc<dyn Fn(Application) + Send + Sync + 'static>;

/// Wraps an observer callback with trailing-edge debouncing.
///
/// The pending notification is an owned task handle: superseded on the next
/// [`Self::notify`], aborted on [`Self::cancel`] and on drop. A cancelled
/// notification never fires. Must be used within a tokio runtime.
pub struct ChangeCoalescer {
    callback: Callback,
    quiet_interval: Duration,
    pending: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ChangeCoalescer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeCoalescer")
            .field("quiet_interval", &self.quiet_interval)
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}

impl ChangeCoalescer {
    pub fn new(callback: impl Fn(Application) + Send + Sync + 'static) -> Self {
        Self::with_interval(callback, DEFAULT_QUIET_INTERVAL)
    }

    pub fn with_interval(
        callback: impl Fn(Application) + Send + Sync + 'static,
        quiet_interval: Duration,
    ) -> Self {
        Self {
            callback: Arc::new(callback),
            quiet_interval,
            pending: None,
        }
    }

    /// Schedules a notification carrying `app`, superseding any pending one.
    pub fn notify(&mut self, app: Application) {
        self.abort_pending();

        let callback = Arc::clone(&self.callback);
        // The quiet interval is measured from the mutation itself, not from
        // the first poll of the notification task.
        let deadline = time::Instant::now() + self.quiet_interval;
        self.pending = Some(tokio::spawn(async move {
            time::sleep_until(deadline).await;
            trace!("quiet interval elapsed, delivering document");
            callback(app);
        }));
    }

    /// Delivers `app` immediately, bypassing the quiet interval.
    ///
    /// Used when a whole-document merge replaces the canonical document and
    /// the observer must not act on a stale snapshot.
    pub fn notify_now(&self, app: Application) {
        (self.callback)(app);
    }

    /// Cancels a pending notification, it will not fire afterwards.
    pub fn cancel(&mut self) {
        self.abort_pending();
    }

    fn abort_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for ChangeCoalescer {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
