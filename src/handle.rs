//! Handle to a spawned watcher task.

use crate::error::Result;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running watcher. Call [`shutdown`](Self::shutdown) to stop it and wait
/// for it to finish.
///
/// Dropping the handle does not stop the watcher; it keeps running detached
/// until its cancellation token fires or the runtime shuts down.
#[derive(Debug)]
pub struct WatchHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub(crate) fn spawn<F>(cancel: CancellationToken, watcher: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            cancel,
            task: tokio::spawn(watcher),
        }
    }

    /// Requests a stop. The watcher notices at its next cycle or while sleeping.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token stopping this watcher, e.g. to tie it to a wider shutdown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the watcher to end, which only happens after cancellation.
    pub async fn join(self) -> Result<()> {
        self.task.await?;
        Ok(())
    }

    /// Cancels the watcher and waits for it to end.
    pub async fn shutdown(self) -> Result<()> {
        self.cancel();
        self.join().await
    }
}
