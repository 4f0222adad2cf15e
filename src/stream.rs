//! Stream adapter: delivers rows over a channel instead of a callback.

use crate::handle::WatchHandle;
use crate::handler::RowHandler;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// One delivered row and the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub path: PathBuf,
    pub fields: Vec<String>,
}

/// Row handler forwarding into a channel; rows are dropped once the
/// receiving side is gone.
pub(crate) struct ChannelHandler {
    tx: mpsc::UnboundedSender<CsvRow>,
}

impl RowHandler for ChannelHandler {
    fn handle_row(&mut self, path: &Path, fields: &[String]) {
        let _ = self.tx.send(CsvRow {
            path: path.to_path_buf(),
            fields: fields.to_vec(),
        });
    }
}

/// A stream of rows produced by a background watcher.
///
/// The stream never ends on its own; dropping it stops the watcher.
pub struct RowStream {
    receiver: mpsc::UnboundedReceiver<CsvRow>,
    handle: WatchHandle,
}

impl RowStream {
    /// Starts the watcher built by `start` with a handler feeding this stream.
    pub(crate) fn start<F>(start: F) -> Self
    where
        F: FnOnce(ChannelHandler) -> WatchHandle,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = start(ChannelHandler { tx });
        Self {
            receiver: rx,
            handle,
        }
    }

    /// Handle of the watcher feeding this stream.
    pub fn handle(&self) -> &WatchHandle {
        &self.handle
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

impl Stream for RowStream {
    type Item = CsvRow;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}
