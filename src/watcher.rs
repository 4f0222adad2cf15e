//! Filesystem change notifications used to cut a poll interval short.

use crate::error::{Error, Result};
use crate::select::is_candidate_name;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::debug;

/// Which entries of the watched directory matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChangeFilter {
    /// Exactly this file name.
    FileName(OsString),
    /// Names accepted by the latest-file selector for this prefix.
    CsvPrefix(String),
}

/// Watches one directory non-recursively and reports relevant changes.
pub(crate) struct ChangeNotifier {
    _watcher: RecommendedWatcher,
    receiver: mpsc::UnboundedReceiver<notify::Result<Event>>,
    filter: ChangeFilter,
}

impl ChangeNotifier {
    /// Watches the parent directory of `path` for events on its file name.
    /// The file itself need not exist yet.
    pub(crate) fn for_file(path: &Path) -> Result<Self> {
        let name = path.file_name().ok_or_else(|| Error::InvalidPath {
            message: format!("{} has no file name", path.display()),
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::watch(&parent, ChangeFilter::FileName(name.to_os_string()))
    }

    /// Watches `dir` for events on prefix-matching CSV files.
    pub(crate) fn for_directory(dir: &Path, prefix: &str) -> Result<Self> {
        Self::watch(dir, ChangeFilter::CsvPrefix(prefix.to_string()))
    }

    fn watch(dir: &Path, filter: ChangeFilter) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            filter,
        })
    }

    /// Resolves on the next relevant event. Never resolves once the
    /// underlying watcher has gone away, leaving the poll timer in charge.
    pub(crate) async fn changed(&mut self) {
        loop {
            match self.receiver.recv().await {
                Some(Ok(event)) => {
                    if is_event_relevant(&event, &self.filter) {
                        return;
                    }
                }
                Some(Err(e)) => {
                    debug!(error = %e, "change notification error");
                }
                None => std::future::pending::<()>().await,
            }
        }
    }
}

/// Check if a notify event touches an entry the filter cares about
pub(crate) fn is_event_relevant(event: &Event, filter: &ChangeFilter) -> bool {
    // Opens and reads, including our own, never change content.
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event.paths.iter().any(|path| {
        let Some(name) = path.file_name() else {
            return false;
        };
        match filter {
            ChangeFilter::FileName(target) => name == target.as_os_str(),
            ChangeFilter::CsvPrefix(prefix) => is_candidate_name(name, prefix),
        }
    })
}
