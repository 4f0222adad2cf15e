//! Watchers that deliver newly available CSV rows from files written by
//! someone else.
//!
//! Two strategies are provided, each running as one polling task:
//!
//! * [`watch_append`] tails a single file, delivering each row once as soon as
//!   its line is terminated. Truncation and rotation of the file are detected
//!   and reading restarts at the beginning of the new content.
//! * [`watch_latest`] watches a directory for the newest `prefix*.csv` file
//!   and delivers the whole file again whenever the selection or its
//!   modification time changes.
//!
//! Rows reach a [`RowHandler`] (any `FnMut(&Path, &[String])` works), or a
//! [`RowStream`] through [`stream_append`] / [`stream_latest`].
//!
//! # Example
//!
//! ```rust,no_run
//! use csv_tail::{WatchOptions, watch_append};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handle = watch_append(
//!         "metrics.csv",
//!         |path: &Path, fields: &[String]| println!("{}: {:?}", path.display(), fields),
//!         WatchOptions::default().with_interval_secs(1),
//!     );
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod append;
pub mod config;
mod error;
mod handle;
mod handler;
mod identity;
mod latest;
mod options;
mod parse;
mod reader;
mod select;
mod stream;
mod tail;
mod watcher;

#[cfg(test)]
mod test_helpers;

pub use append::{PollOutcome, poll_append, run_append};
pub use error::{Error, Result};
pub use handle::WatchHandle;
pub use handler::RowHandler;
pub use identity::FileIdentity;
pub use latest::{LatestSelection, ScanOutcome, run_latest, scan_once};
pub use options::{
    DEFAULT_POLL_INTERVAL, DEFAULT_RECOVERY_BACKOFF, DEFAULT_RETRY_BACKOFF, WatchOptions,
    interval_from_secs,
};
pub use parse::{CsvFormat, parse_rows};
pub use select::find_latest_csv;
pub use stream::{CsvRow, RowStream};
pub use tail::TailReader;

use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Spawns a watcher that tails `path` and hands every newly appended row to
/// `handler`.
///
/// The file does not need to exist yet. Must be called from within a tokio
/// runtime.
///
/// # Example
///
/// ```rust,no_run
/// use csv_tail::{WatchOptions, watch_append};
/// use std::path::Path;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = watch_append(
///         "feed.csv",
///         |_: &Path, fields: &[String]| println!("{}", fields.join("|")),
///         WatchOptions::default(),
///     );
///     handle.join().await?;
///     Ok(())
/// }
/// ```
pub fn watch_append<P, H>(path: P, handler: H, options: WatchOptions) -> WatchHandle
where
    P: AsRef<Path>,
    H: RowHandler + Send + 'static,
{
    let cancel = CancellationToken::new();
    let watcher = run_append(path.as_ref().to_path_buf(), handler, options, cancel.clone());
    WatchHandle::spawn(cancel, watcher)
}

/// Spawns a watcher that re-delivers the newest `prefix*.csv` file in `dir`
/// whenever it changes.
///
/// `prefix` is matched case-sensitively; the `.csv` suffix is not.
pub fn watch_latest<P, H>(dir: P, prefix: &str, handler: H, options: WatchOptions) -> WatchHandle
where
    P: AsRef<Path>,
    H: RowHandler + Send + 'static,
{
    let cancel = CancellationToken::new();
    let watcher = run_latest(
        dir.as_ref().to_path_buf(),
        prefix.to_string(),
        handler,
        options,
        cancel.clone(),
    );
    WatchHandle::spawn(cancel, watcher)
}

/// Like [`watch_append`], but rows arrive through a [`RowStream`].
///
/// # Example
///
/// ```rust,no_run
/// use csv_tail::{WatchOptions, stream_append};
/// use tokio_stream::StreamExt;
///
/// #[tokio::main]
/// async fn main() {
///     let mut rows = stream_append("feed.csv", WatchOptions::default());
///     while let Some(row) = rows.next().await {
///         println!("{:?}", row.fields);
///     }
/// }
/// ```
pub fn stream_append<P: AsRef<Path>>(path: P, options: WatchOptions) -> RowStream {
    RowStream::start(|handler| watch_append(path, handler, options))
}

/// Like [`watch_latest`], but rows arrive through a [`RowStream`].
pub fn stream_latest<P: AsRef<Path>>(dir: P, prefix: &str, options: WatchOptions) -> RowStream {
    RowStream::start(|handler| watch_latest(dir, prefix, handler, options))
}
