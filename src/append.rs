//! Append watcher: tails one file and delivers the rows appended to it.

use crate::error::Result;
use crate::handler::RowHandler;
use crate::options::WatchOptions;
use crate::parse::parse_rows;
use crate::tail::TailReader;
use crate::watcher::ChangeNotifier;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of one append poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The file could not be opened yet.
    NotReady,
    /// Nothing new was complete.
    Idle,
    Delivered { rows: usize },
}

/// Runs one cycle: read new lines, parse them, hand each row to `handler`.
///
/// The lines are consumed even when they fail to parse, so a malformed
/// chunk is dropped instead of being retried forever.
pub async fn poll_append<H>(
    reader: &mut TailReader,
    handler: &mut H,
    options: &WatchOptions,
) -> Result<PollOutcome>
where
    H: RowHandler + ?Sized,
{
    if !reader.open().await {
        return Ok(PollOutcome::NotReady);
    }

    let lines = reader.read_appended_lines().await?;
    if lines.is_empty() {
        return Ok(PollOutcome::Idle);
    }

    let mut block = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in &lines {
        block.push_str(line);
        block.push('\n');
    }

    let rows = parse_rows(&block, &options.format)?;
    for fields in &rows {
        handler.handle_row(reader.path(), fields);
    }
    Ok(PollOutcome::Delivered { rows: rows.len() })
}

/// Tails `path` until `cancel` fires, delivering each appended row to
/// `handler`. Failures are logged and retried; they never end the loop.
pub async fn run_append<H>(
    path: PathBuf,
    mut handler: H,
    options: WatchOptions,
    cancel: CancellationToken,
) where
    H: RowHandler,
{
    let mut reader = TailReader::new(&path, options.skip_header);
    let mut notifier = if options.notify {
        match ChangeNotifier::for_file(&path) {
            Ok(notifier) => Some(notifier),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "change notifications unavailable; polling only");
                None
            }
        }
    } else {
        None
    };

    info!(path = %path.display(), interval = ?options.interval, "append watcher started");

    while !cancel.is_cancelled() {
        let pause = match poll_append(&mut reader, &mut handler, &options).await {
            Ok(PollOutcome::NotReady) => options.retry_backoff,
            Ok(PollOutcome::Idle) => options.interval,
            Ok(PollOutcome::Delivered { rows }) => {
                debug!(path = %path.display(), rows, offset = reader.offset(), "rows delivered");
                options.interval
            }
            Err(e) if e.is_not_available() => {
                debug!(path = %path.display(), error = %e, "file not available");
                options.retry_backoff
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "append poll failed");
                options.recovery_backoff
            }
        };

        if !pause_or_cancel(pause, &cancel, notifier.as_mut()).await {
            break;
        }
    }

    reader.close();
    info!(path = %path.display(), "append watcher stopped");
}

/// Sleeps for `pause`, waking early on a relevant change notification.
/// Returns false once cancellation has been requested.
pub(crate) async fn pause_or_cancel(
    pause: Duration,
    cancel: &CancellationToken,
    notifier: Option<&mut ChangeNotifier>,
) -> bool {
    if pause.is_zero() {
        tokio::task::yield_now().await;
        return !cancel.is_cancelled();
    }

    let changed = async {
        match notifier {
            Some(notifier) => notifier.changed().await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(pause) => true,
        _ = changed => true,
    }
}
