//! Directory watcher: re-ingests the newest matching CSV file whenever the
//! selection or its modification time changes.

use crate::append::pause_or_cancel;
use crate::error::Result;
use crate::handler::RowHandler;
use crate::options::WatchOptions;
use crate::parse::parse_rows;
use crate::reader::read_whole_file;
use crate::select::{find_latest_csv, write_time_of};
use crate::watcher::ChangeNotifier;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The file last delivered in full and its write time at that moment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LatestSelection {
    last_path: Option<PathBuf>,
    last_write_time: u64,
}

impl LatestSelection {
    /// A candidate is processed if it is a different file or strictly newer.
    pub fn is_changed(&self, path: &Path, write_time: u64) -> bool {
        match &self.last_path {
            Some(last) => last != path || write_time > self.last_write_time,
            None => true,
        }
    }

    pub fn record(&mut self, path: PathBuf, write_time: u64) {
        self.last_path = Some(path);
        self.last_write_time = write_time;
    }

    pub fn last_path(&self) -> Option<&Path> {
        self.last_path.as_deref()
    }
}

/// Result of one directory scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    NoCandidate,
    Unchanged(PathBuf),
    Delivered { path: PathBuf, rows: usize },
}

/// Runs one cycle of the directory watcher.
///
/// On a read or parse failure the baseline is left untouched, so the same
/// file is tried again on the next cycle.
pub async fn scan_once<H>(
    dir: &Path,
    prefix: &str,
    selection: &mut LatestSelection,
    handler: &mut H,
    options: &WatchOptions,
) -> Result<ScanOutcome>
where
    H: RowHandler + ?Sized,
{
    let Some(latest) = find_latest_csv(dir, prefix).await else {
        return Ok(ScanOutcome::NoCandidate);
    };

    let write_time = write_time_of(&latest).await;
    if !selection.is_changed(&latest, write_time) {
        return Ok(ScanOutcome::Unchanged(latest));
    }

    let delivered = ingest_file(&latest, write_time, selection, handler, options).await?;
    Ok(ScanOutcome::Delivered {
        path: latest,
        rows: delivered,
    })
}

/// Reads and delivers `path` in full, then records it as the baseline.
/// Nothing is recorded unless the whole file was read and parsed.
async fn ingest_file<H>(
    path: &Path,
    write_time: u64,
    selection: &mut LatestSelection,
    handler: &mut H,
    options: &WatchOptions,
) -> Result<usize>
where
    H: RowHandler + ?Sized,
{
    let content = read_whole_file(path).await?;
    let rows = parse_rows(&content, &options.format)?;
    for fields in &rows {
        handler.handle_row(path, fields);
    }

    selection.record(path.to_path_buf(), write_time);
    Ok(rows.len())
}

/// Watches `dir` for the newest `prefix*.csv` file until `cancel` fires.
///
/// Every change delivers the whole file again, header line included.
pub async fn run_latest<H>(
    dir: PathBuf,
    prefix: String,
    mut handler: H,
    options: WatchOptions,
    cancel: CancellationToken,
) where
    H: RowHandler,
{
    let mut selection = LatestSelection::default();
    let mut notifier = if options.notify {
        match ChangeNotifier::for_directory(&dir, &prefix) {
            Ok(notifier) => Some(notifier),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "change notifications unavailable; polling only");
                None
            }
        }
    } else {
        None
    };

    info!(dir = %dir.display(), prefix = %prefix, interval = ?options.interval, "directory watcher started");

    while !cancel.is_cancelled() {
        match scan_once(&dir, &prefix, &mut selection, &mut handler, &options).await {
            Ok(ScanOutcome::Delivered { path, rows }) => {
                info!(path = %path.display(), rows, "file delivered");
            }
            Ok(ScanOutcome::Unchanged(path)) => {
                debug!(path = %path.display(), "latest file unchanged");
            }
            Ok(ScanOutcome::NoCandidate) => {}
            Err(e) if e.is_not_available() => {
                debug!(dir = %dir.display(), error = %e, "latest file vanished before it was read");
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "directory scan failed");
            }
        }

        if !pause_or_cancel(options.interval, &cancel, notifier.as_mut()).await {
            break;
        }
    }

    info!(dir = %dir.display(), "directory watcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_helpers::{RecordingHandler, TempCsvDir, row};
    use std::time::Duration;

    #[test]
    fn test_selection_rules() {
        let mut selection = LatestSelection::default();
        let a = Path::new("/d/log_1.csv");
        let b = Path::new("/d/log_2.csv");

        assert!(selection.is_changed(a, 0));
        selection.record(a.to_path_buf(), 100);

        assert!(!selection.is_changed(a, 100));
        assert!(!selection.is_changed(a, 99));
        assert!(selection.is_changed(a, 101));
        // A different file counts even with an older timestamp.
        assert!(selection.is_changed(b, 1));
        assert_eq!(selection.last_path(), Some(a));
    }

    #[tokio::test]
    async fn test_scan_picks_newest_and_then_idles() {
        let dir = TempCsvDir::new().unwrap();
        dir.write_at("log_20240101.csv", "d,v\n1,old\n", 10).unwrap();
        let newest = dir
            .write_at("log_20240102.csv", "d,v\n2,new\n3,newer\n", 20)
            .unwrap();
        let mut selection = LatestSelection::default();
        let mut handler = RecordingHandler::new();
        let options = WatchOptions::default();

        let first = scan_once(dir.path(), "log_", &mut selection, &mut handler, &options)
            .await
            .unwrap();
        assert_eq!(
            first,
            ScanOutcome::Delivered {
                path: newest.clone(),
                rows: 3
            }
        );
        assert_eq!(
            handler.fields(),
            vec![row(&["d", "v"]), row(&["2", "new"]), row(&["3", "newer"])]
        );
        assert!(handler.rows().iter().all(|(path, _)| path == &newest));

        handler.clear();
        let second = scan_once(dir.path(), "log_", &mut selection, &mut handler, &options)
            .await
            .unwrap();
        assert_eq!(second, ScanOutcome::Unchanged(newest));
        assert!(handler.rows().is_empty());
    }

    #[tokio::test]
    async fn test_scan_redelivers_after_modification() {
        let dir = TempCsvDir::new().unwrap();
        dir.write_at("feed.csv", "1\n", 10).unwrap();
        let mut selection = LatestSelection::default();
        let mut handler = RecordingHandler::new();
        let options = WatchOptions::default();

        scan_once(dir.path(), "feed", &mut selection, &mut handler, &options)
            .await
            .unwrap();

        dir.write_at("feed.csv", "1\n2\n", 11).unwrap();
        handler.clear();
        let outcome = scan_once(dir.path(), "feed", &mut selection, &mut handler, &options)
            .await
            .unwrap();

        assert!(matches!(outcome, ScanOutcome::Delivered { rows: 2, .. }));
        assert_eq!(handler.fields(), vec![row(&["1"]), row(&["2"])]);
    }

    #[tokio::test]
    async fn test_scan_switches_to_new_file() {
        let dir = TempCsvDir::new().unwrap();
        dir.write_at("log_a.csv", "a\n", 10).unwrap();
        let mut selection = LatestSelection::default();
        let mut handler = RecordingHandler::new();
        let options = WatchOptions::default();

        scan_once(dir.path(), "log_", &mut selection, &mut handler, &options)
            .await
            .unwrap();

        let rotated = dir.write_at("log_b.csv", "b\n", 30).unwrap();
        handler.clear();
        scan_once(dir.path(), "log_", &mut selection, &mut handler, &options)
            .await
            .unwrap();

        assert_eq!(handler.rows(), vec![(rotated, row(&["b"]))]);
    }

    #[tokio::test]
    async fn test_scan_no_candidate() {
        let dir = TempCsvDir::new().unwrap();
        dir.write_at("other.csv", "x\n", 1).unwrap();
        let mut selection = LatestSelection::default();
        let mut handler = RecordingHandler::new();

        let outcome = scan_once(
            dir.path(),
            "log_",
            &mut selection,
            &mut handler,
            &WatchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, ScanOutcome::NoCandidate);
        assert_eq!(selection, LatestSelection::default());
    }

    #[tokio::test]
    async fn test_failed_read_leaves_selection_untouched() {
        let dir = TempCsvDir::new().unwrap();
        let mut selection = LatestSelection::default();
        let mut handler = RecordingHandler::new();
        let options = WatchOptions::default();

        let missing = dir.path().join("log_gone.csv");
        let err = ingest_file(&missing, 7, &mut selection, &mut handler, &options)
            .await
            .unwrap_err();
        assert!(err.is_not_available());
        assert_eq!(selection, LatestSelection::default());

        let folder = dir.mkdir("log_folder.csv").unwrap();
        let err = ingest_file(&folder, 7, &mut selection, &mut handler, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(selection, LatestSelection::default());
        assert!(handler.rows().is_empty());

        let path = dir.write_at("log_1.csv", "a\n", 1).unwrap();
        let write_time = write_time_of(&path).await;
        let outcome = scan_once(dir.path(), "log_", &mut selection, &mut handler, &options)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Delivered {
                path: path.clone(),
                rows: 1
            }
        );
        assert!(!selection.is_changed(&path, write_time));
    }

    #[tokio::test]
    async fn test_scan_matches_direct_parse() {
        let dir = TempCsvDir::new().unwrap();
        let content = "\u{FEFF}id,name,note\n1,\"Smith, J\",ok\n2,Lee\n\n3,\"multi\nline\",x\n";
        let path = dir.write_at("dump.csv", content, 1).unwrap();
        let mut selection = LatestSelection::default();
        let mut handler = RecordingHandler::new();
        let options = WatchOptions::default();

        scan_once(dir.path(), "dump", &mut selection, &mut handler, &options)
            .await
            .unwrap();

        let direct = parse_rows(&read_whole_file(&path).await.unwrap(), &options.format).unwrap();
        assert_eq!(handler.fields(), direct);
        assert_eq!(direct[0], row(&["id", "name", "note"]));
        assert_eq!(direct[3], row(&[""]));
        assert_eq!(direct[4], row(&["3", "multi\nline", "x"]));
    }

    #[tokio::test]
    async fn test_run_latest_delivers_once_until_changed() {
        let dir = TempCsvDir::new().unwrap();
        dir.write_at("log_1.csv", "a,1\n", 10).unwrap();
        let handler = RecordingHandler::new();
        let cancel = CancellationToken::new();
        let options = WatchOptions::default().with_interval(Duration::from_millis(10));

        let task = tokio::spawn(run_latest(
            dir.path().to_path_buf(),
            "log_".to_string(),
            handler.clone(),
            options,
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handler.fields(), vec![row(&["a", "1"])]);

        dir.write_at("log_2.csv", "b,2\n", 20).unwrap();
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while handler.rows().len() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok());
        assert_eq!(handler.fields(), vec![row(&["a", "1"]), row(&["b", "2"])]);

        cancel.cancel();
        let joined = tokio::time::timeout(Duration::from_secs(1), task).await;
        assert!(joined.is_ok());
    }
}
