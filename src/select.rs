//! Picks the "current" CSV file among the candidates in a directory.

use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;

const CSV_SUFFIX: &[u8] = b".csv";

/// A directory entry that passed the name filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub name: OsString,
    pub modified: u64,
}

/// Finds the newest file in `dir` whose name starts with `prefix` and ends
/// in `.csv` (any case).
///
/// The newest last-write time wins; on a tie the lexicographically greatest
/// name wins. Returns `None` when nothing qualifies or the directory cannot
/// be listed.
pub async fn find_latest_csv(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "cannot list directory");
            return None;
        }
    };

    let mut candidates = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "directory listing interrupted");
                break;
            }
        };

        let name = entry.file_name();
        if !is_candidate_name(&name, prefix) {
            continue;
        }
        // Follows symlinks; entries that vanish mid-scan are skipped.
        let Ok(metadata) = tokio::fs::metadata(entry.path()).await else {
            continue;
        };
        if metadata.is_dir() {
            continue;
        }
        candidates.push(Candidate {
            name,
            modified: write_time(&metadata),
        });
    }

    pick_latest(candidates).map(|name| dir.join(name))
}

/// Name rule: case-sensitive `prefix` at the start, case-insensitive `.csv`
/// at the end. A bare `.csv` qualifies when the prefix is empty.
pub(crate) fn is_candidate_name(name: &OsStr, prefix: &str) -> bool {
    let bytes = name.as_encoded_bytes();
    if !bytes.starts_with(prefix.as_bytes()) || bytes.len() < CSV_SUFFIX.len() {
        return false;
    }
    bytes[bytes.len() - CSV_SUFFIX.len()..].eq_ignore_ascii_case(CSV_SUFFIX)
}

/// Newest modification time first, then greatest name by bytes.
pub(crate) fn pick_latest<I>(candidates: I) -> Option<OsString>
where
    I: IntoIterator<Item = Candidate>,
{
    candidates
        .into_iter()
        .max_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| a.name.as_encoded_bytes().cmp(b.name.as_encoded_bytes()))
        })
        .map(|candidate| candidate.name)
}

/// Last-write time as nanoseconds since the Unix epoch; 0 when unknown.
pub(crate) fn write_time(metadata: &Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|since| u64::try_from(since.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Last-write time of whatever `path` names right now; 0 when unknown.
pub(crate) async fn write_time_of(path: &Path) -> u64 {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => write_time(&metadata),
        Err(_) => 0,
    }
}
