//! Incremental tail reader for a single growing CSV file.
//!
//! The reader keeps a byte offset into the file and only ever reads bytes past
//! it. Bytes that do not yet end in `\n` stay in a carry buffer until a later
//! read completes them, so a line is delivered exactly once and never in
//! pieces. Two events reset the state and start over at byte 0:
//!
//! * truncation: the same file is now shorter than the offset;
//! * replacement: the path now names a different file (rotation by rename or
//!   delete + create), noticed through [`FileIdentity`].
//!
//! Records are split on `\n` only. A CSV record with a newline inside a
//! quoted field is split into two lines.

use crate::error::Result;
use crate::identity::FileIdentity;
use crate::reader::{
    UTF8_BOM, calculate_bytes_to_read, detect_file_truncation, split_complete_lines,
};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

/// Upper bound for a single read call.
const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Per-open progress through the file.
#[derive(Debug, Default)]
struct TailState {
    /// Bytes consumed from the start of the file.
    offset: u64,
    /// Bytes read but not yet returned as lines. Normally only a partial
    /// line; after a failed read it may also hold complete lines, which the
    /// next successful call returns.
    carry: Vec<u8>,
    bom_stripped: bool,
    header_skipped: bool,
}

impl TailState {
    fn reset(&mut self) {
        self.offset = 0;
        self.carry.clear();
        self.bom_stripped = false;
        self.header_skipped = false;
    }

    fn absorb(&mut self, chunk: &[u8]) {
        self.offset += chunk.len() as u64;
        self.carry.extend_from_slice(chunk);
    }

    /// Pull every complete line out of the carry buffer.
    fn take_lines(&mut self, skip_header: bool) -> Vec<String> {
        if !self.bom_stripped && !self.carry.is_empty() {
            if self.carry.starts_with(&UTF8_BOM) {
                self.carry.drain(..UTF8_BOM.len());
            }
            self.bom_stripped = true;
        }

        if skip_header && !self.header_skipped {
            match self.carry.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    self.carry.drain(..=pos);
                    self.header_skipped = true;
                }
                // Header itself is still incomplete
                None => return Vec::new(),
            }
        }

        let Some(last) = self.carry.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };
        let rest = self.carry.split_off(last + 1);
        let complete = std::mem::replace(&mut self.carry, rest);
        split_complete_lines(&complete)
    }
}

/// Stateful reader returning the complete lines appended to a file since the
/// previous call.
#[derive(Debug)]
pub struct TailReader {
    path: PathBuf,
    skip_header: bool,
    file: Option<File>,
    identity: Option<FileIdentity>,
    state: TailState,
}

impl TailReader {
    /// Creates a closed reader. When `skip_header` is set the first line of
    /// every file (and of every rewrite of it) is dropped.
    pub fn new<P: AsRef<Path>>(path: P, skip_header: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            skip_header,
            file: None,
            identity: None,
            state: TailState::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes consumed so far, including bytes still held as a partial line.
    pub fn offset(&self) -> u64 {
        self.state.offset
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Whether replacement detection is active for the open file.
    pub fn tracks_identity(&self) -> bool {
        self.identity.is_some()
    }

    /// Opens the file unless it is already open.
    ///
    /// Returns `false` if the file does not exist yet or cannot be opened
    /// right now; the caller is expected to try again later. A fresh open
    /// starts from byte 0 with header and BOM handling re-armed.
    pub async fn open(&mut self) -> bool {
        if self.file.is_some() {
            return true;
        }

        let file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "file not ready");
                return false;
            }
        };

        self.identity = match file.metadata().await {
            Ok(metadata) => FileIdentity::from_metadata(&metadata),
            Err(_) => None,
        };
        self.file = Some(file);
        self.state.reset();
        true
    }

    /// Releases the file handle. Safe to call repeatedly or before any open.
    pub fn close(&mut self) {
        self.file = None;
    }

    /// Reads newly appended complete lines, without their terminators.
    ///
    /// Returns an empty vector when the file is unavailable or has not grown.
    /// On an I/O error mid-read the bytes already read stay consumed and
    /// buffered, so the next call resumes where this one stopped.
    pub async fn read_appended_lines(&mut self) -> Result<Vec<String>> {
        if !self.open().await {
            return Ok(Vec::new());
        }

        self.reopen_if_replaced().await;

        let Some(file) = self.file.as_mut() else {
            return Ok(Vec::new());
        };

        let current_size = file.metadata().await?.len();
        if detect_file_truncation(current_size, self.state.offset) {
            debug!(
                path = %self.path.display(),
                offset = self.state.offset,
                current_size,
                "file truncated; reading from the start"
            );
            self.state.reset();
        }

        let Some(mut remaining) = calculate_bytes_to_read(current_size, self.state.offset) else {
            return Ok(Vec::new());
        };

        file.seek(SeekFrom::Start(self.state.offset)).await?;

        let mut buf = vec![0u8; READ_CHUNK_BYTES];
        while remaining > 0 {
            let want = remaining.min(READ_CHUNK_BYTES as u64) as usize;
            let read = file.read(&mut buf[..want]).await?;
            if read == 0 {
                break;
            }
            self.state.absorb(&buf[..read]);
            remaining -= read as u64;
        }

        Ok(self.state.take_lines(self.skip_header))
    }

    /// Reopens from scratch when the path now names a different file.
    async fn reopen_if_replaced(&mut self) {
        let Some(cached) = self.identity else {
            return;
        };
        // A missing path is usually a rotation in progress; keep the old handle.
        let Some(current) = FileIdentity::probe(&self.path).await else {
            return;
        };
        if current == cached {
            return;
        }

        debug!(path = %self.path.display(), "file replaced; reopening");
        self.close();
        self.open().await;
    }
}
