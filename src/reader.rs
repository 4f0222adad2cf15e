//! Byte-level helpers shared by the tail reader and the whole-file reader.

use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::Path;

/// UTF-8 byte-order mark.
pub(crate) const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Read the whole file and decode it, dropping a leading byte-order mark.
///
/// A missing file maps to [`Error::NotAvailable`]: the directory scan may
/// race a producer that deletes or renames the file it just picked.
pub(crate) async fn read_whole_file(path: &Path) -> Result<String> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::NotAvailable {
                path: path.display().to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    Ok(String::from_utf8_lossy(strip_bom(&bytes)).into_owned())
}

/// Returns `bytes` without a leading UTF-8 byte-order mark
pub(crate) fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&UTF8_BOM[..]).unwrap_or(bytes)
}

/// Split a buffer that ends with `\n` into lines, dropping one trailing
/// `\r` from each. Empty lines are kept.
pub(crate) fn split_complete_lines(complete: &[u8]) -> Vec<String> {
    if complete.is_empty() {
        return Vec::new();
    }

    let body = complete.strip_suffix(b"\n").unwrap_or(complete);
    body.split(|b| *b == b'\n')
        .map(|line| {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            String::from_utf8_lossy(line).into_owned()
        })
        .collect()
}

/// Detect if the file was truncated by comparing current size with the offset
pub(crate) fn detect_file_truncation(current_size: u64, offset: u64) -> bool {
    current_size < offset
}

/// Calculate bytes to read based on current size and offset
pub(crate) fn calculate_bytes_to_read(current_size: u64, offset: u64) -> Option<u64> {
    if current_size <= offset {
        None
    } else {
        Some(current_size - offset)
    }
}
