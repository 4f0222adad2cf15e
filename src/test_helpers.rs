//! Test utilities for creating temporary CSV files and recording delivered rows.

use crate::handler::RowHandler;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

pub struct TempCsvFile {
    pub path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TempCsvFile {
    /// Create a new, empty temporary CSV file
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("feed.csv");
        File::create(&path)?;

        Ok(Self {
            path,
            _temp_dir: temp_dir,
        })
    }

    /// Name a file inside a fresh temp dir without creating it
    pub fn missing() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("feed.csv");
        Ok(Self {
            path,
            _temp_dir: temp_dir,
        })
    }

    /// Create a temporary CSV file with exactly `content`
    pub fn with_content(content: &str) -> std::io::Result<Self> {
        let temp_file = Self::new()?;
        temp_file.append_raw(content)?;
        Ok(temp_file)
    }

    /// Append bytes verbatim, no terminator added
    pub fn append_raw(&self, content: &str) -> std::io::Result<()> {
        self.append_bytes(content.as_bytes())
    }

    pub fn append_bytes(&self, content: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(content)?;
        file.flush()?;
        Ok(())
    }

    /// Rewrite the same file in place (truncate, then write)
    pub fn rewrite(&self, content: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().write(true).truncate(true).open(&self.path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Simulate rotation: a brand new file is renamed over the path
    pub fn replace_with(&self, content: &str) -> std::io::Result<()> {
        let staging = self.path.with_extension("csv.next");
        fs::write(&staging, content)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A temp directory whose files get explicit modification times.
pub struct TempCsvDir {
    dir: tempfile::TempDir,
}

impl TempCsvDir {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `name` with `content` and stamp it `secs` seconds after a fixed base time
    pub fn write_at(&self, name: &str, content: &str, secs: u64) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, content)?;
        self.touch(name, secs)?;
        Ok(path)
    }

    pub fn touch(&self, name: &str, secs: u64) -> std::io::Result<()> {
        let file = OpenOptions::new().write(true).open(self.dir.path().join(name))?;
        file.set_modified(stamp(secs))?;
        Ok(())
    }

    pub fn mkdir(&self, name: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::create_dir(&path)?;
        Ok(path)
    }
}

pub fn stamp(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
}

/// Row handler that records every delivery, shareable across tasks.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    rows: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fields(&self) -> Vec<Vec<String>> {
        self.rows().into_iter().map(|(_, fields)| fields).collect()
    }

    pub fn clear(&self) {
        self.rows.lock().unwrap().clear();
    }
}

impl RowHandler for RecordingHandler {
    fn handle_row(&mut self, path: &Path, fields: &[String]) {
        self.rows
            .lock()
            .unwrap()
            .push((path.to_path_buf(), fields.to_vec()));
    }
}

/// Shorthand for building expected rows
pub fn row(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_csv_file_creation() {
        let temp_file = TempCsvFile::new().unwrap();
        assert!(temp_file.path().exists());
    }

    #[test]
    fn test_append_raw_keeps_bytes_verbatim() {
        let temp_file = TempCsvFile::with_content("a,b").unwrap();
        temp_file.append_raw(",c\n").unwrap();

        let content = fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "a,b,c\n");
    }

    #[test]
    fn test_rewrite_shrinks_file() {
        let temp_file = TempCsvFile::with_content("a,b,c\n1,2,3\n").unwrap();
        temp_file.rewrite("x\n").unwrap();

        assert_eq!(fs::read_to_string(temp_file.path()).unwrap(), "x\n");
    }

    #[test]
    fn test_replace_with_swaps_content() {
        let temp_file = TempCsvFile::with_content("old\n").unwrap();
        temp_file.replace_with("new\n").unwrap();

        assert_eq!(fs::read_to_string(temp_file.path()).unwrap(), "new\n");
    }

    #[test]
    fn test_write_at_sets_modified_time() {
        let dir = TempCsvDir::new().unwrap();
        let path = dir.write_at("a.csv", "1\n", 42).unwrap();

        let modified = fs::metadata(path).unwrap().modified().unwrap();
        assert_eq!(modified, stamp(42));
    }
}
