//! Error types for the CSV tail library.

use std::io::ErrorKind;
use thiserror::Error;

/// The main error type for CSV watching operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors when reading files or enumerating directories.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File change notification errors from the notify crate.
    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// Malformed CSV content.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// The file does not exist yet or is locked by another process.
    #[error("File not available yet: {path}")]
    NotAvailable { path: String },

    /// File path errors.
    #[error("Invalid file path: {message}")]
    InvalidPath { message: String },

    /// A spawned watcher task panicked or was aborted.
    #[error("Watcher task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Returns true when the failure only means "try again on the next tick":
    /// the file is missing or held exclusively by someone else.
    pub fn is_not_available(&self) -> bool {
        match self {
            Error::NotAvailable { .. } => true,
            Error::Io(e) => matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied),
            _ => false,
        }
    }
}

/// A convenient Result type for CSV watching operations.
pub type Result<T> = std::result::Result<T, Error>;
