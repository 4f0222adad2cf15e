//! Platform file identity used to notice that a path now names a different file.

use std::fs::Metadata;
use std::path::Path;

/// Identity of the underlying file, independent of the path used to reach it.
///
/// On Unix this is the device and inode pair. Other platforms report no
/// identity, which disables replacement detection: only truncation (a size
/// shrink) stays observable there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    /// Device or volume the file lives on.
    pub volume: u64,
    /// File index within the volume (the inode number on Unix).
    pub index: u64,
}

impl FileIdentity {
    /// Extracts the identity from already fetched metadata.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            volume: metadata.dev(),
            index: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }

    /// Probes whatever file `path` currently names.
    ///
    /// Returns `None` when the path is missing (for example halfway through a
    /// rotation) or the platform cannot report an identity.
    pub async fn probe(path: &Path) -> Option<Self> {
        let metadata = tokio::fs::metadata(path).await.ok()?;
        Self::from_metadata(&metadata)
    }
}
