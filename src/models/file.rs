use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A regular file found while scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Base name of the file
    pub name: String,
    /// Absolute path of the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        Self {
            name: base_name(&path),
            path,
            size,
        }
    }
}

/// Last path component as a string, or the whole path for roots
pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
