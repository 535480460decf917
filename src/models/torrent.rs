use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::file::FileEntry;

/// Description of a torrent to create and seed, handed to the engine.
///
/// Field names are part of the engine contract: `basePath` travels as `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentSpec {
    pub name: String,
    /// Directory the torrent content lives in
    #[serde(rename = "path")]
    pub base_path: PathBuf,
    pub files: Vec<FileEntry>,
    pub announce: Vec<String>,
    pub private: bool,
    pub comment: String,
}

impl TorrentSpec {
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}
