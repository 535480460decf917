use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::file::{FileEntry, base_name};

/// A directory and its visible children, sorted by path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub children: Vec<ScanEntry>,
}

impl DirEntry {
    pub fn new(path: impl Into<PathBuf>, children: Vec<ScanEntry>) -> Self {
        let path = path.into();
        Self {
            name: base_name(&path),
            path,
            children,
        }
    }

    /// Files directly inside this directory
    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.children.iter().filter_map(|child| match child {
            ScanEntry::File(file) => Some(file),
            ScanEntry::Dir(_) => None,
        })
    }
}

/// One node of a scan result tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScanEntry {
    File(FileEntry),
    Dir(DirEntry),
}

impl ScanEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::File(file) => &file.name,
            Self::Dir(dir) => &dir.name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::File(file) => &file.path,
            Self::Dir(dir) => &dir.path,
        }
    }

    /// Sum of all file sizes below this entry
    pub fn total_size(&self) -> u64 {
        match self {
            Self::File(file) => file.size,
            Self::Dir(dir) => dir.children.iter().map(ScanEntry::total_size).sum(),
        }
    }

    /// Appends every file below this entry in depth-first order.
    ///
    /// Since each level is sorted by path, the output of a sorted forest is
    /// itself sorted by path.
    pub fn collect_files(&self, out: &mut Vec<FileEntry>) {
        match self {
            Self::File(file) => out.push(file.clone()),
            Self::Dir(dir) => {
                for child in &dir.children {
                    child.collect_files(out);
                }
            }
        }
    }

    /// Appends this directory and every subdirectory that directly holds
    /// at least one file
    pub fn collect_directories(&self, out: &mut Vec<PathBuf>) {
        if let Self::Dir(dir) = self {
            if dir.files().next().is_some() {
                out.push(dir.path.clone());
            }
            for child in &dir.children {
                child.collect_directories(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScanEntry {
        ScanEntry::Dir(DirEntry::new(
            "/music",
            vec![
                ScanEntry::Dir(DirEntry::new(
                    "/music/album",
                    vec![
                        ScanEntry::File(FileEntry::new("/music/album/01.flac", 10)),
                        ScanEntry::File(FileEntry::new("/music/album/02.flac", 20)),
                    ],
                )),
                ScanEntry::Dir(DirEntry::new("/music/empty", vec![])),
                ScanEntry::File(FileEntry::new("/music/cover.jpg", 5)),
            ],
        ))
    }

    #[test]
    fn test_total_size() {
        assert_eq!(sample().total_size(), 35);
    }

    #[test]
    fn test_collect_files_depth_first() {
        let mut files = Vec::new();
        sample().collect_files(&mut files);
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["01.flac", "02.flac", "cover.jpg"]);
    }

    #[test]
    fn test_collect_directories_skips_dirs_without_files() {
        let mut dirs = Vec::new();
        sample().collect_directories(&mut dirs);
        assert_eq!(
            dirs,
            vec![PathBuf::from("/music"), PathBuf::from("/music/album")]
        );
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let entry = ScanEntry::File(FileEntry::new("/a.txt", 3));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["name"], "a.txt");
        assert_eq!(json["size"], 3);
    }
}
