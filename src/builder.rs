use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::MIN_LIBRARY_FILES;
use crate::error::{Error, Result};
use crate::models::{DirEntry, FileEntry, ScanEntry, TorrentSpec, base_name};
use crate::scanner::{FileSystem, Scanner};
use crate::trackers::{default_announce, resolve_announce};

/// Turns scan results into torrent creation requests
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    announce: Vec<String>,
    private: bool,
    comment: String,
    min_files: usize,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    /// Builder with the default trackers, public, no comment
    pub fn new() -> Self {
        Self {
            announce: default_announce(),
            private: false,
            comment: String::new(),
            min_files: MIN_LIBRARY_FILES,
        }
    }

    /// Set the trackers; an empty or unusable list keeps the defaults
    pub fn with_announce<S: AsRef<str>>(mut self, announce: &[S]) -> Self {
        self.announce = resolve_announce(announce);
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Minimum number of visible files a directory needs to become a torrent
    pub fn with_min_files(mut self, min_files: usize) -> Self {
        self.min_files = min_files.max(1);
        self
    }

    /// Requests for one scan entry.
    ///
    /// A file always yields one request. A directory yields one request for
    /// the files directly inside it, or nothing when it holds fewer than the
    /// minimum number of files.
    pub fn build(&self, entry: &ScanEntry) -> Vec<TorrentSpec> {
        match entry {
            ScanEntry::File(file) => vec![self.single_file(file.clone())],
            ScanEntry::Dir(dir) => self.directory(dir).into_iter().collect(),
        }
    }

    /// Requests for a list of entries, in the order given
    pub fn build_all(&self, entries: &[ScanEntry]) -> Vec<TorrentSpec> {
        entries.iter().flat_map(|entry| self.build(entry)).collect()
    }

    /// One request covering all of `files`, rooted at their deepest common
    /// ancestor. A lone file becomes a single-file torrent.
    pub fn from_files(&self, files: Vec<FileEntry>) -> Option<TorrentSpec> {
        let root = common_root(files.iter().map(|f| f.path.as_path()))?;
        Some(self.rooted_at(&root, files))
    }

    /// Recursively collect every visible file under the selection and build
    /// one request for it
    pub fn create_torrent<F: FileSystem>(
        &self,
        scanner: &Scanner<F>,
        paths: &[PathBuf],
    ) -> Result<TorrentSpec> {
        let root = common_root(paths.iter().map(PathBuf::as_path)).ok_or_else(|| {
            Error::InvalidInput {
                path: PathBuf::new(),
                reason: "nothing selected",
            }
        })?;
        if root.file_name().is_none() {
            return Err(Error::InvalidInput {
                path: root,
                reason: "selection has no common folder",
            });
        }

        let files = scanner.find_files(paths)?;
        if files.is_empty() {
            return Err(Error::InvalidInput {
                path: root,
                reason: "no visible files to seed",
            });
        }

        let spec = self.rooted_at(&root, files);
        info!(
            name = %spec.name,
            files = spec.files.len(),
            bytes = spec.total_size(),
            "assembled torrent request"
        );
        Ok(spec)
    }

    /// Find every directory holding files below `paths` and build one request
    /// per directory that has enough of them
    pub fn create_library<F: FileSystem>(
        &self,
        scanner: &Scanner<F>,
        paths: &[PathBuf],
    ) -> Result<Vec<TorrentSpec>> {
        let dirs = scanner.find_directories(paths)?;
        let listed: Vec<ScanEntry> = scanner
            .list_directories(&dirs)?
            .into_iter()
            .map(ScanEntry::Dir)
            .collect();

        let specs = self.build_all(&listed);
        info!(
            directories = dirs.len(),
            torrents = specs.len(),
            "assembled library requests"
        );
        Ok(specs)
    }

    fn single_file(&self, file: FileEntry) -> TorrentSpec {
        let base_path = parent_or_self(&file.path);
        self.spec(file.name.clone(), base_path, vec![file])
    }

    fn directory(&self, dir: &DirEntry) -> Option<TorrentSpec> {
        let files: Vec<FileEntry> = dir.files().cloned().collect();
        if files.len() < self.min_files {
            debug!(
                path = %dir.path.display(),
                files = files.len(),
                "skipping directory with too few files"
            );
            return None;
        }
        Some(self.spec(dir.name.clone(), parent_or_self(&dir.path), files))
    }

    fn rooted_at(&self, root: &Path, mut files: Vec<FileEntry>) -> TorrentSpec {
        if files.len() == 1 && files[0].path == root {
            if let Some(file) = files.pop() {
                return self.single_file(file);
            }
        }
        self.spec(base_name(root), parent_or_self(root), files)
    }

    fn spec(&self, name: String, base_path: PathBuf, files: Vec<FileEntry>) -> TorrentSpec {
        TorrentSpec {
            name,
            base_path,
            files,
            announce: self.announce.clone(),
            private: self.private,
            comment: self.comment.clone(),
        }
    }
}

fn parent_or_self(path: &Path) -> PathBuf {
    path.parent().unwrap_or(path).to_path_buf()
}

/// Longest shared component prefix; a single path is its own root
fn common_root<'a>(mut paths: impl Iterator<Item = &'a Path>) -> Option<PathBuf> {
    let mut root = paths.next()?.to_path_buf();
    for path in paths {
        while !path.starts_with(&root) {
            if !root.pop() {
                break;
            }
        }
    }
    Some(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trackers::DEFAULT_TRACKERS;

    fn file(path: &str, size: u64) -> ScanEntry {
        ScanEntry::File(FileEntry::new(path, size))
    }

    fn dir(path: &str, children: Vec<ScanEntry>) -> ScanEntry {
        ScanEntry::Dir(DirEntry::new(path, children))
    }

    #[test]
    fn test_directory_with_one_file_is_skipped() {
        let builder = RequestBuilder::new();
        let entry = dir("/music/single", vec![file("/music/single/a.mp3", 1)]);
        assert!(builder.build(&entry).is_empty());
    }

    #[test]
    fn test_directory_with_two_files_yields_one_request() {
        let builder = RequestBuilder::new();
        let entry = dir(
            "/music/album",
            vec![
                file("/music/album/01.mp3", 1),
                file("/music/album/02.mp3", 2),
                dir("/music/album/scans", vec![file("/music/album/scans/front.jpg", 9)]),
            ],
        );

        let specs = builder.build(&entry);
        assert_eq!(specs.len(), 1);
        let spec = &specs[0];
        assert_eq!(spec.name, "album");
        assert_eq!(spec.base_path, PathBuf::from("/music"));
        assert_eq!(spec.files.len(), 2);
        assert_eq!(spec.total_size(), 3);
        assert_eq!(spec.announce.len(), DEFAULT_TRACKERS.len());
        assert!(!spec.private);
        assert_eq!(spec.comment, "");
    }

    #[test]
    fn test_bare_file_yields_single_file_request() {
        let builder = RequestBuilder::new();
        let specs = builder.build(&file("/videos/talk.mp4", 100));
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "talk.mp4");
        assert_eq!(specs[0].base_path, PathBuf::from("/videos"));
        assert_eq!(specs[0].files, vec![FileEntry::new("/videos/talk.mp4", 100)]);
    }

    #[test]
    fn test_build_all_keeps_order() {
        let builder = RequestBuilder::new();
        let entries = vec![
            dir("/lib/a", vec![file("/lib/a/1", 1), file("/lib/a/2", 1)]),
            dir("/lib/b", vec![file("/lib/b/1", 1)]),
            dir("/lib/c", vec![file("/lib/c/1", 1), file("/lib/c/2", 1)]),
        ];
        let names: Vec<_> = builder
            .build_all(&entries)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_min_files_is_adjustable() {
        let builder = RequestBuilder::new().with_min_files(1);
        let entry = dir("/music/single", vec![file("/music/single/a.mp3", 1)]);
        assert_eq!(builder.build(&entry).len(), 1);

        let builder = RequestBuilder::new().with_min_files(0);
        assert!(builder.build(&dir("/empty", vec![])).is_empty());
    }

    #[test]
    fn test_metadata_overrides() {
        let builder = RequestBuilder::new()
            .with_announce(&["udp://tracker.example.org:6969"])
            .with_private(true)
            .with_comment("from the archive");
        let spec = &builder.build(&file("/a.txt", 1))[0];
        assert_eq!(spec.announce, vec!["udp://tracker.example.org:6969"]);
        assert!(spec.private);
        assert_eq!(spec.comment, "from the archive");
    }

    #[test]
    fn test_from_files_uses_common_root() {
        let builder = RequestBuilder::new();
        let spec = builder
            .from_files(vec![
                FileEntry::new("/data/show/s01/e01.mkv", 1),
                FileEntry::new("/data/show/s02/e01.mkv", 1),
            ])
            .unwrap();
        assert_eq!(spec.name, "show");
        assert_eq!(spec.base_path, PathBuf::from("/data"));

        let single = builder
            .from_files(vec![FileEntry::new("/data/show/s01/e01.mkv", 1)])
            .unwrap();
        assert_eq!(single.name, "e01.mkv");
        assert_eq!(single.base_path, PathBuf::from("/data/show/s01"));

        assert!(builder.from_files(Vec::new()).is_none());
    }

    #[test]
    fn test_common_root() {
        let paths = [Path::new("/a/b/c"), Path::new("/a/b/d/e"), Path::new("/a/bx")];
        assert_eq!(common_root(paths.into_iter()), Some(PathBuf::from("/a")));
        assert_eq!(
            common_root([Path::new("/a/b")].into_iter()),
            Some(PathBuf::from("/a/b"))
        );
        assert_eq!(common_root(std::iter::empty()), None);
    }

    #[test]
    fn test_serialized_field_names() {
        let spec = &RequestBuilder::new().build(&file("/videos/talk.mp4", 100))[0];
        let json = serde_json::to_value(spec).unwrap();
        assert_eq!(json["name"], "talk.mp4");
        assert_eq!(json["path"], "/videos");
        assert_eq!(json["private"], false);
        assert_eq!(json["comment"], "");
        assert_eq!(json["files"][0]["size"], 100);
        assert_eq!(json["announce"][0], "udp://exodus.desync.com:6969");
    }
}
