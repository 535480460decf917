use glob::Pattern;
use rayon::prelude::*;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{DEFAULT_MAX_IN_FLIGHT, MAX_IN_FLIGHT_LIMIT};
use crate::error::{Error, Result};
use crate::models::{DirEntry, FileEntry, ScanEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Sockets, fifos, devices
    Other,
}

/// What a stat call reports about one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub kind: EntryKind,
    pub size: u64,
}

/// The filesystem calls a scan is made of.
///
/// Both calls may block; the scanner issues them from its worker pool.
pub trait FileSystem: Send + Sync {
    /// Stat `path`, following symlinks
    fn stat(&self, path: &Path) -> io::Result<Stat>;

    /// Names of the entries directly inside `dir`, in no particular order
    fn list(&self, dir: &Path) -> io::Result<Vec<OsString>>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn stat(&self, path: &Path) -> io::Result<Stat> {
        let metadata = std::fs::metadata(path)?;
        let kind = if metadata.is_file() {
            EntryKind::File
        } else if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        };
        Ok(Stat {
            kind,
            size: metadata.len(),
        })
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<OsString>> {
        std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect()
    }
}

/// Default cap on concurrent filesystem calls for this machine
pub fn default_max_in_flight() -> usize {
    (num_cpus::get() * 8).clamp(16, DEFAULT_MAX_IN_FLIGHT)
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Maximum number of stat/list calls running at once
    pub max_in_flight: usize,
    /// Glob patterns matched against entry names
    pub exclude: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            exclude: Vec::new(),
        }
    }
}

/// Parallel directory walker.
///
/// Every level fans out over its children, waits for all of them and sorts
/// the results by path, so the output never depends on which call finished
/// first. The first failing call aborts the whole scan.
pub struct Scanner<F = LocalFs> {
    fs: F,
    pool: rayon::ThreadPool,
    exclude: Vec<Pattern>,
}

impl Scanner<LocalFs> {
    pub fn local(options: &ScanOptions) -> Result<Self> {
        Self::new(LocalFs, options)
    }
}

impl<F: FileSystem> Scanner<F> {
    pub fn new(fs: F, options: &ScanOptions) -> Result<Self> {
        let threads = options.max_in_flight.clamp(1, MAX_IN_FLIGHT_LIMIT);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("seedkit-scan-{}", i))
            .build()?;

        let mut exclude = Vec::new();
        for pattern_str in &options.exclude {
            match Pattern::new(pattern_str) {
                Ok(p) => exclude.push(p),
                Err(e) => warn!(pattern = %pattern_str, error = %e, "ignoring invalid exclude pattern"),
            }
        }

        Ok(Self { fs, pool, exclude })
    }

    /// Scan every path into a forest sorted by path.
    ///
    /// Files become [`ScanEntry::File`]; directories are walked recursively.
    pub fn scan(&self, paths: &[PathBuf]) -> Result<Vec<ScanEntry>> {
        let mut entries = self.pool.install(|| {
            paths
                .par_iter()
                .map(|path| self.scan_root(path))
                .collect::<Result<Vec<_>>>()
        })?;
        sort_entries(&mut entries);
        debug!(roots = entries.len(), "scan complete");
        Ok(entries)
    }

    /// Every visible file below `paths`, sorted by path. A file reached
    /// through overlapping selections is listed once.
    pub fn find_files(&self, paths: &[PathBuf]) -> Result<Vec<FileEntry>> {
        let mut files = Vec::new();
        for entry in self.scan(paths)? {
            entry.collect_files(&mut files);
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        Ok(files)
    }

    /// Every directory below `paths`, at any depth, that directly holds at
    /// least one visible file. Selected files contribute nothing.
    pub fn find_directories(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in self.scan(paths)? {
            entry.collect_directories(&mut dirs);
        }
        dirs.sort();
        dirs.dedup();
        Ok(dirs)
    }

    /// Visible files directly inside `dir`, without descending into
    /// subdirectories
    pub fn files_in_dir(&self, dir: &Path) -> Result<Vec<FileEntry>> {
        self.pool.install(|| self.flat_files(dir))
    }

    /// Flat listing of several directories at once; each result holds only
    /// the files of its directory
    pub fn list_directories(&self, dirs: &[PathBuf]) -> Result<Vec<DirEntry>> {
        let mut listed = self.pool.install(|| {
            dirs.par_iter()
                .map(|dir| -> Result<DirEntry> {
                    let files = self.flat_files(dir)?;
                    let children = files.into_iter().map(ScanEntry::File).collect();
                    Ok(DirEntry::new(dir.clone(), children))
                })
                .collect::<Result<Vec<_>>>()
        })?;
        listed.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(listed)
    }

    fn flat_files(&self, dir: &Path) -> Result<Vec<FileEntry>> {
        let stat = self.stat_root(dir)?;
        if stat.kind != EntryKind::Directory {
            return Err(Error::InvalidInput {
                path: dir.to_path_buf(),
                reason: "not a directory",
            });
        }

        let children = self.visible_children(dir)?;
        let mut files = children
            .par_iter()
            .map(|path| -> Result<Option<FileEntry>> {
                let stat = self.fs.stat(path).map_err(|e| Error::io(path, e))?;
                Ok((stat.kind == EntryKind::File).then(|| FileEntry::new(path.clone(), stat.size)))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Stat a user-selected path; a missing path is bad input rather than
    /// an I/O failure
    fn stat_root(&self, path: &Path) -> Result<Stat> {
        self.fs.stat(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::InvalidInput {
                path: path.to_path_buf(),
                reason: "no such file or directory",
            },
            _ => Error::io(path, e),
        })
    }

    fn scan_root(&self, path: &Path) -> Result<ScanEntry> {
        let stat = self.stat_root(path)?;
        match stat.kind {
            EntryKind::File => Ok(ScanEntry::File(FileEntry::new(path, stat.size))),
            EntryKind::Directory => self.scan_dir(path),
            EntryKind::Other => Err(Error::InvalidInput {
                path: path.to_path_buf(),
                reason: "not a file or directory",
            }),
        }
    }

    fn scan_child(&self, path: &Path) -> Result<Option<ScanEntry>> {
        let stat = self.fs.stat(path).map_err(|e| Error::io(path, e))?;
        match stat.kind {
            EntryKind::File => Ok(Some(ScanEntry::File(FileEntry::new(path, stat.size)))),
            EntryKind::Directory => self.scan_dir(path).map(Some),
            EntryKind::Other => {
                debug!(path = %path.display(), "skipping special file");
                Ok(None)
            }
        }
    }

    fn scan_dir(&self, dir: &Path) -> Result<ScanEntry> {
        let children = self.visible_children(dir)?;
        let mut entries = children
            .par_iter()
            .map(|path| self.scan_child(path))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        sort_entries(&mut entries);
        Ok(ScanEntry::Dir(DirEntry::new(dir, entries)))
    }

    fn visible_children(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let names = self.fs.list(dir).map_err(|e| Error::io(dir, e))?;
        Ok(names
            .into_iter()
            .filter(|name| !self.is_excluded(name))
            .map(|name| dir.join(name))
            .collect())
    }

    fn is_excluded(&self, name: &OsStr) -> bool {
        if is_hidden(name) {
            return true;
        }
        if self.exclude.is_empty() {
            return false;
        }
        let name = name.to_string_lossy();
        self.exclude.iter().any(|p| p.matches(&name))
    }
}

/// Dotfiles and empty names never show up in scan results
fn is_hidden(name: &OsStr) -> bool {
    matches!(name.as_encoded_bytes().first(), None | Some(b'.'))
}

fn sort_entries(entries: &mut [ScanEntry]) {
    entries.sort_by(|a, b| a.path().cmp(b.path()));
}
