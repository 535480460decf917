mod entry;
mod file;
mod torrent;

pub use entry::{DirEntry, ScanEntry};
pub use file::FileEntry;
pub(crate) use file::base_name;
pub use torrent::TorrentSpec;
