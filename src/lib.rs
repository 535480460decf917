//! # seedkit
//!
//! Core of a seeding desktop client: the pieces that are not window chrome.
//!
//! - [`bus`] relays messages between the primary (UI) process and the worker
//!   (engine) process, queueing them until the destination is ready.
//! - [`scanner`] walks selected files and folders in parallel and returns
//!   deterministic, sorted trees.
//! - [`builder`] turns scan results into torrent creation requests.
//! - [`lifecycle`] runs the save-then-quit sequence with a bounded wait.
//!
//! ## Example
//!
//! ```no_run
//! use seedkit::{RequestBuilder, Scanner};
//! use seedkit::scanner::ScanOptions;
//! use std::path::PathBuf;
//!
//! let scanner = Scanner::local(&ScanOptions::default()).unwrap();
//! let specs = RequestBuilder::new()
//!     .create_library(&scanner, &[PathBuf::from("/srv/music")])
//!     .unwrap();
//! ```

pub mod builder;
pub mod bus;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod scanner;
pub mod trackers;

// Re-export main types for convenience
pub use builder::RequestBuilder;
pub use bus::{Message, MessageBus, MessageName, Role, Routed};
pub use controller::TorrentListController;
pub use error::{Error, ErrorEvent, ErrorKind, Result};
pub use lifecycle::{LifecycleCoordinator, LifecycleState, ShutdownOutcome};
pub use models::{DirEntry, FileEntry, ScanEntry, TorrentSpec};
pub use scanner::Scanner;
