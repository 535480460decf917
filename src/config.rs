use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Message names with this prefix cross between the primary and worker processes
pub const RELAY_PREFIX: &str = "wt-";

/// How long shutdown waits for the saved-state acknowledgment
pub const DEFAULT_SAVE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Upper bound of the derived default cap on concurrent stat/list calls
pub const DEFAULT_MAX_IN_FLIGHT: usize = 128;

/// Hard ceiling for the in-flight cap, whatever the configuration says
pub const MAX_IN_FLIGHT_LIMIT: usize = 512;

/// A directory needs at least this many visible files to become a torrent
/// during a library import. Single-file directories are skipped because the
/// engine does not seed them reliably yet.
pub const MIN_LIBRARY_FILES: usize = 2;

const CONFIG_FILE: &str = "config.toml";

/// Settings read from `config.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Tracker URLs; empty means the built-in default list
    pub announce: Vec<String>,
    pub private: bool,
    pub comment: String,
    /// Glob patterns for entry names to leave out of scans
    pub exclude: Vec<String>,
    pub save_timeout_ms: u64,
    /// Cap on concurrent filesystem calls; derived from the CPU count if unset
    pub max_in_flight: Option<usize>,
    pub min_library_files: usize,
    pub profiles: BTreeMap<String, Profile>,
}

/// Named override set, selected with `--profile`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub announce: Option<Vec<String>>,
    pub private: Option<bool>,
    pub comment: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            announce: Vec::new(),
            private: false,
            comment: String::new(),
            exclude: Vec::new(),
            save_timeout_ms: DEFAULT_SAVE_TIMEOUT.as_millis() as u64,
            max_in_flight: None,
            min_library_files: MIN_LIBRARY_FILES,
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Location of the per-user configuration file
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "seedkit").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load an explicit file, or the per-user file if it exists.
    ///
    /// A missing per-user file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content).map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.message().to_string())
    }

    /// Apply a named profile on top of the top-level settings
    pub fn apply_profile(&mut self, name: &str) -> Result<()> {
        let profile = self
            .profiles
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Config {
                path: Self::default_path().unwrap_or_else(|| PathBuf::from(CONFIG_FILE)),
                message: format!("unknown profile '{}'", name),
            })?;

        if let Some(announce) = profile.announce {
            self.announce = announce;
        }
        if let Some(private) = profile.private {
            self.private = private;
        }
        if let Some(comment) = profile.comment {
            self.comment = comment;
        }
        Ok(())
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }
}
