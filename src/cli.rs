use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::builder::RequestBuilder;
use crate::config::Config;
use crate::scanner::{ScanOptions, default_max_in_flight};

#[derive(Parser, Debug)]
#[command(
    name = "seedkit",
    version,
    about = "Build torrent creation requests from files and folders and hand them to the seeding engine",
    author = "seedkit contributors"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Announce URL(s) - can be specified multiple times or comma-separated
    #[arg(short = 'a', long = "announce", value_name = "URL", global = true)]
    pub announce: Vec<String>,

    /// Add a comment to the torrents
    #[arg(short = 'c', long = "comment", value_name = "COMMENT", global = true)]
    pub comment: Option<String>,

    /// Set the private flag
    #[arg(short = 'p', long = "private", global = true)]
    pub private: bool,

    /// Exclude entries whose name matches a glob pattern
    #[arg(
        short = 'e',
        long = "exclude",
        value_name = "PATTERN",
        value_delimiter = ',',
        global = true
    )]
    pub exclude: Vec<String>,

    /// Use the named profile from the configuration file
    #[arg(long = "profile", value_name = "NAME", global = true)]
    pub profile: Option<String>,

    /// Read configuration from this file instead of the per-user one
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Maximum number of concurrent filesystem calls while scanning
    #[arg(short = 't', long = "threads", value_name = "N", global = true)]
    pub threads: Option<usize>,

    /// Print results as JSON on stdout
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create one torrent from the selected files and folders
    Create {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Create one torrent per folder holding at least two files, at any depth
    Library {
        #[arg(value_name = "DIR", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the scanned tree without creating anything
    Scan {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
}

impl Command {
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Self::Create { paths } | Self::Library { paths } | Self::Scan { paths } => paths,
        }
    }
}

impl Args {
    /// Request builder with flags taking precedence over the configuration
    pub fn request_builder(&self, config: &Config) -> RequestBuilder {
        let announce: &[String] = if self.announce.is_empty() {
            &config.announce
        } else {
            &self.announce
        };
        let comment = self.comment.clone().unwrap_or_else(|| config.comment.clone());

        RequestBuilder::new()
            .with_announce(announce)
            .with_private(self.private || config.private)
            .with_comment(comment)
            .with_min_files(config.min_library_files)
    }

    pub fn scan_options(&self, config: &Config) -> ScanOptions {
        let mut exclude = config.exclude.clone();
        exclude.extend(self.exclude.iter().cloned());

        ScanOptions {
            max_in_flight: self
                .threads
                .or(config.max_in_flight)
                .unwrap_or_else(default_max_in_flight),
            exclude,
        }
    }
}

/// Expand `~` and make every selected path absolute
pub fn expand_paths(paths: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    paths
        .iter()
        .map(|path| {
            let raw = path.to_string_lossy();
            let expanded = PathBuf::from(shellexpand::tilde(&raw).into_owned());
            std::path::absolute(expanded)
        })
        .collect()
}
