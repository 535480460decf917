use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A stat or directory listing failed
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A selected path does not exist or is neither a file nor a directory
    #[error("Invalid path {}: {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: &'static str },

    /// The saved-state acknowledgment did not arrive in time
    #[error("Saving state took longer than {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Failed to encode message: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to start scan workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Io,
    InvalidInput,
    Timeout,
    Config,
    Internal,
}

/// Error notification handed to whatever surface displays errors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEvent {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Config { .. } => ErrorKind::Config,
            Self::Serialization(_) | Self::ThreadPool(_) => ErrorKind::Internal,
        }
    }

    /// The path the error is about, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Io { path, .. } | Self::InvalidInput { path, .. } | Self::Config { path, .. } => {
                Some(path)
            }
            Self::Timeout(_) | Self::Serialization(_) | Self::ThreadPool(_) => None,
        }
    }

    pub fn to_event(&self) -> ErrorEvent {
        ErrorEvent {
            kind: self.kind(),
            path: self.path().map(|p| p.display().to_string()),
            message: self.to_string(),
        }
    }
}
