use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

use crate::config::RELAY_PREFIX;

/// Which process a channel talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The long-lived process owning the UI
    Primary,
    /// The lazily started process running the torrent engine
    Worker,
}

impl Role {
    pub fn opposite(self) -> Self {
        match self {
            Self::Primary => Self::Worker,
            Self::Worker => Self::Primary,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Worker => f.write_str("worker"),
        }
    }
}

/// Message names the core knows about, parsed once at the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageName {
    /// One-shot readiness signal of a channel
    Ready(Role),
    CreateTorrent,
    StartTorrenting,
    StopTorrenting,
    SelectFiles,
    /// Any other cross-process name
    Relay(String),
    SaveState,
    SavedState,
    Error,
    /// Handled by the local handler table
    Local(String),
}

impl MessageName {
    pub fn parse(name: &str) -> Self {
        match name {
            "primaryReady" | "ipcReady" => Self::Ready(Role::Primary),
            "workerReady" | "ipcReadyWebTorrent" => Self::Ready(Role::Worker),
            "wt-create-torrent" => Self::CreateTorrent,
            "wt-start-torrenting" => Self::StartTorrenting,
            "wt-stop-torrenting" => Self::StopTorrenting,
            "wt-select-files" => Self::SelectFiles,
            "saveState" => Self::SaveState,
            "savedState" => Self::SavedState,
            "error" => Self::Error,
            other if other.starts_with(RELAY_PREFIX) => Self::Relay(other.to_string()),
            other => Self::Local(other.to_string()),
        }
    }

    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Self::Ready(Role::Primary) => "primaryReady".into(),
            Self::Ready(Role::Worker) => "workerReady".into(),
            Self::CreateTorrent => "wt-create-torrent".into(),
            Self::StartTorrenting => "wt-start-torrenting".into(),
            Self::StopTorrenting => "wt-stop-torrenting".into(),
            Self::SelectFiles => "wt-select-files".into(),
            Self::SaveState => "saveState".into(),
            Self::SavedState => "savedState".into(),
            Self::Error => "error".into(),
            Self::Relay(name) | Self::Local(name) => Cow::Borrowed(name),
        }
    }

    /// Whether messages with this name cross to the other process
    pub fn is_relay(&self) -> bool {
        matches!(
            self,
            Self::CreateTorrent
                | Self::StartTorrenting
                | Self::StopTorrenting
                | Self::SelectFiles
                | Self::Relay(_)
        )
    }
}

impl fmt::Display for MessageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// A named message with opaque arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    name: MessageName,
    args: Vec<Value>,
}

impl Message {
    pub fn new(name: MessageName, args: Vec<Value>) -> Self {
        Self { name, args }
    }

    pub fn name(&self) -> &MessageName {
        &self.name
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn into_parts(self) -> (MessageName, Vec<Value>) {
        (self.name, self.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!(MessageName::parse("workerReady"), MessageName::Ready(Role::Worker));
        assert_eq!(
            MessageName::parse("ipcReadyWebTorrent"),
            MessageName::Ready(Role::Worker)
        );
        assert_eq!(MessageName::parse("ipcReady"), MessageName::Ready(Role::Primary));
        assert_eq!(MessageName::parse("wt-create-torrent"), MessageName::CreateTorrent);
        assert_eq!(
            MessageName::parse("wt-progress"),
            MessageName::Relay("wt-progress".into())
        );
        assert_eq!(
            MessageName::parse("setTitle"),
            MessageName::Local("setTitle".into())
        );
    }

    #[test]
    fn test_relay_namespace() {
        assert!(MessageName::parse("wt-select-files").is_relay());
        assert!(MessageName::parse("wt-anything").is_relay());
        assert!(!MessageName::parse("saveState").is_relay());
        assert!(!MessageName::parse("workerReady").is_relay());
    }

    #[test]
    fn test_name_round_trips_through_str() {
        for name in ["primaryReady", "wt-stop-torrenting", "savedState", "wt-x", "show"] {
            assert_eq!(MessageName::parse(name).as_str(), name);
        }
    }
}
