use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error};

use crate::bus::{Message, MessageBus, MessageName, Role, Routed};
use crate::error::{Error, Result};
use crate::models::TorrentSpec;

/// Primary-side entry point for torrent creation: hands requests to the
/// engine through the bus and reports failures to the UI.
pub struct TorrentListController {
    bus: Arc<MessageBus>,
    next_key: AtomicU64,
}

impl TorrentListController {
    pub fn new(bus: Arc<MessageBus>) -> Self {
        Self {
            bus,
            next_key: AtomicU64::new(1),
        }
    }

    /// Ask the engine to create and seed `spec`; returns the torrent key
    /// the engine will refer to it by
    pub fn create_torrent(&self, spec: &TorrentSpec) -> Result<u64> {
        let spec_value = serde_json::to_value(spec)?;
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        let name = MessageName::CreateTorrent.as_str().into_owned();

        match self.bus.relay(&name, vec![json!(key), spec_value], Role::Primary) {
            Routed::Forwarded(_) => debug!(key, name = %spec.name, "requested torrent creation"),
            _ => debug!(key, name = %spec.name, "not forwarded, application is quitting"),
        }
        Ok(key)
    }

    pub fn create_torrents(&self, specs: &[TorrentSpec]) -> Result<Vec<u64>> {
        specs.iter().map(|spec| self.create_torrent(spec)).collect()
    }

    /// Surface `err` once on the primary side
    pub fn report_error(&self, err: &Error) {
        error!("{}", err);
        let event = serde_json::to_value(err.to_event()).unwrap_or(Value::Null);
        self.bus
            .send(Role::Primary, Message::new(MessageName::Error, vec![event]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RequestBuilder;
    use crate::models::{FileEntry, ScanEntry};
    use crossbeam_channel::unbounded;
    use std::path::PathBuf;

    #[test]
    fn test_creation_requests_get_increasing_keys() {
        let (primary_tx, _primary_rx) = unbounded();
        let (worker_tx, worker_rx) = unbounded();
        let bus = Arc::new(MessageBus::new(primary_tx, worker_tx));
        let controller = TorrentListController::new(Arc::clone(&bus));

        let spec = RequestBuilder::new()
            .build(&ScanEntry::File(FileEntry::new("/videos/talk.mp4", 10)))
            .remove(0);
        assert_eq!(controller.create_torrents(&[spec.clone(), spec]).unwrap(), vec![1, 2]);

        // Worker not ready yet
        assert!(worker_rx.try_recv().is_err());
        bus.mark_ready(Role::Worker);

        let first = worker_rx.try_recv().unwrap();
        assert_eq!(first.name(), &MessageName::CreateTorrent);
        assert_eq!(first.args()[0], json!(1));
        assert_eq!(first.args()[1]["name"], "talk.mp4");
        assert_eq!(worker_rx.try_recv().unwrap().args()[0], json!(2));
    }

    #[test]
    fn test_report_error_sends_event_to_primary() {
        let (primary_tx, primary_rx) = unbounded();
        let (worker_tx, _worker_rx) = unbounded();
        let bus = Arc::new(MessageBus::new(primary_tx, worker_tx));
        bus.mark_ready(Role::Primary);
        let controller = TorrentListController::new(bus);

        controller.report_error(&Error::InvalidInput {
            path: PathBuf::from("/missing"),
            reason: "no such file or directory",
        });

        let message = primary_rx.try_recv().unwrap();
        assert_eq!(message.name(), &MessageName::Error);
        assert_eq!(message.args()[0]["kind"], "invalid_input");
        assert_eq!(message.args()[0]["path"], "/missing");
    }
}
