use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::bus::{Message, MessageBus, MessageName, Role};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    QuittingPendingSave,
    Terminated,
}

/// How a shutdown ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The UI confirmed it saved its state
    Saved,
    /// No confirmation within the timeout
    Abandoned,
}

/// Runs the quit sequence: ask the UI to save, wait a bounded time for the
/// confirmation, then terminate either way.
pub struct LifecycleCoordinator {
    bus: Arc<MessageBus>,
    timeout: Duration,
    state: Mutex<LifecycleState>,
    ack_tx: Sender<()>,
    ack_rx: Receiver<()>,
}

impl LifecycleCoordinator {
    pub fn new(bus: Arc<MessageBus>, timeout: Duration) -> Self {
        let (ack_tx, ack_rx) = bounded(1);
        Self {
            bus,
            timeout,
            state: Mutex::new(LifecycleState::Running),
            ack_tx,
            ack_rx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> LifecycleState {
        *self.lock()
    }

    /// Quit, blocking until the state is saved or the timeout runs out.
    ///
    /// Returns `None` if a shutdown is already under way or done.
    pub fn request_shutdown(&self) -> Option<ShutdownOutcome> {
        {
            let mut state = self.lock();
            if *state != LifecycleState::Running {
                debug!(state = ?*state, "ignoring repeated shutdown request");
                return None;
            }
            *state = LifecycleState::QuittingPendingSave;
        }

        self.bus.begin_shutdown();
        self.bus
            .send(Role::Primary, Message::new(MessageName::SaveState, Vec::new()));

        let outcome = match self.ack_rx.recv_timeout(self.timeout) {
            Ok(()) => {
                info!("state saved, quitting");
                ShutdownOutcome::Saved
            }
            Err(_) => {
                warn!("{}. Quitting.", Error::Timeout(self.timeout));
                ShutdownOutcome::Abandoned
            }
        };

        *self.lock() = LifecycleState::Terminated;
        Some(outcome)
    }

    /// Record the saved-state confirmation. Only counts while a shutdown is
    /// waiting for it.
    pub fn acknowledge(&self) -> bool {
        let state = self.lock();
        if *state != LifecycleState::QuittingPendingSave {
            debug!(state = ?*state, "ignoring saved-state confirmation");
            return false;
        }
        // A full slot already holds a confirmation.
        let _ = self.ack_tx.try_send(());
        true
    }

    /// Feed a locally routed message; returns whether it was the confirmation
    pub fn handle(&self, message: &Message) -> bool {
        *message.name() == MessageName::SavedState && self.acknowledge()
    }
}
