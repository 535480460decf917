//! Readiness-gated message relay between the primary and worker processes.
//!
//! Each side owns a [`Channel`]. Until a channel is marked ready, messages
//! addressed to it wait in a FIFO queue; marking it ready flushes that queue
//! once, in order, and every later message goes straight to the endpoint.

mod endpoint;
mod message;

pub use endpoint::Endpoint;
pub use message::{Message, MessageName, Role};

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Pending,
    /// The queue is being drained; new messages still go to the queue
    Flushing,
    Ready,
}

struct ChannelState {
    readiness: Readiness,
    outbound: VecDeque<Message>,
}

struct Channel {
    role: Role,
    state: Mutex<ChannelState>,
    endpoint: Box<dyn Endpoint>,
}

impl Channel {
    fn new(role: Role, endpoint: Box<dyn Endpoint>) -> Self {
        Self {
            role,
            state: Mutex::new(ChannelState {
                readiness: Readiness::Pending,
                outbound: VecDeque::new(),
            }),
            endpoint,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChannelState> {
        // Queue contents stay consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, message: Message) {
        let mut state = self.lock();
        if state.readiness == Readiness::Ready {
            drop(state);
            debug!(channel = %self.role, name = %message.name(), "sent");
            self.endpoint.deliver(message);
        } else {
            debug!(channel = %self.role, name = %message.name(), "queueing");
            state.outbound.push_back(message);
        }
    }

    fn mark_ready(&self) -> bool {
        {
            let mut state = self.lock();
            if state.readiness != Readiness::Pending {
                return false;
            }
            state.readiness = Readiness::Flushing;
            debug!(
                channel = %self.role,
                queued = state.outbound.len(),
                "channel ready, flushing queued messages"
            );
        }

        // The lock is released around each delivery so an endpoint may send
        // again; such messages land behind the ones already queued.
        let mut flushed = 0usize;
        loop {
            let next = {
                let mut state = self.lock();
                match state.outbound.pop_front() {
                    Some(message) => message,
                    None => {
                        state.readiness = Readiness::Ready;
                        break;
                    }
                }
            };
            debug!(channel = %self.role, name = %next.name(), "sent queued");
            self.endpoint.deliver(next);
            flushed += 1;
        }
        debug!(channel = %self.role, flushed, "flush complete");
        true
    }
}

/// Where [`MessageBus::relay`] sent a message
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Handed to the channel of the given role
    Forwarded(Role),
    /// A readiness signal that was applied to the given channel
    Ready(Role),
    /// Not cross-process traffic; the caller's own handlers deal with it
    Local(Message),
}

/// Message bus shared by everything in one process.
///
/// Construct once and pass around behind an `Arc`.
pub struct MessageBus {
    primary: Channel,
    worker: Channel,
    closing: AtomicBool,
}

impl MessageBus {
    pub fn new(primary: impl Endpoint + 'static, worker: impl Endpoint + 'static) -> Self {
        Self {
            primary: Channel::new(Role::Primary, Box::new(primary)),
            worker: Channel::new(Role::Worker, Box::new(worker)),
            closing: AtomicBool::new(false),
        }
    }

    fn channel(&self, role: Role) -> &Channel {
        match role {
            Role::Primary => &self.primary,
            Role::Worker => &self.worker,
        }
    }

    /// Deliver `message` to `role` now, or queue it until the channel is ready
    pub fn send(&self, role: Role, message: Message) {
        self.channel(role).send(message);
    }

    /// Flush the queue of `role` and latch it ready.
    ///
    /// Returns `false` without doing anything if the channel was already
    /// marked ready.
    pub fn mark_ready(&self, role: Role) -> bool {
        self.channel(role).mark_ready()
    }

    pub fn is_ready(&self, role: Role) -> bool {
        self.channel(role).lock().readiness == Readiness::Ready
    }

    /// Number of messages waiting for `role` to become ready
    pub fn queued(&self, role: Role) -> usize {
        self.channel(role).lock().outbound.len()
    }

    /// Route a message that arrived from `source`.
    ///
    /// Names in the relay namespace go to the opposite channel; everything
    /// else is returned for local handling. Once shutdown has begun relay
    /// traffic is no longer forwarded and comes back as local too.
    pub fn relay(&self, name: &str, args: Vec<Value>, source: Role) -> Routed {
        let name = MessageName::parse(name);
        let message = Message::new(name, args);
        if message.name().is_relay() && !self.is_closing() {
            let destination = source.opposite();
            debug!(from = %source, to = %destination, name = %message.name(), "relaying");
            self.send(destination, message);
            Routed::Forwarded(destination)
        } else {
            Routed::Local(message)
        }
    }

    /// Entry point for everything a process receives: readiness signals are
    /// applied, the rest goes through [`MessageBus::relay`].
    pub fn receive(&self, name: &str, args: Vec<Value>, source: Role) -> Routed {
        match MessageName::parse(name) {
            MessageName::Ready(role) => {
                self.mark_ready(role);
                Routed::Ready(role)
            }
            _ => self.relay(name, args, source),
        }
    }

    /// Stop forwarding relay traffic; called when the application starts quitting
    pub fn begin_shutdown(&self) {
        self.closing.store(true, Ordering::SeqCst);
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }
}
