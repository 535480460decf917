use crossbeam_channel::Sender;

use super::message::Message;

/// Where a channel delivers its messages.
///
/// Delivery is fire-and-forget: an endpoint whose peer has gone away just
/// drops what it is given.
pub trait Endpoint: Send + Sync {
    fn deliver(&self, message: Message);
}

impl Endpoint for Sender<Message> {
    fn deliver(&self, message: Message) {
        // The receiving side hung up; nothing left to tell.
        let _ = self.send(message);
    }
}
