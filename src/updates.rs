use rocket::tokio::sync::broadcast::{channel, Receiver, Sender};

/// Capacity of the update channel. A subscriber that falls further behind
/// than this skips straight to the next snapshot, which is self-contained.
const CHANNEL_CAPACITY: usize = 16;

/// In-process change notification for the question store. Every successful
/// mutation publishes one unit; each live subscriber reacts by re-reading
/// the full question list and emitting it as a fresh snapshot.
pub struct UpdateBus {
    sender: Sender<()>,
}

impl UpdateBus {
    pub fn new() -> Self {
        let (sender, _) = channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Notify all subscribers that the question list changed.
    /// Publishing with no live subscribers is not an error.
    pub fn publish(&self) {
        let _ = self.sender.send(());
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> Receiver<()> {
        self.sender.subscribe()
    }
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new()
    }
}
