//! In-process broadcast used to nudge sibling surfaces after a mutation.

use crate::job::ports::SignalMessage;
use tokio::sync::broadcast;

/// Default number of buffered signals per listener.
const DEFAULT_CAPACITY: usize = 16;

/// Cloneable sender for [`SignalMessage`]s.
///
/// Listeners that lag behind lose old signals. Every signal means the same
/// thing: re-fetch.
#[derive(Debug, Clone)]
pub struct JobSignal {
    sender: broadcast::Sender<SignalMessage>,
}

impl Default for JobSignal {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl JobSignal {
    /// Creates a signal channel buffering `capacity` messages per listener.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Announces that a job changed. Returns how many listeners were
    /// reached.
    #[must_use]
    pub fn job_updated(&self) -> usize {
        self.sender.send(SignalMessage::JobUpdated).unwrap_or(0)
    }

    /// Registers a new listener.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SignalMessage> {
        self.sender.subscribe()
    }

    /// Returns the number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
