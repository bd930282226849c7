//! Change-feed port: push notification of row-level job changes.

use crate::job::domain::{Job, JobId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Result type for change-feed operations.
pub type ChangeFeedResult<T> = Result<T, ChangeFeedError>;

/// Identifier payload carried by delete events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedJob {
    /// Identifier of the removed row.
    pub id: JobId,
}

/// A single row-level change on the `jobs` table.
///
/// Wire shape: `{"eventType": "INSERT" | "UPDATE" | "DELETE", "new"?: Job,
/// "old"?: {"id": ..}}`. Fields that do not apply to a variant are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    /// A row was inserted.
    Insert {
        /// The inserted row.
        new: Job,
    },
    /// A row was updated.
    Update {
        /// The row after the update.
        new: Job,
    },
    /// A row was deleted.
    Delete {
        /// Identity of the deleted row.
        old: DeletedJob,
    },
}

impl ChangeEvent {
    /// Returns the identifier of the affected row.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        match self {
            Self::Insert { new } | Self::Update { new } => new.id(),
            Self::Delete { old } => old.id,
        }
    }

    /// Returns the wire name of the event type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "INSERT",
            Self::Update { .. } => "UPDATE",
            Self::Delete { .. } => "DELETE",
        }
    }
}

/// Lifecycle notifications for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// The handshake completed; changes will now be delivered.
    Subscribed,
    /// The handshake did not complete in time.
    TimedOut,
    /// The channel reported an error.
    ChannelError,
    /// The channel was closed.
    Closed,
}

impl SubscriptionStatus {
    /// Returns `true` for statuses that end the subscription.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        !matches!(self, Self::Subscribed)
    }
}

/// Item delivered on a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    /// Subscription lifecycle update.
    Status(SubscriptionStatus),
    /// Row-level change.
    Change(ChangeEvent),
}

/// Receiving half of an open change-feed subscription.
///
/// Dropping the value closes the subscription.
#[derive(Debug)]
pub struct JobSubscription {
    receiver: mpsc::Receiver<FeedMessage>,
}

impl JobSubscription {
    /// Wraps the receiving end of a feed channel.
    #[must_use]
    pub const fn new(receiver: mpsc::Receiver<FeedMessage>) -> Self {
        Self { receiver }
    }

    /// Waits for the next message.
    ///
    /// A closed channel is reported as [`SubscriptionStatus::Closed`] once;
    /// the caller is expected to drop the subscription afterwards.
    pub async fn next(&mut self) -> FeedMessage {
        self.receiver
            .recv()
            .await
            .unwrap_or(FeedMessage::Status(SubscriptionStatus::Closed))
    }
}

/// Errors returned while opening a subscription.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChangeFeedError {
    /// The realtime service could not be reached.
    #[error("change feed unavailable: {0}")]
    Unavailable(String),
}

/// Push-based change notification contract.
#[async_trait]
pub trait JobChangeFeed: Send + Sync {
    /// Opens a new subscription to the `jobs` table.
    ///
    /// The first message on a healthy subscription is
    /// [`SubscriptionStatus::Subscribed`].
    ///
    /// # Errors
    ///
    /// Returns [`ChangeFeedError::Unavailable`] when the subscription cannot
    /// be opened at all.
    async fn subscribe(&self) -> ChangeFeedResult<JobSubscription>;
}
