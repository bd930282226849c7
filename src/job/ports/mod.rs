//! Port contracts for job persistence and change notification.
//!
//! Ports define infrastructure-agnostic interfaces used by job services and
//! the display synchronizer.

pub mod change_feed;
pub mod repository;
pub mod signal;

pub use change_feed::{
    ChangeEvent, ChangeFeedError, ChangeFeedResult, DeletedJob, FeedMessage, JobChangeFeed,
    JobSubscription, SubscriptionStatus,
};
pub use repository::{JobRepository, JobRepositoryError, JobRepositoryResult};
#[cfg(test)]
pub use repository::MockJobRepository;
pub use signal::SignalMessage;
