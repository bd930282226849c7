//! In-memory job store with a built-in change feed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;
use tracing::debug;

use crate::job::{
    domain::{Job, JobId, JobNumber, JobUpdate},
    ports::{
        ChangeEvent, ChangeFeedError, ChangeFeedResult, DeletedJob, FeedMessage, JobChangeFeed,
        JobRepository, JobRepositoryError, JobRepositoryResult, JobSubscription,
        SubscriptionStatus,
    },
};

/// Buffer size for each subscriber channel.
const DEFAULT_SUBSCRIBER_CAPACITY: usize = 64;

/// Thread-safe in-memory job store.
///
/// Every successful mutation is fanned out to all open subscriptions. A
/// subscriber whose buffer is full is disconnected and observes a closed
/// channel.
#[derive(Debug, Clone)]
pub struct InMemoryJobStore {
    state: Arc<RwLock<InMemoryJobState>>,
    subscriber_capacity: usize,
}

#[derive(Debug, Default)]
struct InMemoryJobState {
    jobs: HashMap<JobId, Job>,
    job_number_index: HashMap<JobNumber, JobId>,
    subscribers: Vec<mpsc::Sender<FeedMessage>>,
    failing_subscriptions: u32,
    fail_reads: bool,
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::with_subscriber_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }
}

impl InMemoryJobStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose subscriber buffers hold `capacity`
    /// messages.
    #[must_use]
    pub fn with_subscriber_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryJobState::default())),
            subscriber_capacity: capacity.max(1),
        }
    }

    /// Makes the next `count` subscriptions fail their handshake with
    /// [`SubscriptionStatus::ChannelError`].
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::Persistence`] when the state lock is
    /// poisoned.
    pub fn fail_next_subscriptions(&self, count: u32) -> JobRepositoryResult<()> {
        self.write_state()?.failing_subscriptions = count;
        Ok(())
    }

    /// Toggles failure of every operation that reads a stored job:
    /// `find_by_id`, `list_all` and `apply_update`.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::Persistence`] when the state lock is
    /// poisoned.
    pub fn set_fail_reads(&self, fail: bool) -> JobRepositoryResult<()> {
        self.write_state()?.fail_reads = fail;
        Ok(())
    }

    /// Reports a channel error to every open subscription and disconnects
    /// them.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::Persistence`] when the state lock is
    /// poisoned.
    pub fn drop_subscribers(&self) -> JobRepositoryResult<()> {
        let subscribers = std::mem::take(&mut self.write_state()?.subscribers);
        for subscriber in subscribers {
            if subscriber
                .try_send(FeedMessage::Status(SubscriptionStatus::ChannelError))
                .is_err()
            {
                debug!("subscriber already gone before channel error");
            }
        }
        Ok(())
    }

    /// Returns the number of subscriptions still attached.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::Persistence`] when the state lock is
    /// poisoned.
    pub fn subscriber_count(&self) -> JobRepositoryResult<usize> {
        let mut state = self.write_state()?;
        state.subscribers.retain(|subscriber| !subscriber.is_closed());
        Ok(state.subscribers.len())
    }

    fn write_state(&self) -> JobRepositoryResult<RwLockWriteGuard<'_, InMemoryJobState>> {
        self.state.write().map_err(|err| {
            JobRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn read_state(&self) -> JobRepositoryResult<RwLockReadGuard<'_, InMemoryJobState>> {
        let state = self.state.read().map_err(|err| {
            JobRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        check_reads(state.fail_reads)?;
        Ok(state)
    }
}

fn check_reads(fail_reads: bool) -> JobRepositoryResult<()> {
    if fail_reads {
        return Err(JobRepositoryError::persistence(std::io::Error::other(
            "reads disabled",
        )));
    }
    Ok(())
}

/// Sends an event to every subscriber, dropping closed or saturated ones.
fn publish(state: &mut InMemoryJobState, event: &ChangeEvent) {
    state.subscribers.retain(|subscriber| {
        subscriber
            .try_send(FeedMessage::Change(event.clone()))
            .is_ok()
    });
}

#[async_trait]
impl JobRepository for InMemoryJobStore {
    async fn insert(&self, job: &Job) -> JobRepositoryResult<()> {
        let mut state = self.write_state()?;
        if state.jobs.contains_key(&job.id()) {
            return Err(JobRepositoryError::DuplicateJob(job.id()));
        }
        if state.job_number_index.contains_key(job.job_number()) {
            return Err(JobRepositoryError::DuplicateJobNumber(
                job.job_number().clone(),
            ));
        }

        state
            .job_number_index
            .insert(job.job_number().clone(), job.id());
        state.jobs.insert(job.id(), job.clone());
        publish(&mut state, &ChangeEvent::Insert { new: job.clone() });
        Ok(())
    }

    async fn apply_update(&self, id: JobId, update: &JobUpdate) -> JobRepositoryResult<Job> {
        let mut state = self.write_state()?;
        check_reads(state.fail_reads)?;
        let stored = state
            .jobs
            .get_mut(&id)
            .ok_or(JobRepositoryError::NotFound(id))?;
        let mut next = stored.clone();
        next.apply_update(update)?;
        *stored = next.clone();
        publish(&mut state, &ChangeEvent::Update { new: next.clone() });
        Ok(next)
    }

    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>> {
        let state = self.read_state()?;
        Ok(state.jobs.get(&id).cloned())
    }

    async fn list_all(&self) -> JobRepositoryResult<Vec<Job>> {
        let state = self.read_state()?;
        Ok(state.jobs.values().cloned().collect())
    }

    async fn delete(&self, id: JobId) -> JobRepositoryResult<()> {
        let mut state = self.write_state()?;
        let Some(removed) = state.jobs.remove(&id) else {
            return Ok(());
        };
        state.job_number_index.remove(removed.job_number());
        publish(
            &mut state,
            &ChangeEvent::Delete {
                old: DeletedJob { id },
            },
        );
        Ok(())
    }
}

#[async_trait]
impl JobChangeFeed for InMemoryJobStore {
    async fn subscribe(&self) -> ChangeFeedResult<JobSubscription> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ChangeFeedError::Unavailable(err.to_string()))?;
        let (sender, receiver) = mpsc::channel(self.subscriber_capacity);

        if state.failing_subscriptions > 0 {
            state.failing_subscriptions -= 1;
            sender
                .try_send(FeedMessage::Status(SubscriptionStatus::ChannelError))
                .map_err(|err| ChangeFeedError::Unavailable(err.to_string()))?;
            return Ok(JobSubscription::new(receiver));
        }

        sender
            .try_send(FeedMessage::Status(SubscriptionStatus::Subscribed))
            .map_err(|err| ChangeFeedError::Unavailable(err.to_string()))?;
        state.subscribers.push(sender);
        Ok(JobSubscription::new(receiver))
    }
}
