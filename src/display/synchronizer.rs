//! Deterministic state machine behind the TV board.
//!
//! The synchronizer never performs I/O and never reads a clock. Callers feed
//! it events together with the current instant and carry out the
//! [`SyncCommand`]s it returns.

use super::connection::{ConnectionState, ConnectionTracker};
use super::presentation::{DisplayOptions, page_count, paginate, prepare_with_settings};
use super::rotation::Rotation;
use crate::config::{ALLOWED_PAGE_SIZES, DisplaySettings};
use crate::job::domain::{Job, JobStatus};
use crate::job::ports::{ChangeEvent, SubscriptionStatus};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Side effect requested by the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncCommand {
    /// Fetch the full job list and pass it to
    /// [`DisplaySynchronizer::apply_snapshot`].
    Refetch,
    /// Open a new change-feed subscription.
    Subscribe,
}

/// Job list the board starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialSnapshot {
    jobs: Vec<Job>,
    fetched_at: DateTime<Utc>,
    failed: bool,
}

impl InitialSnapshot {
    /// A successful initial fetch.
    #[must_use]
    pub const fn loaded(jobs: Vec<Job>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            jobs,
            fetched_at,
            failed: false,
        }
    }

    /// An initial fetch that failed at `attempted_at`.
    #[must_use]
    pub const fn failed(attempted_at: DateTime<Utc>) -> Self {
        Self {
            jobs: Vec::new(),
            fetched_at: attempted_at,
            failed: true,
        }
    }

    /// Returns `true` when the fetch failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.failed
    }
}

/// Everything the board renders, derived from synchronizer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    /// Jobs on the visible page.
    pub jobs: Vec<Job>,
    /// Zero-based visible page.
    pub page_index: usize,
    /// Total pages; at least one.
    pub page_count: usize,
    /// One-based position of the first visible job, or zero when empty.
    pub showing_start: usize,
    /// One-based position of the last visible job, or zero when empty.
    pub showing_end: usize,
    /// Jobs matching the current filter.
    pub filtered_total: usize,
    /// Jobs on the board that are not completed.
    pub active_jobs: usize,
    /// Push-feed health.
    pub connection: ConnectionState,
    /// `true` whenever the list may lag behind the store.
    pub stale: bool,
    /// When the local list last changed.
    pub last_updated_at: DateTime<Utc>,
    /// `true` while rotation is held.
    pub rotation_paused: bool,
    /// Active viewer options.
    pub options: DisplayOptions,
}

/// TV board synchronization state.
#[derive(Debug, Clone)]
pub struct DisplaySynchronizer {
    settings: DisplaySettings,
    jobs: Vec<Job>,
    options: DisplayOptions,
    page_index: usize,
    rotation: Rotation,
    connection: ConnectionTracker,
    last_updated_at: DateTime<Utc>,
    refetch_pending: bool,
}

impl DisplaySynchronizer {
    /// Seeds the board from `initial`, using its fetch time as the clock
    /// origin.
    ///
    /// After a failed fetch the board starts disconnected with polling
    /// running and a re-fetch owed: [`Self::start`] or the first tick issues
    /// it.
    #[must_use]
    pub fn new(settings: DisplaySettings, initial: InitialSnapshot) -> Self {
        let now = initial.fetched_at;
        let initial_state = if initial.failed {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Connected
        };
        let mut connection = ConnectionTracker::new(
            initial_state,
            settings.max_reconnect_attempts,
            settings.reconnect_delay(),
            settings.poll_interval(),
        );
        if initial.failed {
            connection.start_polling(now);
        }
        Self {
            options: DisplayOptions::with_page_size(settings.page_size),
            rotation: Rotation::new(now, settings.rotation_interval(), settings.rotation_pause()),
            settings,
            jobs: initial.jobs,
            page_index: 0,
            connection,
            last_updated_at: now,
            refetch_pending: initial.failed,
        }
    }

    /// Commands to issue once the runtime starts: a subscription, plus a
    /// re-fetch when the initial fetch failed.
    #[must_use]
    pub fn start(&mut self) -> Vec<SyncCommand> {
        let mut commands = vec![SyncCommand::Subscribe];
        if std::mem::take(&mut self.refetch_pending) {
            commands.push(SyncCommand::Refetch);
        }
        commands
    }

    /// Jobs held locally, unfiltered.
    #[must_use]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Current connection state.
    #[must_use]
    pub const fn connection(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Applies a single row change and holds rotation briefly.
    ///
    /// Inserts and updates replace the job with the same id or append it;
    /// deletes remove it. Applying the same event twice leaves the list as
    /// after the first application.
    pub fn apply_change(&mut self, event: ChangeEvent, now: DateTime<Utc>) {
        debug!(kind = event.kind(), job_id = %event.job_id(), "applying job change");
        match event {
            ChangeEvent::Delete { old } => self.jobs.retain(|job| job.id() != old.id),
            ChangeEvent::Insert { new } | ChangeEvent::Update { new } => {
                upsert(&mut self.jobs, new);
            }
        }
        self.last_updated_at = now;
        self.rotation.pause(now);
        self.normalize_page(now);
    }

    /// Replaces the local list with a full fetch.
    pub fn apply_snapshot(&mut self, jobs: Vec<Job>, now: DateTime<Utc>) {
        debug!(count = jobs.len(), "applying job snapshot");
        self.jobs = jobs;
        self.last_updated_at = now;
        self.refetch_pending = false;
        self.normalize_page(now);
    }

    /// Reacts to a subscription lifecycle update.
    pub fn on_subscription_status(
        &mut self,
        status: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> Vec<SyncCommand> {
        if status.is_failure() {
            self.connection.on_failure(now);
            warn!(
                ?status,
                attempts = self.connection.attempts(),
                state = %self.connection.state(),
                "job feed subscription failed"
            );
            return Vec::new();
        }
        self.connection.on_subscribed();
        info!("job feed subscribed");
        vec![SyncCommand::Refetch]
    }

    /// Reacts to a `job-updated` signal from another surface.
    pub fn on_job_signal(&mut self) -> Vec<SyncCommand> {
        debug!("job-updated signal received");
        self.refetch_pending = false;
        vec![SyncCommand::Refetch]
    }

    /// Advances every timer to `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<SyncCommand> {
        let mut commands = Vec::new();
        let pages = self.normalize_page(now);
        if self.rotation.tick(now, pages) {
            self.page_index = self.page_index.saturating_add(1).rem_euclid(pages);
        }
        let poll_due = self.connection.take_poll(now);
        if std::mem::take(&mut self.refetch_pending) || poll_due {
            commands.push(SyncCommand::Refetch);
        }
        if self.connection.take_resubscribe(now) {
            commands.push(SyncCommand::Subscribe);
        }
        commands
    }

    /// Moves `delta` pages forward or back, wrapping, and holds rotation.
    /// Does nothing when there is only one page.
    pub fn navigate(&mut self, delta: i64, now: DateTime<Utc>) {
        let pages = self.normalize_page(now);
        if pages <= 1 {
            return;
        }
        let (Ok(count), Ok(current)) = (i64::try_from(pages), i64::try_from(self.page_index))
        else {
            return;
        };
        let target = current.saturating_add(delta).rem_euclid(count);
        self.page_index = usize::try_from(target).unwrap_or(0);
        self.rotation.pause(now);
    }

    /// Jumps to page `index`, clamped to the last page, and holds rotation.
    /// Does nothing when there is only one page.
    pub fn go_to_page(&mut self, index: usize, now: DateTime<Utc>) {
        let pages = self.normalize_page(now);
        if pages <= 1 {
            return;
        }
        self.page_index = index.min(pages.saturating_sub(1));
        self.rotation.pause(now);
    }

    /// Changes filter, ordering or page size and returns to the first page.
    ///
    /// Page sizes outside the offered set fall back to the configured size.
    pub fn set_options(&mut self, options: DisplayOptions) {
        let page_size = if ALLOWED_PAGE_SIZES.contains(&options.page_size) {
            options.page_size
        } else {
            self.settings.page_size
        };
        self.options = DisplayOptions {
            page_size,
            ..options
        };
        self.page_index = 0;
    }

    /// Derives the board at `now`.
    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> BoardView {
        let prepared = prepare_with_settings(self.jobs.clone(), now, &self.settings);
        let active_jobs = prepared
            .iter()
            .filter(|job| job.status() != JobStatus::Completed)
            .count();
        let arranged = self.options.arrange(prepared);
        let filtered_total = arranged.len();
        let page_size = self.options.page_size;
        let pages = page_count(filtered_total, page_size);
        let page_index = if self.page_index < pages {
            self.page_index
        } else {
            0
        };
        let offset = page_index.saturating_mul(page_size);
        let showing_start = if filtered_total == 0 {
            0
        } else {
            offset.saturating_add(1)
        };
        let showing_end = filtered_total.min(offset.saturating_add(page_size));
        let connection = self.connection.state();

        BoardView {
            jobs: paginate(arranged, page_size, page_index),
            page_index,
            page_count: pages,
            showing_start,
            showing_end,
            filtered_total,
            active_jobs,
            connection,
            stale: connection != ConnectionState::Connected,
            last_updated_at: self.last_updated_at,
            rotation_paused: self.rotation.is_paused(now),
            options: self.options,
        }
    }

    /// Returns the page count at `now`, resetting an out-of-range page index
    /// to the first page.
    fn normalize_page(&mut self, now: DateTime<Utc>) -> usize {
        let prepared = prepare_with_settings(self.jobs.clone(), now, &self.settings);
        let visible = prepared
            .iter()
            .filter(|job| self.options.filter.includes(job.status()))
            .count();
        let pages = page_count(visible, self.options.page_size);
        if self.page_index >= pages {
            self.page_index = 0;
        }
        pages
    }
}

fn upsert(jobs: &mut Vec<Job>, job: Job) {
    if let Some(existing) = jobs.iter_mut().find(|candidate| candidate.id() == job.id()) {
        *existing = job;
        return;
    }
    jobs.push(job);
}
