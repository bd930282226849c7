//! Shared world state for job progress BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use svb::admin::AdminBoard;
use svb::job::{
    adapters::{broadcast::JobSignal, memory::InMemoryJobStore},
    domain::Job,
    services::{JobMutationService, JobServiceResult},
};

/// Service type used by the BDD world.
pub type TestJobService = JobMutationService<InMemoryJobStore, DefaultClock>;

/// Scenario world for job progress behaviour tests.
pub struct JobProgressWorld {
    pub store: InMemoryJobStore,
    pub service: TestJobService,
    pub admin: AdminBoard<InMemoryJobStore, DefaultClock>,
    pub current: Option<Job>,
    pub last_error: Option<String>,
}

impl JobProgressWorld {
    /// Creates a world around an empty store.
    #[must_use]
    pub fn new() -> Self {
        let store = InMemoryJobStore::new();
        let clock = Arc::new(DefaultClock);
        let service = JobMutationService::new(Arc::new(store.clone()), Arc::clone(&clock));
        let admin = AdminBoard::new(Arc::new(store.clone()), clock, JobSignal::default());
        Self {
            store,
            service,
            admin,
            current: None,
            last_error: None,
        }
    }

    /// Returns the job the scenario is working on.
    ///
    /// # Errors
    ///
    /// Returns an error when no job has been created yet.
    pub fn current_job(&self) -> Result<&Job, eyre::Report> {
        self.current
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing job in scenario world"))
    }

    /// Keeps a successful result as the current job, or its message as the
    /// last error.
    pub fn record(&mut self, result: JobServiceResult<Job>) {
        match result {
            Ok(job) => {
                self.current = Some(job);
                self.last_error = None;
            }
            Err(err) => self.last_error = Some(err.user_message()),
        }
    }
}

impl Default for JobProgressWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> JobProgressWorld {
    JobProgressWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
