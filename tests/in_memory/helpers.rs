//! Shared helpers for in-memory integration tests.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use mockable::DefaultClock;
use rstest::fixture;
use svb::config::DisplaySettings;
use svb::display::BoardView;
use svb::job::{
    adapters::memory::InMemoryJobStore,
    ports::{FeedMessage, JobSubscription},
    services::JobMutationService,
};
use tokio::sync::watch;

/// Longest a test waits for an asynchronous outcome.
pub const WAIT: Duration = Duration::from_secs(5);

/// Service type used across the in-memory tests.
pub type TestService = JobMutationService<InMemoryJobStore, DefaultClock>;

/// Provides a fresh in-memory store for each test.
#[fixture]
pub fn store() -> InMemoryJobStore {
    InMemoryJobStore::new()
}

/// Builds a mutation service sharing `store`.
#[must_use]
pub fn service_for(store: &InMemoryJobStore) -> TestService {
    JobMutationService::new(Arc::new(store.clone()), Arc::new(DefaultClock))
}

/// Display settings with millisecond timers and no automatic rotation.
#[must_use]
pub fn fast_settings() -> DisplaySettings {
    DisplaySettings {
        page_size: 3,
        rotation_interval_ms: 600_000,
        rotation_pause_ms: 2_000,
        reconnect_delay_ms: 20,
        max_reconnect_attempts: 3,
        poll_interval_ms: 40,
        tick_interval_ms: 5,
        ..DisplaySettings::default()
    }
}

/// Waits until the published board view satisfies `predicate`.
///
/// # Errors
///
/// Returns an error when the runtime stops or nothing matches within
/// [`WAIT`].
pub async fn wait_for_view(
    views: &mut watch::Receiver<BoardView>,
    predicate: impl FnMut(&BoardView) -> bool,
) -> Result<BoardView, eyre::Report> {
    let waited = tokio::time::timeout(WAIT, views.wait_for(predicate))
        .await
        .wrap_err("timed out waiting for board view")?;
    let view = waited.wrap_err("display runtime stopped publishing")?;
    Ok(view.clone())
}

/// Receives the next feed message within [`WAIT`].
///
/// # Errors
///
/// Returns an error when nothing arrives in time.
pub async fn next_message(subscription: &mut JobSubscription) -> Result<FeedMessage, eyre::Report> {
    tokio::time::timeout(WAIT, subscription.next())
        .await
        .wrap_err("timed out waiting for feed message")
}

/// Waits until `store` has `count` live subscriptions.
///
/// # Errors
///
/// Returns an error when the count is not reached within [`WAIT`].
pub async fn wait_for_subscribers(
    store: &InMemoryJobStore,
    count: usize,
) -> Result<(), eyre::Report> {
    let deadline = tokio::time::Instant::now() + WAIT;
    while store.subscriber_count()? != count {
        eyre::ensure!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {count} subscribers"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    Ok(())
}
