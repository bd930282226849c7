//! The TV board runtime driven by a live in-memory store.

use std::sync::Arc;

use super::helpers::{fast_settings, service_for, store, wait_for_subscribers, wait_for_view};
use mockable::DefaultClock;
use rstest::rstest;
use svb::config::DisplaySettings;
use svb::display::{ConnectionState, DisplayHandle, DisplayOptions, DisplayRuntime};
use svb::job::{
    adapters::{broadcast::JobSignal, memory::InMemoryJobStore},
    domain::JobStatus,
    services::CreateJobRequest,
};

async fn start_display(
    store: &InMemoryJobStore,
    signal: &JobSignal,
    settings: DisplaySettings,
) -> DisplayHandle {
    let shared = Arc::new(store.clone());
    DisplayRuntime::new(
        Arc::clone(&shared),
        shared,
        signal.clone(),
        Arc::new(DefaultClock),
        settings,
    )
    .start()
    .await
}

async fn seed(store: &InMemoryJobStore, count: u32) -> eyre::Result<()> {
    let service = service_for(store);
    for number in 1..=count {
        service
            .create_job(CreateJobRequest::new(
                format!("V-{number}"),
                format!("P-{number}"),
                10,
            ))
            .await?;
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pushed_changes_reach_the_board(store: InMemoryJobStore) -> eyre::Result<()> {
    seed(&store, 2).await?;
    let signal = JobSignal::default();
    let handle = start_display(&store, &signal, fast_settings()).await;
    let mut views = handle.subscribe();

    let connected = wait_for_view(&mut views, |view| {
        view.connection == ConnectionState::Connected && view.filtered_total == 2
    })
    .await?;
    eyre::ensure!(!connected.stale);
    wait_for_subscribers(&store, 1).await?;

    let service = service_for(&store);
    let job = service
        .create_job(
            CreateJobRequest::new("V-300", "P-300", 4).with_status(JobStatus::InProgress),
        )
        .await?;
    let view = wait_for_view(&mut views, |view| view.filtered_total == 3).await?;
    eyre::ensure!(view.jobs.first().map(|first| first.id()) == Some(job.id()));
    eyre::ensure!(view.rotation_paused);
    eyre::ensure!(view.active_jobs == 3);

    service.delete_job(job.id()).await?;
    wait_for_view(&mut views, |view| view.filtered_total == 2).await?;

    handle.shutdown().await?;
    eyre::ensure!(store.subscriber_count()? == 0);
    eyre::ensure!(signal.listener_count() == 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lost_feed_reconnects(store: InMemoryJobStore) -> eyre::Result<()> {
    seed(&store, 1).await?;
    let settings = DisplaySettings {
        reconnect_delay_ms: 200,
        ..fast_settings()
    };
    let signal = JobSignal::default();
    let handle = start_display(&store, &signal, settings).await;
    let mut views = handle.subscribe();
    wait_for_subscribers(&store, 1).await?;

    store.drop_subscribers()?;
    let dropped = wait_for_view(&mut views, |view| {
        view.connection == ConnectionState::Reconnecting
    })
    .await?;
    eyre::ensure!(dropped.stale);
    eyre::ensure!(dropped.filtered_total == 1, "last known list stays on screen");

    let back = wait_for_view(&mut views, |view| {
        view.connection == ConnectionState::Connected
    })
    .await?;
    eyre::ensure!(!back.stale);
    eyre::ensure!(store.subscriber_count()? == 1);

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn exhausted_reconnects_fall_back_to_polling(store: InMemoryJobStore) -> eyre::Result<()> {
    store.fail_next_subscriptions(u32::MAX)?;
    let signal = JobSignal::default();
    let handle = start_display(&store, &signal, fast_settings()).await;
    let mut views = handle.subscribe();

    let offline = wait_for_view(&mut views, |view| {
        view.connection == ConnectionState::Disconnected
    })
    .await?;
    eyre::ensure!(offline.stale);
    eyre::ensure!(offline.filtered_total == 0);

    seed(&store, 2).await?;
    let polled = wait_for_view(&mut views, |view| view.filtered_total == 2).await?;
    eyre::ensure!(polled.connection == ConnectionState::Disconnected);

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_initial_fetch_starts_offline(store: InMemoryJobStore) -> eyre::Result<()> {
    seed(&store, 1).await?;
    store.set_fail_reads(true)?;
    store.fail_next_subscriptions(u32::MAX)?;
    let signal = JobSignal::default();
    let handle = start_display(&store, &signal, fast_settings()).await;
    let mut views = handle.subscribe();

    let first = handle.current();
    eyre::ensure!(first.stale);
    eyre::ensure!(first.filtered_total == 0);

    store.set_fail_reads(false)?;
    wait_for_view(&mut views, |view| view.filtered_total == 1).await?;

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn job_signal_triggers_refetch(store: InMemoryJobStore) -> eyre::Result<()> {
    store.fail_next_subscriptions(u32::MAX)?;
    let settings = DisplaySettings {
        poll_interval_ms: 600_000,
        max_reconnect_attempts: 1,
        ..fast_settings()
    };
    let signal = JobSignal::default();
    let handle = start_display(&store, &signal, settings).await;
    let mut views = handle.subscribe();
    wait_for_view(&mut views, |view| {
        view.connection == ConnectionState::Disconnected
    })
    .await?;

    seed(&store, 1).await?;
    eyre::ensure!(handle.current().filtered_total == 0);
    eyre::ensure!(signal.job_updated() == 1);

    wait_for_view(&mut views, |view| view.filtered_total == 1).await?;
    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn viewer_controls_change_the_page(store: InMemoryJobStore) -> eyre::Result<()> {
    seed(&store, 7).await?;
    let signal = JobSignal::default();
    let handle = start_display(&store, &signal, fast_settings()).await;
    let mut views = handle.subscribe();
    wait_for_view(&mut views, |view| view.page_count == 3).await?;

    handle.navigate(-1).await?;
    let last = wait_for_view(&mut views, |view| view.page_index == 2).await?;
    eyre::ensure!(last.jobs.len() == 1);
    eyre::ensure!((last.showing_start, last.showing_end) == (7, 7));

    handle.go_to_page(1).await?;
    wait_for_view(&mut views, |view| view.page_index == 1).await?;

    handle
        .set_options(DisplayOptions::with_page_size(10))
        .await?;
    let single = wait_for_view(&mut views, |view| view.page_count == 1).await?;
    eyre::ensure!(single.page_index == 0);
    eyre::ensure!(single.jobs.len() == 7);

    handle.shutdown().await?;
    Ok(())
}
