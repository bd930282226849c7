//! In-memory integration tests for job lifecycle operations.

use super::helpers::{next_message, service_for, store};
use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use svb::job::{
    adapters::memory::InMemoryJobStore,
    domain::{Job, JobDetailsPatch, JobId, JobStatus, JobUpdate},
    ports::{
        ChangeEvent, FeedMessage, JobChangeFeed, JobRepository, JobRepositoryResult,
        SubscriptionStatus,
    },
    services::{CreateJobRequest, JobMutationService},
};

/// Store wrapper that stalls the first call touching an existing job.
struct StalledFirstAccess {
    inner: InMemoryJobStore,
    calls: AtomicUsize,
    stall: Duration,
}

impl StalledFirstAccess {
    const fn new(inner: InMemoryJobStore, stall: Duration) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            stall,
        }
    }

    async fn pace(&self) {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(self.stall).await;
        }
    }

    fn started(&self) -> bool {
        self.calls.load(Ordering::SeqCst) > 0
    }
}

#[async_trait]
impl JobRepository for StalledFirstAccess {
    async fn insert(&self, job: &Job) -> JobRepositoryResult<()> {
        self.inner.insert(job).await
    }

    async fn apply_update(&self, id: JobId, update: &JobUpdate) -> JobRepositoryResult<Job> {
        self.pace().await;
        self.inner.apply_update(id, update).await
    }

    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>> {
        self.pace().await;
        self.inner.find_by_id(id).await
    }

    async fn list_all(&self) -> JobRepositoryResult<Vec<Job>> {
        self.inner.list_all().await
    }

    async fn delete(&self, id: JobId) -> JobRepositoryResult<()> {
        self.inner.delete(id).await
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_progress_complete_and_delete(store: InMemoryJobStore) -> eyre::Result<()> {
    let service = service_for(&store);

    let job = service
        .create_job(CreateJobRequest::new("V-101", "P-1", 10).with_machine("Haas VF-2"))
        .await?;
    eyre::ensure!(job.percentage() == 0);

    let started = service.update_status(job.id(), JobStatus::InProgress).await?;
    eyre::ensure!(started.status() == JobStatus::InProgress);

    let progressed = service.update_progress(job.id(), 3, 10).await?;
    eyre::ensure!(progressed.percentage() == 30);
    eyre::ensure!(progressed.status() == JobStatus::InProgress);

    let finished = service.update_progress(job.id(), 10, 10).await?;
    eyre::ensure!(finished.percentage() == 100);
    eyre::ensure!(
        finished.status() == JobStatus::InProgress,
        "progress alone never completes a job"
    );

    let completed = service.update_status(job.id(), JobStatus::Completed).await?;
    eyre::ensure!(completed.status().is_terminal());
    eyre::ensure!(completed.updated_at() >= job.updated_at());

    service.delete_job(job.id()).await?;
    eyre::ensure!(store.find_by_id(job.id()).await?.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn details_patch_is_all_or_nothing(store: InMemoryJobStore) -> eyre::Result<()> {
    let service = service_for(&store);
    let job = service
        .create_job(CreateJobRequest::new("V-102", "P-2", 5).with_title("Brackets"))
        .await?;

    let rejected = service
        .update_details(
            job.id(),
            JobDetailsPatch {
                title: Some("Side plates".to_owned()),
                pieces_completed: Some(9),
                ..JobDetailsPatch::default()
            },
        )
        .await;

    eyre::ensure!(rejected.is_err());
    let stored = store
        .find_by_id(job.id())
        .await?
        .ok_or_else(|| eyre::eyre!("job missing"))?;
    eyre::ensure!(stored.title() == Some("Brackets"));
    eyre::ensure!(stored.pieces_completed() == 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn read_failures_surface_as_generic_error(store: InMemoryJobStore) -> eyre::Result<()> {
    let service = service_for(&store);
    let job = service
        .create_job(CreateJobRequest::new("V-103", "P-3", 1))
        .await?;
    store.set_fail_reads(true)?;

    let Err(err) = service.update_progress(job.id(), 1, 1).await else {
        eyre::bail!("update should fail while reads fail");
    };

    eyre::ensure!(err.user_message() == "Could not save job changes");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_status_change_keeps_concurrent_progress(store: InMemoryJobStore) -> eyre::Result<()> {
    let service = service_for(&store);
    let job = service
        .create_job(CreateJobRequest::new("V-104", "P-4", 10).with_pieces_completed(5))
        .await?;

    let stalled = Arc::new(StalledFirstAccess::new(
        store.clone(),
        Duration::from_millis(200),
    ));
    let slow_service = Arc::new(JobMutationService::new(
        Arc::clone(&stalled),
        Arc::new(DefaultClock),
    ));
    let status_write = tokio::spawn({
        let slow_service = Arc::clone(&slow_service);
        let id = job.id();
        async move { slow_service.update_status(id, JobStatus::InProgress).await }
    });
    while !stalled.started() {
        tokio::task::yield_now().await;
    }

    let progressed = service.update_progress(job.id(), 8, 10).await?;
    eyre::ensure!(progressed.pieces_completed() == 8);

    let started = status_write.await??;
    eyre::ensure!(started.status() == JobStatus::InProgress);
    eyre::ensure!(
        started.pieces_completed() == 8,
        "status change rewrote the piece count"
    );

    let stored = store
        .find_by_id(job.id())
        .await?
        .ok_or_else(|| eyre::eyre!("job missing"))?;
    eyre::ensure!(stored.pieces_completed() == 8);
    eyre::ensure!(stored.status() == JobStatus::InProgress);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_writers_never_move_progress_backwards(store: InMemoryJobStore) -> eyre::Result<()> {
    let service = Arc::new(service_for(&store));
    let job = service
        .create_job(CreateJobRequest::new("V-105", "P-5", 20).with_status(JobStatus::InProgress))
        .await?;
    let mut subscription = store.subscribe().await?;
    eyre::ensure!(
        next_message(&mut subscription).await?
            == FeedMessage::Status(SubscriptionStatus::Subscribed)
    );

    let statuses = [None, Some(JobStatus::Paused), None, Some(JobStatus::InProgress)];
    let mut writers = Vec::new();
    for (pieces, status) in (1..=20_u32).zip(statuses.into_iter().cycle()) {
        let progress_service = Arc::clone(&service);
        let id = job.id();
        writers.push(tokio::spawn(async move {
            progress_service.update_progress(id, pieces, 20).await
        }));
        if let Some(next) = status {
            let status_service = Arc::clone(&service);
            writers.push(tokio::spawn(async move {
                status_service.update_status(id, next).await
            }));
        }
    }

    let mut written = 0_usize;
    for writer in writers {
        if writer.await?.is_ok() {
            written += 1;
        }
    }

    let mut highest = 0;
    for _ in 0..written {
        let FeedMessage::Change(ChangeEvent::Update { new }) =
            next_message(&mut subscription).await?
        else {
            eyre::bail!("expected an update event");
        };
        eyre::ensure!(
            new.pieces_completed() >= highest,
            "progress fell from {highest} to {}",
            new.pieces_completed()
        );
        eyre::ensure!(new.total_pieces() == 20);
        highest = new.pieces_completed();
    }

    let stored = store
        .find_by_id(job.id())
        .await?
        .ok_or_else(|| eyre::eyre!("job missing"))?;
    eyre::ensure!(stored.pieces_completed() == 20);
    Ok(())
}
