//! In-memory integration tests for the job change feed.

use super::helpers::{next_message, service_for, store};
use rstest::rstest;
use svb::job::{
    adapters::memory::InMemoryJobStore,
    ports::{ChangeEvent, FeedMessage, JobChangeFeed, SubscriptionStatus},
    services::CreateJobRequest,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn subscription_receives_changes_in_order(store: InMemoryJobStore) -> eyre::Result<()> {
    let service = service_for(&store);
    let mut subscription = store.subscribe().await?;
    eyre::ensure!(
        next_message(&mut subscription).await?
            == FeedMessage::Status(SubscriptionStatus::Subscribed)
    );

    let job = service
        .create_job(CreateJobRequest::new("V-201", "P-1", 4))
        .await?;
    let updated = service.update_progress(job.id(), 2, 4).await?;
    service.delete_job(job.id()).await?;

    let inserted = next_message(&mut subscription).await?;
    eyre::ensure!(inserted == FeedMessage::Change(ChangeEvent::Insert { new: job.clone() }));
    let changed = next_message(&mut subscription).await?;
    eyre::ensure!(changed == FeedMessage::Change(ChangeEvent::Update { new: updated }));
    let FeedMessage::Change(deleted) = next_message(&mut subscription).await? else {
        eyre::bail!("expected a delete event");
    };
    eyre::ensure!(deleted.kind() == "DELETE");
    eyre::ensure!(deleted.job_id() == job.id());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_subscriber_sees_each_change(store: InMemoryJobStore) -> eyre::Result<()> {
    let service = service_for(&store);
    let mut first = store.subscribe().await?;
    let mut second = store.subscribe().await?;
    eyre::ensure!(store.subscriber_count()? == 2);

    service
        .create_job(CreateJobRequest::new("V-202", "P-2", 1))
        .await?;

    for subscription in [&mut first, &mut second] {
        next_message(subscription).await?;
        let message = next_message(subscription).await?;
        eyre::ensure!(matches!(
            message,
            FeedMessage::Change(ChangeEvent::Insert { .. })
        ));
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn injected_faults_report_channel_errors(store: InMemoryJobStore) -> eyre::Result<()> {
    store.fail_next_subscriptions(1)?;
    let mut refused = store.subscribe().await?;
    eyre::ensure!(
        next_message(&mut refused).await?
            == FeedMessage::Status(SubscriptionStatus::ChannelError)
    );

    let mut healthy = store.subscribe().await?;
    next_message(&mut healthy).await?;
    store.drop_subscribers()?;

    eyre::ensure!(
        next_message(&mut healthy).await?
            == FeedMessage::Status(SubscriptionStatus::ChannelError)
    );
    eyre::ensure!(
        next_message(&mut healthy).await? == FeedMessage::Status(SubscriptionStatus::Closed)
    );
    eyre::ensure!(store.subscriber_count()? == 0);
    Ok(())
}
