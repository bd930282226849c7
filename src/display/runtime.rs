//! Async driver that keeps a [`DisplaySynchronizer`] fed.
//!
//! One task owns the synchronizer and multiplexes the change-feed
//! subscription, the cross-surface signal, a clock tick and viewer controls.
//! Each resulting [`BoardView`] is published on a `watch` channel.

use super::presentation::DisplayOptions;
use super::synchronizer::{BoardView, DisplaySynchronizer, InitialSnapshot, SyncCommand};
use crate::config::DisplaySettings;
use crate::job::adapters::broadcast::JobSignal;
use crate::job::ports::{
    FeedMessage, JobChangeFeed, JobRepository, JobSubscription, SignalMessage, SubscriptionStatus,
};
use mockable::Clock;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, trace, warn};

/// Buffered viewer controls.
const CONTROL_CAPACITY: usize = 16;

/// Shortest tick the runtime accepts.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Viewer interaction forwarded to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayControl {
    /// Move this many pages, wrapping.
    Navigate(i64),
    /// Jump to a page.
    GoToPage(usize),
    /// Change filter, ordering or page size.
    SetOptions(DisplayOptions),
}

/// Errors reported by [`DisplayHandle`].
#[derive(Debug, Error)]
pub enum DisplayRuntimeError {
    /// The runtime task is no longer accepting controls.
    #[error("display runtime has stopped")]
    Stopped,
    /// The runtime task panicked or was aborted.
    #[error("display runtime task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Builder for the display runtime.
pub struct DisplayRuntime<R, F, C> {
    repository: Arc<R>,
    feed: Arc<F>,
    signal: JobSignal,
    clock: Arc<C>,
    settings: DisplaySettings,
}

impl<R, F, C> DisplayRuntime<R, F, C>
where
    R: JobRepository + 'static,
    F: JobChangeFeed + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Collects the runtime's collaborators.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        feed: Arc<F>,
        signal: JobSignal,
        clock: Arc<C>,
        settings: DisplaySettings,
    ) -> Self {
        Self {
            repository,
            feed,
            signal,
            clock,
            settings,
        }
    }

    /// Fetches the initial snapshot and spawns the runtime task.
    ///
    /// A failed initial fetch is not an error: the board starts offline and
    /// recovers through polling.
    pub async fn start(self) -> DisplayHandle {
        let now = self.clock.utc();
        let initial = match self.repository.list_all().await {
            Ok(jobs) => InitialSnapshot::loaded(jobs, now),
            Err(err) => {
                warn!(error = %err, "initial job fetch failed; starting offline");
                InitialSnapshot::failed(now)
            }
        };
        let synchronizer = DisplaySynchronizer::new(self.settings, initial);
        let (views, view_receiver) = watch::channel(synchronizer.view(now));
        let (controls, control_receiver) = mpsc::channel(CONTROL_CAPACITY);
        let token = CancellationToken::new();

        let worker = Worker {
            synchronizer,
            repository: self.repository,
            feed: self.feed,
            clock: self.clock,
            views,
            controls: control_receiver,
            signals: Some(self.signal.subscribe()),
            subscription: None,
        };
        let task = tokio::spawn(worker.run(token.clone(), self.settings.tick_interval()));
        info!("display runtime started");

        DisplayHandle {
            views: view_receiver,
            controls,
            guard: token.clone().drop_guard(),
            token,
            task,
        }
    }
}

/// Owner handle for a running display.
///
/// Dropping the handle stops the runtime; [`DisplayHandle::shutdown`] also
/// waits for it to finish.
pub struct DisplayHandle {
    views: watch::Receiver<BoardView>,
    controls: mpsc::Sender<DisplayControl>,
    token: CancellationToken,
    guard: DropGuard,
    task: JoinHandle<()>,
}

impl DisplayHandle {
    /// Returns a receiver that observes every published view.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BoardView> {
        self.views.clone()
    }

    /// Returns the latest published view.
    #[must_use]
    pub fn current(&self) -> BoardView {
        self.views.borrow().clone()
    }

    /// Moves `delta` pages.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayRuntimeError::Stopped`] when the runtime has exited.
    pub async fn navigate(&self, delta: i64) -> Result<(), DisplayRuntimeError> {
        self.send(DisplayControl::Navigate(delta)).await
    }

    /// Jumps to page `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayRuntimeError::Stopped`] when the runtime has exited.
    pub async fn go_to_page(&self, index: usize) -> Result<(), DisplayRuntimeError> {
        self.send(DisplayControl::GoToPage(index)).await
    }

    /// Replaces the viewer options.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayRuntimeError::Stopped`] when the runtime has exited.
    pub async fn set_options(&self, options: DisplayOptions) -> Result<(), DisplayRuntimeError> {
        self.send(DisplayControl::SetOptions(options)).await
    }

    async fn send(&self, control: DisplayControl) -> Result<(), DisplayRuntimeError> {
        self.controls
            .send(control)
            .await
            .map_err(|_| DisplayRuntimeError::Stopped)
    }

    /// Stops the tick, drops the subscription and signal listener, and waits
    /// for the task to exit.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayRuntimeError::Join`] when the task panicked.
    pub async fn shutdown(self) -> Result<(), DisplayRuntimeError> {
        self.token.cancel();
        self.task.await?;
        drop(self.guard);
        info!("display runtime shut down");
        Ok(())
    }
}

struct Worker<R, F, C> {
    synchronizer: DisplaySynchronizer,
    repository: Arc<R>,
    feed: Arc<F>,
    clock: Arc<C>,
    views: watch::Sender<BoardView>,
    controls: mpsc::Receiver<DisplayControl>,
    signals: Option<broadcast::Receiver<SignalMessage>>,
    subscription: Option<JobSubscription>,
}

impl<R, F, C> Worker<R, F, C>
where
    R: JobRepository,
    F: JobChangeFeed,
    C: Clock + Send + Sync,
{
    async fn run(mut self, token: CancellationToken, tick_period: Duration) {
        let mut ticker = tokio::time::interval(tick_period.max(MIN_TICK));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let startup = self.synchronizer.start();
        self.execute(startup).await;
        self.publish();

        loop {
            let commands = tokio::select! {
                biased;
                () = token.cancelled() => break,
                message = next_message(&mut self.subscription) => self.on_feed_message(message),
                signal = next_signal(&mut self.signals) => self.on_signal(signal),
                Some(control) = self.controls.recv() => {
                    self.on_control(control);
                    Vec::new()
                }
                _ = ticker.tick() => self.synchronizer.tick(self.clock.utc()),
            };
            self.execute(commands).await;
            self.publish();
        }
        debug!("display runtime loop exited");
    }

    fn on_feed_message(&mut self, message: FeedMessage) -> Vec<SyncCommand> {
        let now = self.clock.utc();
        match message {
            FeedMessage::Change(event) => {
                self.synchronizer.apply_change(event, now);
                Vec::new()
            }
            FeedMessage::Status(status) => {
                if status.is_failure() {
                    self.subscription = None;
                }
                self.synchronizer.on_subscription_status(status, now)
            }
        }
    }

    fn on_signal(&mut self, signal: Result<SignalMessage, RecvError>) -> Vec<SyncCommand> {
        match signal {
            Ok(SignalMessage::JobUpdated) | Err(RecvError::Lagged(_)) => {
                self.synchronizer.on_job_signal()
            }
            Err(RecvError::Closed) => {
                debug!("job signal closed");
                self.signals = None;
                Vec::new()
            }
        }
    }

    fn on_control(&mut self, control: DisplayControl) {
        let now = self.clock.utc();
        match control {
            DisplayControl::Navigate(delta) => self.synchronizer.navigate(delta, now),
            DisplayControl::GoToPage(index) => self.synchronizer.go_to_page(index, now),
            DisplayControl::SetOptions(options) => self.synchronizer.set_options(options),
        }
    }

    async fn execute(&mut self, commands: Vec<SyncCommand>) {
        let mut queue = VecDeque::from(commands);
        while let Some(command) = queue.pop_front() {
            let follow_up = match command {
                SyncCommand::Refetch => {
                    self.refetch().await;
                    Vec::new()
                }
                SyncCommand::Subscribe => self.subscribe().await,
            };
            queue.extend(follow_up);
        }
    }

    async fn refetch(&mut self) {
        match self.repository.list_all().await {
            Ok(jobs) => self.synchronizer.apply_snapshot(jobs, self.clock.utc()),
            Err(err) => warn!(error = %err, "job re-fetch failed; keeping last known list"),
        }
    }

    async fn subscribe(&mut self) -> Vec<SyncCommand> {
        self.subscription = None;
        match self.feed.subscribe().await {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                Vec::new()
            }
            Err(err) => {
                warn!(error = %err, "job feed subscription could not be opened");
                self.synchronizer
                    .on_subscription_status(SubscriptionStatus::ChannelError, self.clock.utc())
            }
        }
    }

    fn publish(&self) {
        let next = self.synchronizer.view(self.clock.utc());
        let changed = self.views.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            trace!("board view published");
        }
    }
}

async fn next_message(subscription: &mut Option<JobSubscription>) -> FeedMessage {
    if let Some(active) = subscription {
        return active.next().await;
    }
    std::future::pending().await
}

async fn next_signal(
    signals: &mut Option<broadcast::Receiver<SignalMessage>>,
) -> Result<SignalMessage, RecvError> {
    if let Some(receiver) = signals {
        return receiver.recv().await;
    }
    std::future::pending().await
}
