//! Push-feed health, bounded reconnects and fallback polling.

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// Health of the push update channel as shown to viewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Push updates are flowing.
    Connected,
    /// The feed failed and a resubscription is scheduled.
    Reconnecting,
    /// Push updates were given up on; only polling remains.
    Disconnected,
}

impl ConnectionState {
    /// Short label for the board footer.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connected => "Live sync active",
            Self::Reconnecting => "Reconnecting...",
            Self::Disconnected => "Offline mode",
        }
    }

    /// Lower-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconnect and polling bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTracker {
    state: ConnectionState,
    attempts: u32,
    max_attempts: u32,
    reconnect_delay: TimeDelta,
    poll_interval: TimeDelta,
    next_poll: Option<DateTime<Utc>>,
    resubscribe_at: Option<DateTime<Utc>>,
}

impl ConnectionTracker {
    /// Creates a tracker in `initial` state with polling stopped.
    #[must_use]
    pub const fn new(
        initial: ConnectionState,
        max_attempts: u32,
        reconnect_delay: TimeDelta,
        poll_interval: TimeDelta,
    ) -> Self {
        Self {
            state: initial,
            attempts: 0,
            max_attempts,
            reconnect_delay,
            poll_interval,
            next_poll: None,
            resubscribe_at: None,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Consecutive failed subscriptions.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns `true` while fallback polling runs.
    #[must_use]
    pub const fn is_polling(&self) -> bool {
        self.next_poll.is_some()
    }

    /// Returns when the next resubscription is due, if one is scheduled.
    #[must_use]
    pub const fn resubscribe_at(&self) -> Option<DateTime<Utc>> {
        self.resubscribe_at
    }

    /// Records a completed handshake: resets the attempt count and stops
    /// polling.
    pub const fn on_subscribed(&mut self) {
        self.state = ConnectionState::Connected;
        self.attempts = 0;
        self.next_poll = None;
        self.resubscribe_at = None;
    }

    /// Records a failed or lost subscription.
    ///
    /// While fewer than the maximum attempts have failed a resubscription is
    /// scheduled after the fixed delay; afterwards the tracker settles in
    /// [`ConnectionState::Disconnected`] for good. Polling starts either way.
    pub fn on_failure(&mut self, now: DateTime<Utc>) {
        self.attempts = self.attempts.saturating_add(1);
        if self.attempts < self.max_attempts {
            self.state = ConnectionState::Reconnecting;
            self.resubscribe_at = Some(now + self.reconnect_delay);
        } else {
            self.state = ConnectionState::Disconnected;
            self.resubscribe_at = None;
        }
        self.start_polling(now);
    }

    /// Starts fallback polling unless it is already running.
    pub fn start_polling(&mut self, now: DateTime<Utc>) {
        if self.next_poll.is_none() {
            self.next_poll = Some(now + self.poll_interval);
        }
    }

    /// Returns `true` and schedules the next poll when a poll is due.
    pub fn take_poll(&mut self, now: DateTime<Utc>) -> bool {
        match self.next_poll {
            Some(due) if now >= due => {
                self.next_poll = Some(now + self.poll_interval);
                true
            }
            _ => false,
        }
    }

    /// Returns `true` once when the scheduled resubscription is due.
    pub fn take_resubscribe(&mut self, now: DateTime<Utc>) -> bool {
        match self.resubscribe_at {
            Some(due) if now >= due => {
                self.resubscribe_at = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionState, ConnectionTracker};
    use chrono::{DateTime, TimeDelta, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap_or_default()
    }

    fn tracker() -> ConnectionTracker {
        ConnectionTracker::new(
            ConnectionState::Connected,
            6,
            TimeDelta::seconds(10),
            TimeDelta::seconds(60),
        )
    }

    #[rstest]
    fn failure_schedules_resubscribe_and_polls(start: DateTime<Utc>) {
        let mut connection = tracker();
        connection.on_failure(start);

        assert_eq!(connection.state(), ConnectionState::Reconnecting);
        assert!(connection.is_polling());
        assert!(!connection.take_resubscribe(start + TimeDelta::seconds(9)));
        assert!(connection.take_resubscribe(start + TimeDelta::seconds(10)));
        assert!(!connection.take_resubscribe(start + TimeDelta::seconds(11)));
    }

    #[rstest]
    fn sixth_failure_gives_up(start: DateTime<Utc>) {
        let mut connection = tracker();
        for attempt in 1..=5 {
            connection.on_failure(start);
            assert_eq!(connection.attempts(), attempt);
            assert_eq!(connection.state(), ConnectionState::Reconnecting);
        }

        connection.on_failure(start);

        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert_eq!(connection.resubscribe_at(), None);
        assert!(connection.is_polling());
    }

    #[rstest]
    fn subscribed_resets_attempts_and_stops_polling(start: DateTime<Utc>) {
        let mut connection = tracker();
        connection.on_failure(start);
        connection.on_failure(start);

        connection.on_subscribed();

        assert_eq!(connection.state(), ConnectionState::Connected);
        assert_eq!(connection.attempts(), 0);
        assert!(!connection.is_polling());
        assert!(!connection.take_poll(start + TimeDelta::days(1)));
    }

    #[rstest]
    fn polling_repeats_on_its_interval(start: DateTime<Utc>) {
        let mut connection = tracker();
        connection.start_polling(start);
        connection.start_polling(start + TimeDelta::seconds(30));

        assert!(!connection.take_poll(start + TimeDelta::seconds(59)));
        assert!(connection.take_poll(start + TimeDelta::seconds(60)));
        assert!(!connection.take_poll(start + TimeDelta::seconds(61)));
        assert!(connection.take_poll(start + TimeDelta::seconds(120)));
    }
}
