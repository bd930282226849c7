//! Page rotation for the unattended board.

use chrono::{DateTime, TimeDelta, Utc};

/// Where the rotation timer stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    /// Pages advance when `next_advance` passes.
    Rotating {
        /// Instant of the next page change.
        next_advance: DateTime<Utc>,
    },
    /// Rotation is held until the deadline passes.
    PausedUntil(DateTime<Utc>),
}

/// Rotation timer driven by explicit clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    state: RotationState,
    interval: TimeDelta,
    pause: TimeDelta,
}

impl Rotation {
    /// Starts rotating at `now`; the first advance is one interval away.
    #[must_use]
    pub fn new(now: DateTime<Utc>, interval: TimeDelta, pause: TimeDelta) -> Self {
        Self {
            state: RotationState::Rotating {
                next_advance: now + interval,
            },
            interval,
            pause,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> RotationState {
        self.state
    }

    /// Holds rotation for the pause window. An existing hold is extended,
    /// never shortened.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        let until = now + self.pause;
        self.state = match self.state {
            RotationState::PausedUntil(existing) if existing > until => {
                RotationState::PausedUntil(existing)
            }
            _ => RotationState::PausedUntil(until),
        };
    }

    /// Returns `true` while a hold is in force.
    #[must_use]
    pub fn is_paused(&self, now: DateTime<Utc>) -> bool {
        matches!(self.state, RotationState::PausedUntil(until) if now < until)
    }

    /// Advances the timer to `now`.
    ///
    /// Returns `true` when the board should move to its next page. A hold
    /// that has expired resumes rotation with a full interval ahead. With a
    /// single page the timer keeps running but never reports an advance.
    pub fn tick(&mut self, now: DateTime<Utc>, page_count: usize) -> bool {
        match self.state {
            RotationState::PausedUntil(until) => {
                if now >= until {
                    self.state = RotationState::Rotating {
                        next_advance: now + self.interval,
                    };
                }
                false
            }
            RotationState::Rotating { next_advance } => {
                if now < next_advance {
                    return false;
                }
                self.state = RotationState::Rotating {
                    next_advance: now + self.interval,
                };
                page_count > 1
            }
        }
    }
}
