//! Job lifecycle status and scheduling priority.

use super::{ParseJobPriorityError, ParseJobStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Job lifecycle status.
///
/// Two orderings exist over these states. [`JobStatus::flow_rank`] governs
/// which transitions are allowed and [`JobStatus::display_rank`] governs how
/// the TV board orders jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Material or request has been received.
    #[default]
    Received,
    /// The job has been quoted.
    Quoted,
    /// The job is on the shop floor.
    InProgress,
    /// Work has stopped temporarily.
    Paused,
    /// All work is done.
    Completed,
}

impl JobStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Received,
        Self::Quoted,
        Self::InProgress,
        Self::Paused,
        Self::Completed,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Quoted => "QUOTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Paused => "PAUSED",
            Self::Completed => "COMPLETED",
        }
    }

    /// Position in the forward lifecycle flow.
    ///
    /// `Paused` shares its rank with `InProgress` so work can be paused and
    /// resumed without counting as a regression.
    #[must_use]
    pub const fn flow_rank(self) -> u8 {
        match self {
            Self::Received => 0,
            Self::Quoted => 1,
            Self::InProgress | Self::Paused => 2,
            Self::Completed => 3,
        }
    }

    /// Position on the TV board, most actionable first.
    #[must_use]
    pub const fn display_rank(self) -> u8 {
        match self {
            Self::InProgress => 0,
            Self::Quoted => 1,
            Self::Received => 2,
            Self::Paused => 3,
            Self::Completed => 4,
        }
    }

    /// Returns `true` when moving to `next` keeps the job moving forward or
    /// in place.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        next.flow_rank() >= self.flow_rank()
    }

    /// Returns `true` for the terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobStatus {
    type Error = ParseJobStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "RECEIVED" => Ok(Self::Received),
            "QUOTED" => Ok(Self::Quoted),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "PAUSED" => Ok(Self::Paused),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(ParseJobStatusError(value.to_owned())),
        }
    }
}

/// Scheduling priority attached to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPriority {
    /// Needs attention first.
    High,
    /// Normal priority.
    Medium,
    /// Can wait.
    Low,
}

impl JobPriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    /// Sort rank of an optional priority; jobs without one sort last.
    #[must_use]
    pub const fn rank(priority: Option<Self>) -> u8 {
        match priority {
            Some(Self::High) => 0,
            Some(Self::Medium) => 1,
            Some(Self::Low) => 2,
            None => 3,
        }
    }
}

impl fmt::Display for JobPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobPriority {
    type Error = ParseJobPriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            _ => Err(ParseJobPriorityError(value.to_owned())),
        }
    }
}
