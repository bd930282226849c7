//! Cross-surface notification message.

use serde::{Deserialize, Serialize};

/// Message exchanged between surfaces sharing a process.
///
/// Serializes as `{"type": "job-updated"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    /// A job was mutated; listeners should re-fetch.
    JobUpdated,
}
