//! Identifier and validated scalar types for the job domain.

use super::JobDomainError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

/// Longest accepted job number, matching the `jobs.job_number` column.
pub const JOB_NUMBER_MAX_LEN: usize = 50;
/// Longest accepted part number, matching the `jobs.part_number` column.
pub const PART_NUMBER_MAX_LEN: usize = 100;

static JOB_NUMBER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^V-\d+$").ok());
static PART_NUMBER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^P-.+$").ok());

fn matches(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern
        .as_ref()
        .is_some_and(|regex| regex.is_match(value))
}

fn check_length(value: &str, field: &'static str, max: usize) -> Result<(), JobDomainError> {
    if value.chars().count() > max {
        return Err(JobDomainError::FieldTooLong { field, max });
    }
    Ok(())
}

/// Unique identifier for a job record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Creates a new random job identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a job identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for JobId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shop job number in `V-<digits>` format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobNumber(String);

impl JobNumber {
    /// Creates a validated job number.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidJobNumber`] when the trimmed value is
    /// not `V-` followed by one or more digits, or
    /// [`JobDomainError::FieldTooLong`] beyond [`JOB_NUMBER_MAX_LEN`]
    /// characters.
    pub fn new(value: impl Into<String>) -> Result<Self, JobDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if !matches(&JOB_NUMBER_PATTERN, normalized) {
            return Err(JobDomainError::InvalidJobNumber(raw));
        }
        check_length(normalized, "job number", JOB_NUMBER_MAX_LEN)?;
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the job number as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for JobNumber {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for JobNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Customer part number, always prefixed with `P-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartNumber(String);

impl PartNumber {
    /// Creates a validated part number.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidPartNumber`] when the trimmed value
    /// does not start with `P-` followed by at least one character, or
    /// [`JobDomainError::FieldTooLong`] beyond [`PART_NUMBER_MAX_LEN`]
    /// characters.
    pub fn new(value: impl Into<String>) -> Result<Self, JobDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if !matches(&PART_NUMBER_PATTERN, normalized) {
            return Err(JobDomainError::InvalidPartNumber(raw));
        }
        check_length(normalized, "part number", PART_NUMBER_MAX_LEN)?;
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the part number as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PartNumber {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PartNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
