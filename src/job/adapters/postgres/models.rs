//! Diesel row models for job persistence.

use super::schema::jobs;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

/// Query result row for job records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobRow {
    /// Job identifier.
    pub id: uuid::Uuid,
    /// Unique shop job number.
    pub job_number: String,
    /// Customer part number.
    pub part_number: String,
    /// Optional title.
    pub title: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Optional notes.
    pub notes: Option<String>,
    /// Pieces ordered.
    pub total_pieces: i32,
    /// Pieces finished.
    pub pieces_completed: i32,
    /// Lifecycle status.
    pub status: String,
    /// Free-form ETA.
    pub eta_text: Option<String>,
    /// Optional priority.
    pub priority: Option<String>,
    /// Optional shop area.
    pub shop_area: Option<String>,
    /// Optional machine.
    pub machine: Option<String>,
    /// Date the work arrived.
    pub date_received: NaiveDate,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for job records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJobRow {
    /// Job identifier.
    pub id: uuid::Uuid,
    /// Unique shop job number.
    pub job_number: String,
    /// Customer part number.
    pub part_number: String,
    /// Optional title.
    pub title: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Optional notes.
    pub notes: Option<String>,
    /// Pieces ordered.
    pub total_pieces: i32,
    /// Pieces finished.
    pub pieces_completed: i32,
    /// Lifecycle status.
    pub status: String,
    /// Free-form ETA.
    pub eta_text: Option<String>,
    /// Optional priority.
    pub priority: Option<String>,
    /// Optional shop area.
    pub shop_area: Option<String>,
    /// Optional machine.
    pub machine: Option<String>,
    /// Date the work arrived.
    pub date_received: NaiveDate,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Column-scoped changeset. `None` leaves a column untouched; for the
/// nullable text columns `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = jobs)]
pub struct JobChangeset {
    /// Lifecycle status.
    pub status: Option<String>,
    /// Pieces ordered.
    pub total_pieces: Option<i32>,
    /// Pieces finished.
    pub pieces_completed: Option<i32>,
    /// Free-form ETA.
    pub eta_text: Option<Option<String>>,
    /// Optional title.
    pub title: Option<Option<String>>,
    /// Optional description.
    pub description: Option<Option<String>>,
    /// Optional notes.
    pub notes: Option<Option<String>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
