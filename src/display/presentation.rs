//! Pure filtering, ordering and paging of job lists.
//!
//! Every function here is deterministic for a given input and `now`, so the
//! board can re-derive its visible page from scratch after any change.

use crate::config::DisplaySettings;
use crate::job::domain::{Job, JobPriority, JobStatus};
use chrono::{DateTime, TimeDelta, Utc};
use std::cmp::Ordering;

/// Jobs kept in the rotation by default.
pub const MAX_JOBS_SHOWN: usize = 50;

/// Days a completed job stays on the board by default.
pub const COMPLETED_VISIBILITY_DAYS: i64 = 7;

/// Which jobs a view includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    /// Everything except completed jobs.
    Active,
    /// Every job.
    #[default]
    All,
    /// Completed jobs only.
    Completed,
}

impl StatusFilter {
    /// Returns `true` when a job in `status` passes the filter.
    #[must_use]
    pub const fn includes(self, status: JobStatus) -> bool {
        match self {
            Self::Active => !status.is_terminal(),
            Self::All => true,
            Self::Completed => status.is_terminal(),
        }
    }
}

/// Ordering applied to a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortMode {
    /// Display rank, then most recently updated.
    #[default]
    Status,
    /// Most recently updated first.
    Recent,
    /// Priority high to low (unset last), then most recently updated.
    Priority,
}

impl SortMode {
    /// Sorts `jobs` in place. The sort is stable.
    pub fn sort(self, jobs: &mut [Job]) {
        jobs.sort_by(|a, b| self.compare(a, b));
    }

    /// Orders two jobs under this mode.
    #[must_use]
    pub fn compare(self, a: &Job, b: &Job) -> Ordering {
        match self {
            Self::Status => display_order(a, b),
            Self::Recent => newest_first(a, b),
            Self::Priority => JobPriority::rank(a.priority())
                .cmp(&JobPriority::rank(b.priority()))
                .then_with(|| newest_first(a, b)),
        }
    }
}

/// Viewer-selected filter, ordering and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayOptions {
    /// Jobs included.
    pub filter: StatusFilter,
    /// Ordering.
    pub sort: SortMode,
    /// Jobs per page.
    pub page_size: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self::with_page_size(DisplaySettings::default().page_size)
    }
}

impl DisplayOptions {
    /// Default filter and ordering with the given page size.
    #[must_use]
    pub const fn with_page_size(page_size: usize) -> Self {
        Self {
            filter: StatusFilter::All,
            sort: SortMode::Status,
            page_size,
        }
    }

    /// Filters and orders a prepared list.
    #[must_use]
    pub fn arrange(self, jobs: Vec<Job>) -> Vec<Job> {
        let mut arranged: Vec<Job> = jobs
            .into_iter()
            .filter(|job| self.filter.includes(job.status()))
            .collect();
        self.sort.sort(&mut arranged);
        arranged
    }
}

fn newest_first(a: &Job, b: &Job) -> Ordering {
    b.updated_at().cmp(&a.updated_at())
}

/// Returns `true` when `job` is completed and was last touched more than
/// `max_age` before `now`.
#[must_use]
pub fn is_stale_completed(job: &Job, now: DateTime<Utc>, max_age: TimeDelta) -> bool {
    job.status().is_terminal() && now.signed_duration_since(job.updated_at()) > max_age
}

/// Drops completed jobs older than the default visibility window.
#[must_use]
pub fn hide_stale_completed(jobs: Vec<Job>, now: DateTime<Utc>) -> Vec<Job> {
    hide_completed_older_than(jobs, now, TimeDelta::days(COMPLETED_VISIBILITY_DAYS))
}

/// Drops completed jobs last updated more than `max_age` before `now`.
#[must_use]
pub fn hide_completed_older_than(
    jobs: Vec<Job>,
    now: DateTime<Utc>,
    max_age: TimeDelta,
) -> Vec<Job> {
    jobs.into_iter()
        .filter(|job| !is_stale_completed(job, now, max_age))
        .collect()
}

/// Orders jobs by display rank, then most recently updated. Stable.
pub fn sort_for_display(jobs: &mut [Job]) {
    jobs.sort_by(display_order);
}

fn display_order(a: &Job, b: &Job) -> Ordering {
    a.status()
        .display_rank()
        .cmp(&b.status().display_rank())
        .then_with(|| newest_first(a, b))
}

/// Caps the list at [`MAX_JOBS_SHOWN`] and returns page `page_index`.
///
/// Out-of-range pages are empty.
#[must_use]
pub fn cap_and_paginate(jobs: Vec<Job>, page_size: usize, page_index: usize) -> Vec<Job> {
    paginate(cap(jobs, MAX_JOBS_SHOWN), page_size, page_index)
}

/// Truncates `jobs` to at most `max` entries.
#[must_use]
pub fn cap(mut jobs: Vec<Job>, max: usize) -> Vec<Job> {
    jobs.truncate(max);
    jobs
}

/// Returns the `page_index`-th run of `page_size` jobs.
#[must_use]
pub fn paginate(jobs: Vec<Job>, page_size: usize, page_index: usize) -> Vec<Job> {
    jobs.into_iter()
        .skip(page_index.saturating_mul(page_size))
        .take(page_size)
        .collect()
}

/// Number of pages needed for `len` jobs. Never less than one.
#[must_use]
pub const fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    let pages = len.div_ceil(page_size);
    if pages == 0 { 1 } else { pages }
}

/// Hides stale completions, sorts for display and caps, with the default
/// limits.
#[must_use]
pub fn prepare_for_display(jobs: Vec<Job>, now: DateTime<Utc>) -> Vec<Job> {
    let mut visible = hide_stale_completed(jobs, now);
    sort_for_display(&mut visible);
    cap(visible, MAX_JOBS_SHOWN)
}

/// [`prepare_for_display`] using the limits in `settings`.
#[must_use]
pub fn prepare_with_settings(
    jobs: Vec<Job>,
    now: DateTime<Utc>,
    settings: &DisplaySettings,
) -> Vec<Job> {
    let mut visible = hide_completed_older_than(jobs, now, settings.completed_visibility());
    sort_for_display(&mut visible);
    cap(visible, settings.max_jobs_shown)
}
