//! Dashboard view state and search filtering.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::availability::{AvailabilityRecord, Summary};

/// Records whose label contains `term`, case-insensitively, in input order.
///
/// An empty term keeps everything; a term of only spaces matches labels
/// that contain a space.
pub fn filter_records<'a>(
    records: &'a [AvailabilityRecord],
    term: &str,
) -> Vec<&'a AvailabilityRecord> {
    records.iter().filter(|r| r.matches(term)).collect()
}

/// Record named `name`: an exact case-insensitive label match wins, otherwise
/// the only record whose label contains it.
pub fn find_record<'a>(
    records: &'a [AvailabilityRecord],
    name: &str,
) -> Option<&'a AvailabilityRecord> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    if let Some(exact) = records
        .iter()
        .find(|r| r.group_label.to_lowercase() == wanted)
    {
        return Some(exact);
    }
    match filter_records(records, &wanted).as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// Result of one poll cycle, as seen by the view.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Fresh records replacing the previous list
    Loaded(Vec<AvailabilityRecord>),
    /// Payload arrived but held nothing usable
    NoData(String),
    /// Transport or decode failure
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Warning,
    Error,
}

/// Transient notification raised by a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Toast {
    fn new(level: ToastLevel, message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            level,
            message: message.into(),
            at,
        }
    }
}

/// Everything the dashboard needs to draw itself.
///
/// The record list is shared so snapshots stay cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    records: Arc<Vec<AvailabilityRecord>>,
    search: String,
    loading: bool,
    loaded_once: bool,
    retain_on_error: bool,
    last_success: Option<DateTime<Utc>>,
    stale_since: Option<DateTime<Utc>>,
    generation: u64,
}

impl ViewState {
    pub fn new(retain_on_error: bool) -> Self {
        Self {
            retain_on_error,
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[AvailabilityRecord] {
        &self.records
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Spinner only before the first result; later refreshes keep rows visible.
    pub fn show_spinner(&self) -> bool {
        self.loading && !self.loaded_once
    }

    /// Set when a failed poll kept older records on screen.
    pub fn stale_since(&self) -> Option<DateTime<Utc>> {
        self.stale_since
    }

    /// Bumped whenever the visible rows may have changed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.generation += 1;
    }

    pub fn begin_refresh(&mut self) {
        self.loading = true;
    }

    /// Apply a poll result and return the notification to surface.
    pub fn apply(&mut self, outcome: PollOutcome, now: DateTime<Utc>) -> Toast {
        self.loading = false;
        self.loaded_once = true;
        self.generation += 1;

        match outcome {
            PollOutcome::Loaded(records) => {
                self.records = Arc::new(records);
                self.last_success = Some(now);
                self.stale_since = None;
                Toast::new(ToastLevel::Success, "Visa slots updated successfully", now)
            }
            PollOutcome::NoData(reason) => {
                self.records = Arc::default();
                self.stale_since = None;
                Toast::new(
                    ToastLevel::Warning,
                    format!("No valid data received: {reason}"),
                    now,
                )
            }
            PollOutcome::Failed(reason) => {
                if self.retain_on_error && !self.records.is_empty() {
                    self.stale_since = self.stale_since.or(self.last_success);
                } else {
                    self.records = Arc::default();
                    self.stale_since = None;
                }
                Toast::new(
                    ToastLevel::Error,
                    format!("Failed to fetch visa slots: {reason}"),
                    now,
                )
            }
        }
    }

    /// Rows matching the current search term.
    pub fn visible(&self) -> Vec<&AvailabilityRecord> {
        filter_records(&self.records, &self.search)
    }

    pub fn summary(&self, threshold: usize) -> Summary {
        Summary::from_records(self.visible(), threshold)
    }
}
