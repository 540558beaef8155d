//! Normalized availability records.
//!
//! These are the only types the dashboard renders. Every parse step in
//! `services::normalize` produces them, whatever the upstream layout was.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use super::region::{self, RegionStyle};

/// Label shown for a date that upstream did not send.
pub const NO_DATE_LABEL: &str = "No date available";

/// Label shown for a date that upstream sent but could not be parsed.
pub const INVALID_DATE_LABEL: &str = "Invalid date";

/// A defensively parsed date or timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DateField<T> {
    Value(T),
    Missing,
    /// Raw upstream text that did not parse
    Invalid(String),
}

impl<T> DateField<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Format the value, or fall back to the sentinel labels.
    pub fn label_with(&self, format: impl FnOnce(&T) -> String) -> String {
        match self {
            Self::Value(v) => format(v),
            Self::Missing => NO_DATE_LABEL.to_string(),
            Self::Invalid(_) => INVALID_DATE_LABEL.to_string(),
        }
    }
}

/// Availability tier of a centre or record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    Unavailable,
    Limited,
    Available,
}

impl AvailabilityStatus {
    /// Tier for a slot count. `threshold` is the highest "limited" count.
    pub fn from_count(count: usize, threshold: usize) -> Self {
        if count > threshold {
            Self::Available
        } else if count > 0 {
            Self::Limited
        } else {
            Self::Unavailable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Limited => "limited",
            Self::Unavailable => "unavailable",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Available => "green",
            Self::Limited => "orange",
            Self::Unavailable => "red",
        }
    }
}

/// Upstream-reported failure for one centre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CentreError {
    pub code: i64,
    pub description: String,
}

/// A single bookable appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotRecord {
    /// Verbatim applicant text, e.g. `"1, 2, 3"`
    pub applicant_label: String,
    pub date_time: DateField<NaiveDateTime>,
}

impl SlotRecord {
    /// Applicant badges, split from the verbatim label.
    pub fn applicants(&self) -> impl Iterator<Item = &str> {
        self.applicant_label
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn applicant_count(&self) -> usize {
        self.applicants().count()
    }
}

/// A visa centre (or city) within a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CentreRecord {
    pub name: String,
    pub earliest_available_date: DateField<NaiveDate>,
    pub slots: Vec<SlotRecord>,
    pub error: Option<CentreError>,
}

impl CentreRecord {
    /// Slots the user may act on. Zero whenever upstream flagged an error.
    pub fn available_count(&self) -> usize {
        if self.error.is_some() {
            0
        } else {
            self.slots.len()
        }
    }

    pub fn status(&self, threshold: usize) -> AvailabilityStatus {
        AvailabilityStatus::from_count(self.available_count(), threshold)
    }

    pub fn applicant_count(&self) -> usize {
        if self.error.is_some() {
            return 0;
        }
        self.slots.iter().map(SlotRecord::applicant_count).sum()
    }
}

/// One country/region as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityRecord {
    pub group_label: String,
    pub subgroups: Vec<CentreRecord>,
    pub last_refreshed_at: DateTime<Utc>,
}

impl AvailabilityRecord {
    pub fn available_count(&self) -> usize {
        self.subgroups.iter().map(CentreRecord::available_count).sum()
    }

    /// Best tier across centres; a record without centres is unavailable.
    pub fn status(&self, threshold: usize) -> AvailabilityStatus {
        self.subgroups
            .iter()
            .map(|c| c.status(threshold))
            .max()
            .unwrap_or(AvailabilityStatus::Unavailable)
    }

    /// Earliest date across healthy centres.
    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.subgroups
            .iter()
            .filter(|c| c.error.is_none())
            .filter_map(|c| c.earliest_available_date.value().copied())
            .min()
    }

    /// Slots of healthy centres, in upstream order.
    pub fn available_slots(&self) -> impl Iterator<Item = &SlotRecord> {
        self.subgroups
            .iter()
            .filter(|c| c.error.is_none())
            .flat_map(|c| c.slots.iter())
    }

    pub fn region(&self) -> RegionStyle {
        region::lookup(&self.group_label)
    }

    /// Case-insensitive substring match on the label only. The term is used
    /// as typed, surrounding spaces included.
    pub fn matches(&self, term: &str) -> bool {
        self.group_label
            .to_lowercase()
            .contains(&term.to_lowercase())
    }
}

/// Dashboard-level aggregates, always reduced from normalized records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub records: usize,
    pub centres: usize,
    pub slots: usize,
    pub applicants: usize,
    pub available: usize,
    pub limited: usize,
    pub unavailable: usize,
}

impl Summary {
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a AvailabilityRecord>,
        threshold: usize,
    ) -> Self {
        records.into_iter().fold(Self::default(), |mut acc, record| {
            acc.records += 1;
            acc.centres += record.subgroups.len();
            acc.slots += record.available_count();
            acc.applicants += record
                .subgroups
                .iter()
                .map(CentreRecord::applicant_count)
                .sum::<usize>();
            match record.status(threshold) {
                AvailabilityStatus::Available => acc.available += 1,
                AvailabilityStatus::Limited => acc.limited += 1,
                AvailabilityStatus::Unavailable => acc.unavailable += 1,
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(applicants: &str) -> SlotRecord {
        SlotRecord {
            applicant_label: applicants.to_string(),
            date_time: DateField::Missing,
        }
    }

    fn centre(name: &str, slots: usize, error: Option<CentreError>) -> CentreRecord {
        CentreRecord {
            name: name.to_string(),
            earliest_available_date: DateField::Missing,
            slots: (0..slots).map(|_| slot("1, 2")).collect(),
            error,
        }
    }

    fn record(label: &str, subgroups: Vec<CentreRecord>) -> AvailabilityRecord {
        AvailabilityRecord {
            group_label: label.to_string(),
            subgroups,
            last_refreshed_at: Utc::now(),
        }
    }

    fn outage() -> CentreError {
        CentreError {
            code: 503,
            description: "Service unavailable".to_string(),
        }
    }

    #[test]
    fn error_forces_unavailable_even_with_slots() {
        let c = centre("Berlin", 12, Some(outage()));
        assert_eq!(c.available_count(), 0);
        assert_eq!(c.status(5), AvailabilityStatus::Unavailable);
        assert_eq!(c.applicant_count(), 0);
    }

    #[test]
    fn status_tiers_follow_slot_count() {
        assert_eq!(centre("a", 0, None).status(5), AvailabilityStatus::Unavailable);
        assert_eq!(centre("a", 3, None).status(5), AvailabilityStatus::Limited);
        assert_eq!(centre("a", 5, None).status(5), AvailabilityStatus::Limited);
        assert_eq!(centre("a", 6, None).status(5), AvailabilityStatus::Available);
    }

    #[test]
    fn record_takes_best_centre_status() {
        let r = record(
            "Germany",
            vec![centre("Berlin", 7, Some(outage())), centre("Munich", 2, None)],
        );
        assert_eq!(r.available_count(), 2);
        assert_eq!(r.status(5), AvailabilityStatus::Limited);

        let empty = record("Spain", vec![]);
        assert_eq!(empty.status(5), AvailabilityStatus::Unavailable);
    }

    #[test]
    fn applicants_split_on_commas() {
        let s = slot("101, 102,103 , ");
        assert_eq!(s.applicants().collect::<Vec<_>>(), vec!["101", "102", "103"]);
        assert_eq!(s.applicant_label, "101, 102,103 , ");
        assert_eq!(slot("").applicant_count(), 0);
    }

    #[test]
    fn matches_label_case_insensitively() {
        let r = record("United Kingdom", vec![centre("London", 1, None)]);
        assert!(r.matches("kING"));
        assert!(r.matches(""));
        assert!(!r.matches("london"));
        assert!(r.matches("united "));
        assert!(!r.matches(" kingdom "));
    }

    #[test]
    fn earliest_date_skips_degraded_centres() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let mut broken = centre("Berlin", 0, Some(outage()));
        broken.earliest_available_date = DateField::Value(d("2025-01-02"));
        let mut ok = centre("Munich", 1, None);
        ok.earliest_available_date = DateField::Value(d("2025-03-04"));
        let mut bad = centre("Hamburg", 1, None);
        bad.earliest_available_date = DateField::Invalid("soon".into());

        let r = record("Germany", vec![broken, ok, bad]);
        assert_eq!(r.earliest_date(), Some(d("2025-03-04")));
    }

    #[test]
    fn summary_reduces_records() {
        let records = vec![
            record("Germany", vec![centre("Berlin", 7, None)]),
            record("France", vec![centre("Paris", 2, None), centre("Lyon", 1, Some(outage()))]),
            record("Spain", vec![]),
        ];
        let summary = Summary::from_records(&records, 5);

        assert_eq!(summary.records, 3);
        assert_eq!(summary.centres, 3);
        assert_eq!(summary.slots, 9);
        assert_eq!(summary.applicants, 18);
        assert_eq!((summary.available, summary.limited, summary.unavailable), (1, 1, 1));
    }

    #[test]
    fn date_labels_use_sentinels() {
        let missing: DateField<NaiveDate> = DateField::Missing;
        let invalid: DateField<NaiveDate> = DateField::Invalid("31/31".into());
        assert_eq!(missing.label_with(|d| d.to_string()), NO_DATE_LABEL);
        assert_eq!(invalid.label_with(|d| d.to_string()), INVALID_DATE_LABEL);
    }
}
