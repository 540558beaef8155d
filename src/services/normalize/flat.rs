//! Flat country list layout.
//!
//! ```text
//! { "data": [ { "country": "Germany", "availableTimes": ["09:00"], "nextAvailableDate": "2024-03-15" } ] }
//! ```
//!
//! Each entry becomes a record with a single centre named after the country.
//! Upstream `totalSlots`/`availableSlots` counters are ignored; the count is
//! the number of listed times.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::fields::{centre_error, display_label, field, text, text_field};
use super::{ParseOutcome, PayloadParser, locate_data};
use crate::models::{AvailabilityRecord, CentreRecord, Schema, SlotRecord};
use crate::utils::dates::{combine, parse_date};

const LABEL_KEYS: &[&str] = &["country", "name", "region"];
const TIMES_KEYS: &[&str] = &["availableTimes", "available_times", "times"];
const DATE_KEYS: &[&str] = &["nextAvailableDate", "next_available_date", "date"];

/// Parser for the flat list layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatParser;

impl PayloadParser for FlatParser {
    fn schema(&self) -> Schema {
        Schema::Flat
    }

    fn parse(&self, payload: &Value, refreshed_at: DateTime<Utc>) -> ParseOutcome {
        let Some(data) = locate_data(payload) else {
            return ParseOutcome::missing_container();
        };
        let Some(entries) = data.as_array() else {
            return ParseOutcome::Unrecognized("data is not a list".to_string());
        };

        let records = entries
            .iter()
            .filter_map(|entry| {
                let Some(label) = text_field(entry, LABEL_KEYS) else {
                    log::debug!("Skipping entry without a country: {}", entry);
                    return None;
                };
                Some(AvailabilityRecord {
                    group_label: display_label(&label),
                    subgroups: vec![parse_entry(&label, entry)],
                    last_refreshed_at: refreshed_at,
                })
            })
            .collect();

        ParseOutcome::Records(records)
    }
}

fn parse_entry(label: &str, entry: &Value) -> CentreRecord {
    let date = parse_date(text_field(entry, DATE_KEYS).as_deref());
    let slots = field(entry, TIMES_KEYS)
        .and_then(Value::as_array)
        .map(|times| {
            times
                .iter()
                .filter_map(text)
                .map(|time| SlotRecord {
                    applicant_label: String::new(),
                    date_time: combine(&date, Some(&time)),
                })
                .collect()
        })
        .unwrap_or_default();

    CentreRecord {
        name: display_label(label),
        earliest_available_date: date,
        slots,
        error: centre_error(field(entry, &["error"])),
    }
}
