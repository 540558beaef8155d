//! Country → centre nested layout.
//!
//! ```text
//! { "data": { "country": "Germany", "centres": { "Berlin": {..}, .. } } }   single country
//! { "data": { "germany": { "Berlin": {..} }, "france": { .. } } }          multi country
//! ```
//!
//! A centre carries `earliest_date`, `slots: [{ applicants, datetime }]` and an
//! optional `error`.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::fields::{applicant_label, centre_error, display_label, field, text, text_field};
use super::{ParseOutcome, PayloadParser, locate_data};
use crate::models::{AvailabilityRecord, CentreRecord, DateField, Schema, SlotRecord};
use crate::utils::dates::{combine, parse_date, parse_datetime};

const COUNTRY_KEYS: &[&str] = &["country", "country_name", "countryName"];
const CENTRE_LIST_KEYS: &[&str] = &["centres", "centers", "visa_centres", "visaCentres"];
const NAME_KEYS: &[&str] = &["name", "centre", "center", "city"];
const EARLIEST_KEYS: &[&str] = &[
    "earliest_date",
    "earliestDate",
    "earliest_available_date",
    "earliestAvailableDate",
    "next_available_date",
    "nextAvailableDate",
];
const SLOT_KEYS: &[&str] = &["slots", "available_slots", "availableSlots", "appointments"];
const APPLICANT_KEYS: &[&str] = &["applicants", "applicant", "applicant_numbers", "applicantNumbers"];
const DATETIME_KEYS: &[&str] = &["datetime", "date_time", "dateTime"];

/// Parser for the single- and multi-country centre layouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CentresParser;

impl PayloadParser for CentresParser {
    fn schema(&self) -> Schema {
        Schema::Centres
    }

    fn parse(&self, payload: &Value, refreshed_at: DateTime<Utc>) -> ParseOutcome {
        let Some(data) = locate_data(payload) else {
            return ParseOutcome::missing_container();
        };
        let Some(countries) = data.as_object() else {
            return ParseOutcome::Unrecognized("data is not an object".to_string());
        };

        let record = |label: &str, centres: Option<&Value>| AvailabilityRecord {
            group_label: display_label(label),
            subgroups: parse_centres(centres),
            last_refreshed_at: refreshed_at,
        };

        if let Some(country) = text_field(data, COUNTRY_KEYS) {
            return ParseOutcome::Records(vec![record(&country, field(data, CENTRE_LIST_KEYS))]);
        }

        let records = countries
            .iter()
            .filter_map(|(country, centres)| {
                if centres.is_object() || centres.is_array() {
                    Some(record(country, Some(centres)))
                } else {
                    log::debug!("Skipping non-container entry for '{}'", country);
                    None
                }
            })
            .collect();

        ParseOutcome::Records(records)
    }
}

fn parse_centres(value: Option<&Value>) -> Vec<CentreRecord> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, centre)| parse_centre(name, centre))
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, centre)| {
                let name =
                    text_field(centre, NAME_KEYS).unwrap_or_else(|| format!("Centre {}", i + 1));
                parse_centre(&name, centre)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_centre(name: &str, value: &Value) -> CentreRecord {
    if !value.is_object() {
        return CentreRecord {
            name: name.to_string(),
            earliest_available_date: DateField::Missing,
            slots: Vec::new(),
            error: None,
        };
    }

    let slots = field(value, SLOT_KEYS)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(parse_slot).collect())
        .unwrap_or_default();

    CentreRecord {
        name: name.to_string(),
        earliest_available_date: parse_date(text_field(value, EARLIEST_KEYS).as_deref()),
        slots,
        error: centre_error(field(value, &["error"])),
    }
}

fn parse_slot(value: &Value) -> SlotRecord {
    if !value.is_object() {
        return SlotRecord {
            applicant_label: String::new(),
            date_time: parse_datetime(text(value).as_deref()),
        };
    }
    let date_time = match text_field(value, DATETIME_KEYS) {
        Some(raw) => parse_datetime(Some(&raw)),
        None => combine(
            &parse_date(text_field(value, &["date"]).as_deref()),
            text_field(value, &["time"]).as_deref(),
        ),
    };
    SlotRecord {
        applicant_label: applicant_label(field(value, APPLICANT_KEYS)),
        date_time,
    }
}
