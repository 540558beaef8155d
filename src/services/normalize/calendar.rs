//! Per-city slot calendar layout.
//!
//! ```text
//! { "data": [ { "country": "Germany", "city": "Berlin",
//!               "calendar": { "2025-02-03": ["09:00", { "time": "10:00", "applicants": "1, 2" }] },
//!               "error": null } ] }
//! { "data": { "germany": [ { "city": "Berlin", "calendar": {..} } ] } }
//! { "data": { "germany": { "Berlin": { "2025-02-03": [..] } } } }
//! ```
//!
//! Cities become centres, grouped by country in first-seen order.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use super::fields::{applicant_label, centre_error, display_label, field, text, text_field};
use super::{ParseOutcome, PayloadParser, locate_data};
use crate::models::{AvailabilityRecord, CentreRecord, DateField, Schema, SlotRecord};
use crate::utils::dates::{combine, parse_date, parse_datetime};

const COUNTRY_KEYS: &[&str] = &["country", "country_name", "countryName"];
const CITY_KEYS: &[&str] = &["city", "name", "centre", "center"];
const CALENDAR_KEYS: &[&str] = &["calendar", "dates", "availability", "slots"];
const DAY_SLOT_KEYS: &[&str] = &["times", "slots"];
const APPLICANT_KEYS: &[&str] = &["applicants", "applicant", "applicant_numbers"];
const UNKNOWN_COUNTRY: &str = "Unknown region";

/// Parser for the per-city calendar layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarParser;

impl PayloadParser for CalendarParser {
    fn schema(&self) -> Schema {
        Schema::Calendar
    }

    fn parse(&self, payload: &Value, refreshed_at: DateTime<Utc>) -> ParseOutcome {
        let Some(data) = locate_data(payload) else {
            return ParseOutcome::missing_container();
        };

        let mut groups = Groups::default();
        match data {
            Value::Array(entries) => groups.extend_entries(None, entries),
            Value::Object(map) => match field(data, &["cities"]).and_then(Value::as_array) {
                Some(entries) => groups.extend_entries(None, entries),
                None => {
                    for (country, cities) in map {
                        match cities {
                            Value::Array(entries) => {
                                groups.extend_entries(Some(country.as_str()), entries)
                            }
                            Value::Object(by_city) => {
                                for (city, value) in by_city {
                                    groups.push(country, parse_city(city, value));
                                }
                            }
                            _ => log::debug!("Skipping non-container entry for '{}'", country),
                        }
                    }
                }
            },
            _ => return ParseOutcome::Unrecognized("data is neither a list nor an object".into()),
        }

        ParseOutcome::Records(groups.into_records(refreshed_at))
    }
}

/// Centres grouped by display label, in first-seen order.
#[derive(Default)]
struct Groups(Vec<(String, Vec<CentreRecord>)>);

impl Groups {
    fn push(&mut self, country: &str, centre: CentreRecord) {
        let label = display_label(country);
        match self
            .0
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&label))
        {
            Some((_, centres)) => centres.push(centre),
            None => self.0.push((label, vec![centre])),
        }
    }

    fn extend_entries(&mut self, country: Option<&str>, entries: &[Value]) {
        for (i, entry) in entries.iter().enumerate() {
            let country = text_field(entry, COUNTRY_KEYS)
                .or_else(|| country.map(str::to_string))
                .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());
            let city = text_field(entry, CITY_KEYS).unwrap_or_else(|| format!("City {}", i + 1));
            self.push(&country, parse_city(&city, entry));
        }
    }

    fn into_records(self, refreshed_at: DateTime<Utc>) -> Vec<AvailabilityRecord> {
        self.0
            .into_iter()
            .map(|(group_label, subgroups)| AvailabilityRecord {
                group_label,
                subgroups,
                last_refreshed_at: refreshed_at,
            })
            .collect()
    }
}

/// `value` is either a city entry (with a calendar member) or a bare calendar.
fn parse_city(name: &str, value: &Value) -> CentreRecord {
    let is_entry = field(value, CALENDAR_KEYS).is_some()
        || value.get("error").is_some()
        || field(value, CITY_KEYS).is_some();
    let (calendar, error) = if is_entry {
        (field(value, CALENDAR_KEYS), centre_error(field(value, &["error"])))
    } else {
        (Some(value), None)
    };

    let days = calendar.map(parse_days).unwrap_or_default();
    let earliest = earliest_day(&days);
    let slots = days.into_iter().flat_map(|(_, slots)| slots).collect();

    CentreRecord {
        name: name.to_string(),
        earliest_available_date: earliest,
        slots,
        error,
    }
}

fn parse_days(calendar: &Value) -> Vec<(DateField<NaiveDate>, Vec<SlotRecord>)> {
    match calendar {
        Value::Object(days) => days
            .iter()
            .map(|(day, slots)| {
                let date = parse_date(Some(day.as_str()));
                let slots = day_slots(&date, Some(slots));
                (date, slots)
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(_) => {
                    let date = parse_date(text_field(item, &["date", "day"]).as_deref());
                    let slots = day_slots(&date, field(item, DAY_SLOT_KEYS));
                    (date, slots)
                }
                other => {
                    let raw = text(other);
                    let slot = SlotRecord {
                        applicant_label: String::new(),
                        date_time: parse_datetime(raw.as_deref()),
                    };
                    (parse_date(raw.as_deref()), vec![slot])
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn day_slots(date: &DateField<NaiveDate>, value: Option<&Value>) -> Vec<SlotRecord> {
    let bare = |time: Option<&str>| SlotRecord {
        applicant_label: String::new(),
        date_time: combine(date, time),
    };

    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Object(_) => SlotRecord {
                    applicant_label: applicant_label(field(item, APPLICANT_KEYS)),
                    date_time: match text_field(item, &["datetime", "date_time", "dateTime"]) {
                        Some(raw) => parse_datetime(Some(&raw)),
                        None => combine(date, text_field(item, &["time"]).as_deref()),
                    },
                },
                other => bare(text(other).as_deref()),
            })
            .collect(),
        Some(other) => {
            log::debug!("Ignoring non-list slots for a day: {}", other);
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Earliest parsed day that has at least one slot.
fn earliest_day(days: &[(DateField<NaiveDate>, Vec<SlotRecord>)]) -> DateField<NaiveDate> {
    let open = || days.iter().filter(|(_, slots)| !slots.is_empty());
    if let Some(date) = open().filter_map(|(d, _)| d.value().copied()).min() {
        return DateField::Value(date);
    }
    open()
        .find_map(|(d, _)| match d {
            DateField::Invalid(raw) => Some(DateField::Invalid(raw.clone())),
            _ => None,
        })
        .unwrap_or(DateField::Missing)
}
