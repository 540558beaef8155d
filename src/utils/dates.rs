// src/utils/dates.rs

//! Lenient date parsing for upstream fields.
//!
//! Nothing here returns an error: absent text becomes `Missing`, text that no
//! known layout accepts becomes `Invalid` carrying the raw value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::DateField;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p"];

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn datetime_from(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
}

fn date_from(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
}

/// Parse a calendar date, accepting full timestamps as well.
pub fn parse_date(raw: Option<&str>) -> DateField<NaiveDate> {
    let Some(text) = non_blank(raw) else {
        return DateField::Missing;
    };
    date_from(text)
        .or_else(|| datetime_from(text).map(|dt| dt.date()))
        .map(DateField::Value)
        .unwrap_or_else(|| DateField::Invalid(text.to_string()))
}

/// Parse a timestamp; a bare date is taken as midnight.
pub fn parse_datetime(raw: Option<&str>) -> DateField<NaiveDateTime> {
    let Some(text) = non_blank(raw) else {
        return DateField::Missing;
    };
    datetime_from(text)
        .or_else(|| date_from(text).and_then(|d| d.and_hms_opt(0, 0, 0)))
        .map(DateField::Value)
        .unwrap_or_else(|| DateField::Invalid(text.to_string()))
}

/// Parse a wall-clock time such as `09:30`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let text = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(text, f).ok())
}

/// Join a calendar day with a time-of-day string.
pub fn combine(date: &DateField<NaiveDate>, time: Option<&str>) -> DateField<NaiveDateTime> {
    let Some(text) = non_blank(time) else {
        return match date {
            DateField::Value(d) => d
                .and_hms_opt(0, 0, 0)
                .map(DateField::Value)
                .unwrap_or(DateField::Missing),
            DateField::Missing => DateField::Missing,
            DateField::Invalid(raw) => DateField::Invalid(raw.clone()),
        };
    };
    match (date, parse_time(text)) {
        (DateField::Value(d), Some(t)) => DateField::Value(d.and_time(t)),
        (DateField::Missing, _) => DateField::Missing,
        (DateField::Invalid(raw), _) => DateField::Invalid(raw.clone()),
        (DateField::Value(d), None) => DateField::Invalid(format!("{d} {text}")),
    }
}

/// `Mar 15` style label used on cards.
pub fn short_date(date: &NaiveDate) -> String {
    date.format("%b %-d").to_string()
}
