// src/render.rs

//! Plain-text rendering of the dashboard.
//!
//! Every function here is pure: it takes view data and returns the text to
//! print, so the CLI decides when to draw and tests can inspect frames.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::models::{
    AvailabilityRecord, CentreRecord, DateField, DisplayConfig, INVALID_DATE_LABEL, NO_DATE_LABEL,
    Schema, SlotRecord, Toast, ToastLevel, ViewState,
};
use crate::pipeline::{DashboardSnapshot, format_remaining};
use crate::utils::dates::short_date;
use crate::utils::{pad, truncate};

pub const TITLE: &str = "Visa Slot Availability";
pub const LOADING_TEXT: &str = "Loading visa slots...";
pub const NO_DATA_TEXT: &str = "No data available";
pub const NO_MATCHES_TEXT: &str = "No matches found";

/// Full frame for a live dashboard.
pub fn render_snapshot(snapshot: &DashboardSnapshot, display: &DisplayConfig) -> String {
    render_dashboard(&snapshot.view, Some(snapshot.remaining_secs), display)
}

/// Header, quick filters and cards. `remaining_secs` is `None` for one-shot
/// output where there is no next refresh.
pub fn render_dashboard(
    view: &ViewState,
    remaining_secs: Option<u64>,
    display: &DisplayConfig,
) -> String {
    let mut lines = vec![render_header(view, remaining_secs, display)];

    if let Some(since) = view.stale_since() {
        lines.push(format!(
            "  ! Showing data from {} (last refresh failed)",
            local_time(since)
        ));
    }

    lines.push(render_quick_filters(&display.quick_filters));
    if !view.search().is_empty() {
        lines.push(format!("  Search: {}", view.search()));
    }
    lines.push(String::new());

    if view.show_spinner() {
        lines.push(format!("  {}", LOADING_TEXT));
        return lines.join("\n");
    }

    let visible = view.visible();
    if visible.is_empty() {
        lines.push(empty_state(view));
        return lines.join("\n");
    }

    for record in visible {
        lines.push(render_card(record, display));
    }
    lines.join("\n")
}

fn render_header(view: &ViewState, remaining_secs: Option<u64>, display: &DisplayConfig) -> String {
    let summary = view.summary(display.limited_threshold);
    let mut header = format!(
        "{}  [available {}] [limited {}] [unavailable {}]  {} slots, {} applicants",
        TITLE,
        summary.available,
        summary.limited,
        summary.unavailable,
        summary.slots,
        summary.applicants
    );
    if let Some(secs) = remaining_secs {
        header.push_str(&format!("  next refresh {}", format_remaining(secs)));
    }
    if view.is_loading() && !view.show_spinner() {
        header.push_str("  (refreshing)");
    }
    header
}

/// Numbered quick-filter line, `1` being the first entry.
pub fn render_quick_filters(filters: &[String]) -> String {
    if filters.is_empty() {
        return String::new();
    }
    let items: Vec<String> = filters
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}:{}", i + 1, name))
        .collect();
    format!("  Quick filters  {}", items.join("  "))
}

fn empty_state(view: &ViewState) -> String {
    if view.search().is_empty() || view.records().is_empty() {
        format!("  {}", NO_DATA_TEXT)
    } else {
        format!("  {} for \"{}\"", NO_MATCHES_TEXT, view.search())
    }
}

/// One record as a three-line card.
pub fn render_card(record: &AvailabilityRecord, display: &DisplayConfig) -> String {
    let region = record.region();
    let status = record.status(display.limited_threshold);
    let label = pad(
        &truncate(&record.group_label, display.label_width),
        display.label_width,
    );

    let next = record
        .earliest_date()
        .map(|d| short_date(&d))
        .unwrap_or_else(|| NO_DATE_LABEL.to_string());

    let mut lines = vec![
        format!(
            "{} {} {:<12} {} slots / {} centres",
            region.flag,
            label,
            status.as_str().to_uppercase(),
            record.available_count(),
            record.subgroups.len()
        ),
        format!("    Next: {}{}", next, time_chips(record, display.max_times)),
    ];
    lines.push(format!(
        "    Updated {}",
        local_time(record.last_refreshed_at)
    ));
    lines.join("\n")
}

fn time_chips(record: &AvailabilityRecord, max_times: usize) -> String {
    let times: Vec<String> = record
        .available_slots()
        .filter_map(|s| s.date_time.value())
        .map(|dt| dt.format("%H:%M").to_string())
        .collect();
    if times.is_empty() {
        return String::new();
    }

    let mut chips: Vec<String> = times
        .iter()
        .take(max_times)
        .map(|t| format!("[{}]", t))
        .collect();
    if times.len() > max_times {
        chips.push(format!("+{}", times.len() - max_times));
    }
    format!("   Times: {}", chips.join(" "))
}

/// Detail view of one record. The calendar layout groups slots by day.
pub fn render_detail(record: &AvailabilityRecord, display: &DisplayConfig, schema: Schema) -> String {
    let status = record.status(display.limited_threshold);
    let mut lines = vec![format!(
        "{} {} ({}, {} slots)",
        record.region().flag,
        record.group_label,
        status.as_str(),
        record.available_count()
    )];

    if record.subgroups.is_empty() {
        lines.push(format!("  {}", NO_DATA_TEXT));
        return lines.join("\n");
    }

    match schema {
        Schema::Calendar => lines.extend(calendar_lines(record)),
        Schema::Flat | Schema::Centres => {
            for centre in &record.subgroups {
                lines.extend(centre_lines(centre, display));
            }
        }
    }
    lines.join("\n")
}

fn centre_lines(centre: &CentreRecord, display: &DisplayConfig) -> Vec<String> {
    let mut lines = vec![format!(
        "  {} [{}] earliest {}",
        centre.name,
        centre.status(display.limited_threshold).as_str(),
        centre.earliest_available_date.label_with(short_date)
    )];

    if let Some(error) = &centre.error {
        lines.push(format!("    error {}: {}", error.code, error.description));
        return lines;
    }

    if centre.slots.is_empty() {
        lines.push("    no slots".to_string());
    }
    for slot in &centre.slots {
        let when = slot
            .date_time
            .label_with(|dt| dt.format("%b %-d %H:%M").to_string());
        lines.push(format!("    {}{}", when, applicant_badges(slot)));
    }
    lines
}

/// Date bucket for calendar grouping. Undated slots sort after dated ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Day {
    Date(NaiveDate),
    Missing,
    Invalid,
}

impl Day {
    fn of(slot: &SlotRecord) -> Self {
        match &slot.date_time {
            DateField::Value(dt) => Self::Date(dt.date()),
            DateField::Missing => Self::Missing,
            DateField::Invalid(_) => Self::Invalid,
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Date(d) => d.format("%a %b %-d").to_string(),
            Self::Missing => NO_DATE_LABEL.to_string(),
            Self::Invalid => INVALID_DATE_LABEL.to_string(),
        }
    }
}

fn calendar_lines(record: &AvailabilityRecord) -> Vec<String> {
    let mut days: BTreeMap<Day, Vec<(&str, &SlotRecord)>> = BTreeMap::new();
    for centre in record.subgroups.iter().filter(|c| c.error.is_none()) {
        for slot in &centre.slots {
            days.entry(Day::of(slot))
                .or_default()
                .push((centre.name.as_str(), slot));
        }
    }

    let mut lines = Vec::new();
    for centre in record.subgroups.iter().filter(|c| c.error.is_some()) {
        if let Some(error) = &centre.error {
            lines.push(format!(
                "  {}: error {}: {}",
                centre.name, error.code, error.description
            ));
        }
    }
    if days.is_empty() {
        lines.push("  no slots".to_string());
    }
    for (day, mut slots) in days {
        slots.sort_by_key(|(_, slot)| slot.date_time.value().copied());
        lines.push(format!("  {}", day.label()));
        for (centre, slot) in slots {
            let time = slot
                .date_time
                .value()
                .map(|dt| dt.format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string());
            lines.push(format!("    {} {}{}", time, centre, applicant_badges(slot)));
        }
    }
    lines
}

fn applicant_badges(slot: &SlotRecord) -> String {
    let badges: Vec<String> = slot.applicants().map(|a| format!("({})", a)).collect();
    if badges.is_empty() {
        String::new()
    } else {
        format!("  applicants {}", badges.join(" "))
    }
}

/// One-line notification.
pub fn render_toast(toast: &Toast) -> String {
    let tag = match toast.level {
        ToastLevel::Success => "ok",
        ToastLevel::Warning => "warning",
        ToastLevel::Error => "error",
    };
    format!("[{}] {} {}", local_time(toast.at), tag, toast.message)
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CentreError, PollOutcome};
    use chrono::NaiveDateTime;

    fn at(raw: &str) -> DateField<NaiveDateTime> {
        DateField::Value(NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").unwrap())
    }

    fn slot(raw: &str, applicants: &str) -> SlotRecord {
        SlotRecord {
            applicant_label: applicants.to_string(),
            date_time: at(raw),
        }
    }

    fn centre(name: &str, slots: Vec<SlotRecord>) -> CentreRecord {
        CentreRecord {
            name: name.to_string(),
            earliest_available_date: slots
                .iter()
                .filter_map(|s| s.date_time.value().map(|dt| dt.date()))
                .min()
                .map(DateField::Value)
                .unwrap_or(DateField::Missing),
            slots,
            error: None,
        }
    }

    fn germany() -> AvailabilityRecord {
        AvailabilityRecord {
            group_label: "Germany".to_string(),
            subgroups: vec![
                centre(
                    "Berlin",
                    vec![
                        slot("2024-03-05 09:00", "1, 2"),
                        slot("2024-03-05 09:30", "3"),
                        slot("2024-03-06 10:00", ""),
                    ],
                ),
                centre("Munich", vec![slot("2024-03-04 11:00", "1")]),
            ],
            last_refreshed_at: Utc::now(),
        }
    }

    fn loaded(records: Vec<AvailabilityRecord>) -> ViewState {
        let mut view = ViewState::new(false);
        view.apply(PollOutcome::Loaded(records), Utc::now());
        view
    }

    #[test]
    fn spinner_before_first_load() {
        let mut view = ViewState::new(false);
        view.begin_refresh();
        let frame = render_dashboard(&view, Some(180), &DisplayConfig::default());
        assert!(frame.contains(LOADING_TEXT));
        assert!(frame.contains("next refresh 3:00"));
    }

    #[test]
    fn refresh_keeps_rows_visible() {
        let mut view = loaded(vec![germany()]);
        view.begin_refresh();
        let frame = render_dashboard(&view, Some(42), &DisplayConfig::default());
        assert!(!frame.contains(LOADING_TEXT));
        assert!(frame.contains("(refreshing)"));
        assert!(frame.contains("Germany"));
    }

    #[test]
    fn empty_states_distinguish_search() {
        let display = DisplayConfig::default();
        let mut view = loaded(vec![germany()]);
        view.set_search("peru");
        let frame = render_dashboard(&view, None, &display);
        assert!(frame.contains("No matches found for \"peru\""));

        let empty = loaded(vec![]);
        assert!(render_dashboard(&empty, None, &display).contains(NO_DATA_TEXT));
    }

    #[test]
    fn card_shows_counts_and_time_chips() {
        let display = DisplayConfig {
            max_times: 2,
            ..DisplayConfig::default()
        };
        let card = render_card(&germany(), &display);
        assert!(card.contains("🇩🇪"));
        assert!(card.contains("4 slots / 2 centres"));
        assert!(card.contains("LIMITED"));
        assert!(card.contains("Next: Mar 4"));
        assert!(card.contains("[09:00] [09:30] +2"));
    }

    #[test]
    fn card_without_dates_uses_sentinel() {
        let record = AvailabilityRecord {
            group_label: "Atlantis".to_string(),
            subgroups: vec![],
            last_refreshed_at: Utc::now(),
        };
        let card = render_card(&record, &DisplayConfig::default());
        assert!(card.contains("🏳️"));
        assert!(card.contains("UNAVAILABLE"));
        assert!(card.contains(NO_DATE_LABEL));
    }

    #[test]
    fn detail_lists_centre_errors() {
        let mut record = germany();
        record.subgroups[1].error = Some(CentreError {
            code: 503,
            description: "Service unavailable".to_string(),
        });
        let detail = render_detail(&record, &DisplayConfig::default(), Schema::Centres);
        assert!(detail.contains("Munich [unavailable]"));
        assert!(detail.contains("error 503: Service unavailable"));
        assert!(detail.contains("Mar 5 09:00  applicants (1) (2)"));
    }

    #[test]
    fn calendar_detail_groups_by_day() {
        let mut record = germany();
        record.subgroups[0].slots.push(SlotRecord {
            applicant_label: String::new(),
            date_time: DateField::Invalid("soon".to_string()),
        });
        let detail = render_detail(&record, &DisplayConfig::default(), Schema::Calendar);
        let lines: Vec<&str> = detail.lines().map(str::trim).collect();

        let monday = lines.iter().position(|l| *l == "Mon Mar 4").unwrap();
        let tuesday = lines.iter().position(|l| *l == "Tue Mar 5").unwrap();
        let invalid = lines.iter().position(|l| *l == INVALID_DATE_LABEL).unwrap();
        assert!(monday < tuesday && tuesday < invalid);
        assert_eq!(lines[monday + 1], "11:00 Munich  applicants (1)");
        assert_eq!(lines[invalid + 1], "--:-- Berlin");
    }

    #[test]
    fn quick_filters_are_numbered() {
        let line = render_quick_filters(&["Germany".to_string(), "USA".to_string()]);
        assert_eq!(line, "  Quick filters  1:Germany  2:USA");
        assert_eq!(render_quick_filters(&[]), "");
    }

    #[test]
    fn toast_carries_level_tag() {
        let mut view = ViewState::new(false);
        let toast = view.apply(PollOutcome::Failed("timeout".into()), Utc::now());
        let line = render_toast(&toast);
        assert!(line.contains("error Failed to fetch visa slots: timeout"));
    }
}
