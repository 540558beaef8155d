//! Upstream payload normalization.
//!
//! The availability API has changed shape several times, so each known
//! layout gets its own [`PayloadParser`]. All of them share the same entry
//! rules:
//!
//! - the payload must carry a `data` member, otherwise the result is
//!   [`ParseOutcome::Unrecognized`] (a warning, not a failure);
//! - when `data.data` exists it wins over `data`;
//! - dates never fail a record, they fall back to sentinels.
//!
//! Shape assumptions stay inside this module.

mod calendar;
mod centres;
pub mod fields;
mod flat;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{AvailabilityRecord, Schema};

pub use calendar::CalendarParser;
pub use centres::CentresParser;
pub use flat::FlatParser;

/// Result of interpreting one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Records(Vec<AvailabilityRecord>),
    /// The payload could not be interpreted; carries the reason
    Unrecognized(String),
}

impl ParseOutcome {
    fn missing_container() -> Self {
        Self::Unrecognized("payload has no data container".to_string())
    }

    /// Records, or an empty list when nothing could be interpreted.
    pub fn into_records(self) -> Vec<AvailabilityRecord> {
        match self {
            Self::Records(records) => records,
            Self::Unrecognized(_) => Vec::new(),
        }
    }
}

/// One parse step for one upstream layout.
pub trait PayloadParser: Send + Sync {
    fn schema(&self) -> Schema;

    /// Normalize `payload`, stamping every record with `refreshed_at`.
    fn parse(&self, payload: &Value, refreshed_at: DateTime<Utc>) -> ParseOutcome;
}

/// Parser for the configured layout.
pub fn parser_for(schema: Schema) -> Arc<dyn PayloadParser> {
    match schema {
        Schema::Flat => Arc::new(FlatParser),
        Schema::Centres => Arc::new(CentresParser),
        Schema::Calendar => Arc::new(CalendarParser),
    }
}

/// Find the data container, preferring the doubly nested `data.data`.
pub fn locate_data(payload: &Value) -> Option<&Value> {
    let outer = payload.get("data").filter(|v| !v.is_null())?;
    match outer.get("data") {
        Some(inner) if !inner.is_null() => Some(inner),
        _ => Some(outer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn locate_prefers_deeper_level() {
        let payload = json!({ "data": { "data": { "germany": {} }, "france": {} } });
        assert_eq!(locate_data(&payload), Some(&json!({ "germany": {} })));
    }

    #[test]
    fn locate_falls_back_to_shallow_level() {
        let payload = json!({ "data": { "germany": {} } });
        assert_eq!(locate_data(&payload), Some(&json!({ "germany": {} })));

        let payload = json!({ "data": { "data": null, "germany": {} } });
        assert_eq!(
            locate_data(&payload),
            Some(&json!({ "data": null, "germany": {} }))
        );
    }

    #[test]
    fn locate_rejects_missing_container() {
        assert_eq!(locate_data(&json!({ "countries": [] })), None);
        assert_eq!(locate_data(&json!({ "data": null })), None);
        assert_eq!(locate_data(&json!([1, 2, 3])), None);
        assert_eq!(locate_data(&json!("data")), None);
    }

    #[test]
    fn every_parser_reports_missing_container() {
        for schema in [Schema::Flat, Schema::Centres, Schema::Calendar] {
            let parser = parser_for(schema);
            assert_eq!(parser.schema(), schema);
            let outcome = parser.parse(&json!({ "status": "ok" }), Utc::now());
            assert!(matches!(outcome, ParseOutcome::Unrecognized(_)));
            assert!(outcome.into_records().is_empty());
        }
    }
}
