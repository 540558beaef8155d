// src/pipeline/fetch.rs

//! One poll cycle: fetch, normalize, classify.

use chrono::Utc;

use crate::models::{PollOutcome, Toast, ViewState};
use crate::services::{AvailabilitySource, ParseOutcome, PayloadParser};

/// Run one fetch-and-normalize attempt. Never fails; failures become outcomes.
pub async fn poll_once(source: &dyn AvailabilitySource, parser: &dyn PayloadParser) -> PollOutcome {
    match source.fetch().await {
        Ok(payload) => match parser.parse(&payload, Utc::now()) {
            ParseOutcome::Records(records) => {
                log::info!(
                    "Fetched {} records from {} ({:?} layout)",
                    records.len(),
                    source.describe(),
                    parser.schema()
                );
                PollOutcome::Loaded(records)
            }
            ParseOutcome::Unrecognized(reason) => {
                log::warn!("No valid data from {}: {}", source.describe(), reason);
                PollOutcome::NoData(reason)
            }
        },
        Err(e) => {
            log::error!("Failed to fetch from {}: {}", source.describe(), e);
            PollOutcome::Failed(e.to_string())
        }
    }
}

/// Single poll into a fresh view, for one-shot commands.
pub async fn run_fetch(
    source: &dyn AvailabilitySource,
    parser: &dyn PayloadParser,
    retain_on_error: bool,
) -> (ViewState, Toast) {
    let mut view = ViewState::new(retain_on_error);
    view.begin_refresh();
    let outcome = poll_once(source, parser).await;
    let toast = view.apply(outcome, Utc::now());
    (view, toast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::models::ToastLevel;
    use crate::services::normalize::CentresParser;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct Fixed(Option<Value>);

    #[async_trait]
    impl AvailabilitySource for Fixed {
        async fn fetch(&self) -> Result<Value> {
            self.0
                .clone()
                .ok_or_else(|| AppError::Io(std::io::Error::other("connection refused")))
        }

        fn describe(&self) -> String {
            "fixture".to_string()
        }
    }

    #[tokio::test]
    async fn loaded_payload_becomes_records() {
        let source = Fixed(Some(json!({ "data": { "germany": { "Berlin": { "slots": [] } } } })));
        let (view, toast) = run_fetch(&source, &CentresParser, false).await;
        assert_eq!(toast.level, ToastLevel::Success);
        assert_eq!(view.records().len(), 1);
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn missing_container_is_a_warning() {
        let source = Fixed(Some(json!({ "message": "maintenance" })));
        let outcome = poll_once(&source, &CentresParser).await;
        assert!(matches!(outcome, PollOutcome::NoData(_)));

        let (view, toast) = run_fetch(&source, &CentresParser, false).await;
        assert_eq!(toast.level, ToastLevel::Warning);
        assert!(view.records().is_empty());
    }

    #[tokio::test]
    async fn transport_error_is_an_error_toast() {
        let (view, toast) = run_fetch(&Fixed(None), &CentresParser, false).await;
        assert_eq!(toast.level, ToastLevel::Error);
        assert!(toast.message.contains("connection refused"));
        assert!(view.records().is_empty());
    }
}
