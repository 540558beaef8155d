// src/models/mod.rs

//! Domain models for the dashboard.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod availability;
mod config;
pub mod region;
mod view;

// Re-export all public types
pub use availability::{
    AvailabilityRecord, AvailabilityStatus, CentreError, CentreRecord, DateField,
    INVALID_DATE_LABEL, NO_DATE_LABEL, SlotRecord, Summary,
};
pub use config::{Config, DisplayConfig, PollingConfig, Schema, SourceConfig};
pub use region::RegionStyle;
pub use view::{PollOutcome, Toast, ToastLevel, ViewState, filter_records, find_record};
