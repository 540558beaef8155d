//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Quick filters are picked with the keys `1`..`9`.
pub const MAX_QUICK_FILTERS: usize = 9;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Upstream endpoint settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Refresh timer settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Dashboard rendering settings
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.source.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::validation(format!(
                "source.base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.polling.period_secs == 0 {
            return Err(AppError::validation("polling.period_secs must be > 0"));
        }
        if self.display.label_width == 0 {
            return Err(AppError::validation("display.label_width must be > 0"));
        }
        if self.display.quick_filters.len() > MAX_QUICK_FILTERS {
            return Err(AppError::config(format!(
                "display.quick_filters holds {} entries, at most {} can be bound to keys",
                self.display.quick_filters.len(),
                MAX_QUICK_FILTERS
            )));
        }
        Ok(())
    }
}

/// Upstream payload layout, one parse step per variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    /// Flat list of countries with time strings
    Flat,
    /// Country → centre nested objects
    #[default]
    Centres,
    /// Per-city slot calendars
    Calendar,
}

/// Upstream HTTP endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Endpoint returning the availability JSON
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Which parse step to apply to the payload
    #[serde(default)]
    pub schema: Schema,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            schema: Schema::default(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Refresh timer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between automatic refreshes
    #[serde(default = "defaults::period")]
    pub period_secs: u64,

    /// Keep the last good records (marked stale) when a poll fails
    #[serde(default)]
    pub retain_on_error: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            period_secs: defaults::period(),
            retain_on_error: false,
        }
    }
}

/// Dashboard rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Slot counts above this are "available", at or below are "limited"
    #[serde(default = "defaults::limited_threshold")]
    pub limited_threshold: usize,

    /// Time chips shown per card before collapsing into "+N"
    #[serde(default = "defaults::max_times")]
    pub max_times: usize,

    /// Search shortcuts listed under the search line
    #[serde(default = "defaults::quick_filters")]
    pub quick_filters: Vec<String>,

    /// Column width for record labels
    #[serde(default = "defaults::label_width")]
    pub label_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            limited_threshold: defaults::limited_threshold(),
            max_times: defaults::max_times(),
            quick_filters: defaults::quick_filters(),
            label_width: defaults::label_width(),
        }
    }
}

mod defaults {
    // Source defaults
    pub fn base_url() -> String {
        "http://localhost:8000/api/visa-slots".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; visa-slots/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Polling defaults
    pub fn period() -> u64 {
        180
    }

    // Display defaults
    pub fn limited_threshold() -> usize {
        5
    }
    pub fn max_times() -> usize {
        4
    }
    pub fn quick_filters() -> Vec<String> {
        vec![
            "Germany".into(),
            "USA".into(),
            "Canada".into(),
            "Australia".into(),
        ]
    }
    pub fn label_width() -> usize {
        24
    }
}
