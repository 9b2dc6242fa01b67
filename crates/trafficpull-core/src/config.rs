use std::time::Duration;

use chrono::NaiveDate;

use crate::error::CoreError;
use crate::period::{month_ranges, DateRange};
use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};

pub const DEFAULT_START_DATE: &str = "2019-01-01";
pub const DEFAULT_END_DATE: &str = "2023-06-30";
pub const DEFAULT_API_BASE_URL: &str = "https://analyticsreporting.googleapis.com/v4/";

#[derive(Debug, Clone)]
pub struct Config {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub output_dir: String,
    pub properties_db: String,
    /// Inline `domain=view_id,...` list; takes precedence over the database.
    pub properties: Option<String>,
    pub api_base_url: String,
    pub credentials: CredentialSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    /// Path to a service-account JSON key read from `TRAFFICPULL_KEY_FILE`.
    ServiceAccountKey(String),
    /// Pre-issued OAuth access token read from `TRAFFICPULL_ACCESS_TOKEN`.
    AccessToken(String),
}

impl Config {
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let start_date = parse_date(
            "TRAFFICPULL_START_DATE",
            &lookup("TRAFFICPULL_START_DATE").unwrap_or_else(|| DEFAULT_START_DATE.to_string()),
        )?;
        let end_date = parse_date(
            "TRAFFICPULL_END_DATE",
            &lookup("TRAFFICPULL_END_DATE").unwrap_or_else(|| DEFAULT_END_DATE.to_string()),
        )?;
        if end_date < start_date {
            return Err(CoreError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }

        let credentials = match (
            lookup("TRAFFICPULL_ACCESS_TOKEN").filter(|v| !v.trim().is_empty()),
            lookup("TRAFFICPULL_KEY_FILE").filter(|v| !v.trim().is_empty()),
        ) {
            (Some(token), _) => CredentialSource::AccessToken(token.trim().to_string()),
            (None, Some(path)) => CredentialSource::ServiceAccountKey(path),
            (None, None) => {
                return Err(CoreError::Config(
                    "TRAFFICPULL_KEY_FILE or TRAFFICPULL_ACCESS_TOKEN is required".to_string(),
                ))
            }
        };

        Ok(Self {
            start_date,
            end_date,
            max_attempts: lookup("TRAFFICPULL_MAX_ATTEMPTS")
                .and_then(|v| v.parse::<u32>().ok())
                .map(|v| v.clamp(1, 10))
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            retry_delay_secs: lookup("TRAFFICPULL_RETRY_DELAY_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5),
            output_dir: lookup("TRAFFICPULL_OUTPUT_DIR").unwrap_or_else(|| "./output".to_string()),
            properties_db: lookup("TRAFFICPULL_PROPERTIES_DB")
                .unwrap_or_else(|| "./data/properties.duckdb".to_string()),
            properties: lookup("TRAFFICPULL_PROPERTIES").filter(|v| !v.trim().is_empty()),
            api_base_url: lookup("TRAFFICPULL_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            credentials,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.retry_delay_secs))
    }

    pub fn months(&self) -> Vec<DateRange> {
        month_ranges(self.start_date, self.end_date)
    }
}

fn parse_date(key: &str, raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| CoreError::Config(format!("{key}: invalid date '{raw}', expected YYYY-MM-DD ({e})")))
}
