use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Closed date interval, serialised the way the reporting API expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(rename = "startDate")]
    pub start: NaiveDate,
    #[serde(rename = "endDate")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if end < start {
            return Err(CoreError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The whole calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date - Days::new(u64::from(date.day0()));
        let end = start
            .checked_add_months(Months::new(1))
            .map(|next| next - Days::new(1))
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// Join key for the month, `YYYY-MM-DD` of the first day.
    pub fn month_key(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }
}

/// Calendar months from the month of `start` up to the month containing `end`.
///
/// Every range starts on the first and ends on the last day of its month,
/// even when `start` or `end` fall mid-month.
pub fn month_ranges(start: NaiveDate, end: NaiveDate) -> Vec<DateRange> {
    let mut months = Vec::new();
    let mut current = DateRange::month_of(start);
    while current.start <= end {
        let next = current.end.succ_opt();
        months.push(current);
        match next {
            Some(day) => current = DateRange::month_of(day),
            None => break,
        }
    }
    months
}

/// Output column order, matching the serialised field names of [`PeriodRow`].
pub const PERIOD_COLUMNS: [&str; 10] = [
    "totalUsers",
    "totalSessions",
    "organicTotalUsers",
    "organicSessions",
    "totalUsersFiltered",
    "totalSessionsFiltered",
    "organicTotalUsersFiltered",
    "organicSessionsFiltered",
    "month",
    "domain",
];

/// One property's metrics for one calendar month across all four segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRow {
    pub total_users: i64,
    pub total_sessions: i64,
    pub organic_total_users: i64,
    pub organic_sessions: i64,
    pub total_users_filtered: i64,
    pub total_sessions_filtered: i64,
    pub organic_total_users_filtered: i64,
    pub organic_sessions_filtered: i64,
    pub month: String,
    pub domain: String,
}

impl PeriodRow {
    /// Cell values in [`PERIOD_COLUMNS`] order.
    pub fn to_record(&self) -> [String; 10] {
        [
            self.total_users.to_string(),
            self.total_sessions.to_string(),
            self.organic_total_users.to_string(),
            self.organic_sessions.to_string(),
            self.total_users_filtered.to_string(),
            self.total_sessions_filtered.to_string(),
            self.organic_total_users_filtered.to_string(),
            self.organic_sessions_filtered.to_string(),
            self.month.clone(),
            self.domain.clone(),
        ]
    }
}
