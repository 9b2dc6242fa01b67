use chrono::NaiveDate;
use thiserror::Error;

use crate::filter::Segment;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("row has {got} cells but the table has {expected} columns")]
    RowWidth { expected: usize, got: usize },
}

/// Terminal outcome of a report fetch once the retry budget is spent.
///
/// Callers get this back as a value: an exhausted fetch means "no data" for
/// one (property, month, segment) and never aborts the run.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("no data after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

#[derive(Debug, Error)]
pub enum PeriodError {
    #[error("{segment} report has {rows} rows for month {month}, expected at most one")]
    DuplicateMonth {
        segment: Segment,
        month: String,
        rows: usize,
    },
}
