//! Period Aggregator: four segment reports for one property and month,
//! merged into a single [`PeriodRow`].

use tracing::{info, warn};

use crate::error::PeriodError;
use crate::fetch::Fetcher;
use crate::filter::Segment;
use crate::normalize::normalize;
use crate::period::{DateRange, PeriodRow};
use crate::property::Property;
use crate::report::{MetricReport, METRIC_SESSIONS, METRIC_USERS};
use crate::table::NormalizedTable;

pub const MONTH_COLUMN: &str = "month";
pub const DOMAIN_COLUMN: &str = "domain";

/// Output names for the users and sessions metrics of a segment.
pub fn metric_columns(segment: Segment) -> (&'static str, &'static str) {
    match segment {
        Segment::Total => ("totalUsers", "totalSessions"),
        Segment::Organic => ("organicTotalUsers", "organicSessions"),
        Segment::NonBlog => ("totalUsersFiltered", "totalSessionsFiltered"),
        Segment::OrganicNonBlog => ("organicTotalUsersFiltered", "organicSessionsFiltered"),
    }
}

/// Normalize one segment's report, rename its metrics and stamp the month.
///
/// A whole-month query without dimensions returns at most one row; more than
/// that would fan out the join, so it is rejected.
pub fn segment_table(
    segment: Segment,
    report: Option<&MetricReport>,
    month: &str,
) -> Result<NormalizedTable, PeriodError> {
    let mut table = normalize(report);
    if table.row_count() > 1 {
        return Err(PeriodError::DuplicateMonth {
            segment,
            month: month.to_string(),
            rows: table.row_count(),
        });
    }
    let (users, sessions) = metric_columns(segment);
    table.rename_columns(&[(METRIC_USERS, users), (METRIC_SESSIONS, sessions)]);
    Ok(table.with_constant_column(MONTH_COLUMN, month))
}

/// Left-join total, organic, total-filtered and organic-filtered on `month`,
/// zero-filling unmatched cells, and attach the domain.
///
/// `None` when the total table has no row for the month.
pub fn merge_period(
    total: &NormalizedTable,
    organic: &NormalizedTable,
    total_filtered: &NormalizedTable,
    organic_filtered: &NormalizedTable,
    domain: &str,
) -> Option<PeriodRow> {
    let merged = total
        .left_join(organic, MONTH_COLUMN, "0")
        .left_join(total_filtered, MONTH_COLUMN, "0")
        .left_join(organic_filtered, MONTH_COLUMN, "0")
        .with_constant_column(DOMAIN_COLUMN, domain);

    if merged.is_empty() {
        return None;
    }

    // Columns absent from the merge (no header in the response) count as zero.
    let counts = |segment: Segment| {
        let (users, sessions) = metric_columns(segment);
        let cell = |column: &str| merged.get(0, column).map(parse_count).unwrap_or(0);
        (cell(users), cell(sessions))
    };
    let (total_users, total_sessions) = counts(Segment::Total);
    let (organic_total_users, organic_sessions) = counts(Segment::Organic);
    let (total_users_filtered, total_sessions_filtered) = counts(Segment::NonBlog);
    let (organic_total_users_filtered, organic_sessions_filtered) =
        counts(Segment::OrganicNonBlog);

    Some(PeriodRow {
        total_users,
        total_sessions,
        organic_total_users,
        organic_sessions,
        total_users_filtered,
        total_sessions_filtered,
        organic_total_users_filtered,
        organic_sessions_filtered,
        month: merged.get(0, MONTH_COLUMN).unwrap_or_default().to_string(),
        domain: domain.to_string(),
    })
}

/// Metric values arrive as text. Unparsable or blank cells count as zero.
pub fn parse_count(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return n;
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => f.round() as i64,
        _ => {
            if !trimmed.is_empty() {
                warn!(value = %raw, "non-numeric metric value, counting as zero");
            }
            0
        }
    }
}

/// Fetch, normalize and merge all four segments for one property and month.
///
/// Returns `Ok(None)` when the total or organic fetch ran out of retries, or
/// when the total report has no row; the run moves on to the next period.
/// The filtered fetches are only issued once both primary fetches succeeded.
#[tracing::instrument(
    skip_all,
    fields(domain = %property.domain, view_id = %property.view_id, month = %range.start)
)]
pub async fn aggregate(
    fetcher: &Fetcher<'_>,
    property: &Property,
    range: &DateRange,
) -> Result<Option<PeriodRow>, PeriodError> {
    let view_id = property.view_id.as_str();

    let organic = fetcher.fetch(view_id, range, Segment::Organic).await;
    let total = fetcher.fetch(view_id, range, Segment::Total).await;
    let (Ok(organic), Ok(total)) = (organic, total) else {
        warn!("primary report unavailable after retries, skipping period");
        return Ok(None);
    };

    let organic_filtered = fetcher
        .fetch(view_id, range, Segment::OrganicNonBlog)
        .await
        .ok();
    let total_filtered = fetcher.fetch(view_id, range, Segment::NonBlog).await.ok();

    let month = range.month_key();
    let total = segment_table(Segment::Total, Some(&total), &month)?;
    let organic = segment_table(Segment::Organic, Some(&organic), &month)?;
    let total_filtered = segment_table(Segment::NonBlog, total_filtered.as_ref(), &month)?;
    let organic_filtered =
        segment_table(Segment::OrganicNonBlog, organic_filtered.as_ref(), &month)?;

    let row = merge_period(
        &total,
        &organic,
        &total_filtered,
        &organic_filtered,
        &property.domain,
    );
    if row.is_none() {
        info!("total report has no rows for the month, nothing to emit");
    }
    Ok(row)
}
