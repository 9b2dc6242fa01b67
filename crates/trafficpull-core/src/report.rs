//! Request and response shapes of the reporting API (`reports:batchGet`).
//!
//! Response types default every field so that partial or unexpected payloads
//! still deserialize; the normalizer decides what is usable.

use serde::{Deserialize, Serialize};

use crate::filter::{DimensionFilterClause, Filter};
use crate::period::DateRange;

pub const METRIC_USERS: &str = "ga:users";
pub const METRIC_SESSIONS: &str = "ga:sessions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub view_id: String,
    pub date_ranges: Vec<DateRange>,
    pub dimensions: Vec<Dimension>,
    pub metrics: Vec<Metric>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimension_filter_clauses: Vec<DimensionFilterClause>,
}

impl ReportRequest {
    /// Users and sessions for one view over one range, no dimension breakdown.
    pub fn users_and_sessions(view_id: &str, range: DateRange, filter: Option<&Filter>) -> Self {
        Self {
            view_id: view_id.to_string(),
            date_ranges: vec![range],
            dimensions: Vec::new(),
            metrics: vec![
                Metric {
                    expression: METRIC_USERS.to_string(),
                },
                Metric {
                    expression: METRIC_SESSIONS.to_string(),
                },
            ],
            dimension_filter_clauses: filter.map(Filter::to_clauses).unwrap_or_default(),
        }
    }
}

/// Body of a batch request; this job always sends exactly one report request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetRequest<'a> {
    pub report_requests: [&'a ReportRequest; 1],
}

impl<'a> BatchGetRequest<'a> {
    pub fn single(request: &'a ReportRequest) -> Self {
        Self {
            report_requests: [request],
        }
    }
}

/// Raw API response. `reports` is `None` when the payload lacks the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricReport {
    #[serde(default)]
    pub reports: Option<Vec<Report>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    pub column_header: ColumnHeader,
    pub data: ReportData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnHeader {
    pub dimensions: Vec<String>,
    pub metric_header: MetricHeader,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricHeader {
    pub metric_header_entries: Vec<MetricHeaderEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricHeaderEntry {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub metric_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportData {
    pub rows: Vec<ReportRow>,
    pub row_count: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportRow {
    pub dimensions: Vec<String>,
    /// One entry per requested date range, each holding the metric values.
    pub metrics: Vec<DateRangeValues>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRangeValues {
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::filter::organic;

    fn january() -> DateRange {
        DateRange::month_of(NaiveDate::from_ymd_opt(2019, 1, 1).expect("date"))
    }

    #[test]
    fn unfiltered_request_omits_filter_clauses() {
        let request = ReportRequest::users_and_sessions("123", january(), None);
        let json = serde_json::to_value(BatchGetRequest::single(&request)).expect("json");
        assert_eq!(
            json,
            serde_json::json!({
                "reportRequests": [{
                    "viewId": "123",
                    "dateRanges": [{"startDate": "2019-01-01", "endDate": "2019-01-31"}],
                    "dimensions": [],
                    "metrics": [{"expression": "ga:users"}, {"expression": "ga:sessions"}]
                }]
            })
        );
    }

    #[test]
    fn filtered_request_carries_clauses() {
        let request = ReportRequest::users_and_sessions("123", january(), Some(&organic()));
        assert_eq!(request.dimension_filter_clauses, organic().to_clauses());
    }

    #[test]
    fn empty_object_deserializes_without_reports() {
        let report: MetricReport = serde_json::from_str("{}").expect("parse");
        assert_eq!(report.reports, None);
    }

    #[test]
    fn report_without_rows_deserializes() {
        let report: MetricReport = serde_json::from_value(serde_json::json!({
            "reports": [{
                "columnHeader": {
                    "metricHeader": {
                        "metricHeaderEntries": [
                            {"name": "ga:users", "type": "INTEGER"},
                            {"name": "ga:sessions", "type": "INTEGER"}
                        ]
                    }
                },
                "data": {"totals": [{"values": ["0", "0"]}]}
            }]
        }))
        .expect("parse");
        let reports = report.reports.expect("reports");
        assert!(reports[0].data.rows.is_empty());
        assert_eq!(reports[0].column_header.metric_header.metric_header_entries.len(), 2);
    }
}
