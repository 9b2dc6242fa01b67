use tracing::warn;

use crate::report::MetricReport;
use crate::table::NormalizedTable;

/// Reshape an API response into a [`NormalizedTable`].
///
/// Columns are the dimension header names followed by the metric header
/// names. Each row is its dimension values followed by every metric value,
/// flattened in order. An absent response, or one without `reports`, yields
/// an empty table. Rows whose width disagrees with the header are dropped.
pub fn normalize(report: Option<&MetricReport>) -> NormalizedTable {
    let Some(reports) = report.and_then(|r| r.reports.as_ref()) else {
        warn!("invalid or missing report response, using an empty table");
        return NormalizedTable::default();
    };

    let mut columns: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    for report in reports {
        let header = &report.column_header;
        columns = header
            .dimensions
            .iter()
            .cloned()
            .chain(
                header
                    .metric_header
                    .metric_header_entries
                    .iter()
                    .map(|entry| entry.name.clone().unwrap_or_default()),
            )
            .collect();

        for row in &report.data.rows {
            let cells: Vec<String> = row
                .dimensions
                .iter()
                .cloned()
                .chain(row.metrics.iter().flat_map(|m| m.values.iter().cloned()))
                .collect();
            rows.push(cells);
        }
    }

    let mut table = NormalizedTable::new(columns);
    for row in rows {
        if let Err(err) = table.push_row(row) {
            warn!(error = %err, "dropping malformed report row");
        }
    }
    table
}
