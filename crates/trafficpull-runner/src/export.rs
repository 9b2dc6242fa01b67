use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use trafficpull_core::accumulator::ResultSet;
use trafficpull_core::period::PERIOD_COLUMNS;

use crate::error::ExportError;

/// File name suffix after the run date.
pub const OUTPUT_SUFFIX: &str = "UA Monthly.csv";

/// `{dir}/{YYYY-MM-DD} UA Monthly.csv` for the day the run happens.
pub fn output_path(dir: &Path, today: NaiveDate) -> PathBuf {
    dir.join(format!("{} {OUTPUT_SUFFIX}", today.format("%Y-%m-%d")))
}

/// Sanitize a CSV field value against formula injection.
///
/// Spreadsheet apps interpret values that begin with `=`, `+`, `-`, `@`, TAB,
/// or CR as formula expressions. Prepending a single quote (`'`) makes them
/// treat the value as a literal string.
pub fn sanitize_csv_field(val: &str) -> Cow<'_, str> {
    if val.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        Cow::Owned(format!("'{val}"))
    } else {
        Cow::Borrowed(val)
    }
}

/// Write the header and one record per row, in result order.
pub fn write_csv<W: Write>(results: &ResultSet, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(PERIOD_COLUMNS)?;

    for row in results.rows() {
        let record = row.to_record();
        let sanitized: Vec<Cow<'_, str>> = record.iter().map(|f| sanitize_csv_field(f)).collect();
        wtr.write_record(sanitized.iter().map(|f| f.as_bytes()))?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn build_csv(results: &ResultSet) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::with_capacity(results.len().saturating_mul(128));
    write_csv(results, &mut buf)?;
    Ok(buf)
}

/// Create `dir` if needed and write the results file for `today`.
pub fn export_to_file(
    results: &ResultSet,
    dir: &Path,
    today: NaiveDate,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = output_path(dir, today);
    let bytes = build_csv(results)?;

    let mut file = std::fs::File::create(&path)?;
    file.write_all(&bytes)?;
    file.sync_all()
        .map_err(|e| ExportError::Flush(format!("{}: {e}", path.display())))?;

    info!(path = %path.display(), rows = results.len(), "results written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use trafficpull_core::period::PeriodRow;

    use super::*;

    fn row(domain: &str, month: &str, total_users: i64) -> PeriodRow {
        PeriodRow {
            total_users,
            total_sessions: total_users + 20,
            organic_total_users: 40,
            organic_sessions: 50,
            month: month.to_string(),
            domain: domain.to_string(),
            ..PeriodRow::default()
        }
    }

    fn results(rows: Vec<PeriodRow>) -> ResultSet {
        let mut set = ResultSet::default();
        for r in rows {
            set.push(r);
        }
        set
    }

    #[test]
    fn output_path_uses_run_date() {
        let today = NaiveDate::from_ymd_opt(2023, 7, 4).expect("date");
        assert_eq!(
            output_path(Path::new("/tmp/out"), today),
            PathBuf::from("/tmp/out/2023-07-04 UA Monthly.csv")
        );
    }

    #[test]
    fn sanitize_prefixes_formula_triggers() {
        assert_eq!(sanitize_csv_field("=cmd()"), "'=cmd()");
        assert_eq!(sanitize_csv_field("@SUM(A1)"), "'@SUM(A1)");
        assert_eq!(sanitize_csv_field("example.com"), "example.com");
        assert!(matches!(sanitize_csv_field("2019-01-01"), Cow::Borrowed(_)));
    }

    #[test]
    fn header_and_rows_in_column_order() {
        let csv = build_csv(&results(vec![row("example.com", "2019-01-01", 100)])).expect("csv");
        let text = String::from_utf8(csv).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "totalUsers,totalSessions,organicTotalUsers,organicSessions,\
                 totalUsersFiltered,totalSessionsFiltered,organicTotalUsersFiltered,\
                 organicSessionsFiltered,month,domain",
                "100,120,40,50,0,0,0,0,2019-01-01,example.com",
            ]
        );
    }

    #[test]
    fn empty_results_still_write_the_header() {
        let csv = build_csv(&ResultSet::default()).expect("csv");
        assert_eq!(String::from_utf8(csv).expect("utf8").lines().count(), 1);
    }

    #[test]
    fn equal_results_give_identical_bytes() {
        let rows = || {
            results(vec![
                row("example.com", "2019-01-01", 100),
                row("shop.example.com", "2019-01-01", 7),
            ])
        };
        assert_eq!(build_csv(&rows()).expect("a"), build_csv(&rows()).expect("b"));
    }

    #[test]
    fn domains_with_commas_are_quoted() {
        let csv = build_csv(&results(vec![row("a,b", "2019-01-01", 1)])).expect("csv");
        let text = String::from_utf8(csv).expect("utf8");
        assert!(text.ends_with("2019-01-01,\"a,b\"\n"));
    }
}
