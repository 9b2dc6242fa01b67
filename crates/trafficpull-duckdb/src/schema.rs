/// Memory ceiling for the property store. The table holds a handful of rows,
/// so DuckDB's default (80% of system RAM) is far more than needed.
pub const DEFAULT_MEMORY_LIMIT: &str = "256MB";

/// DuckDB initialization SQL, run once when the database is opened.
///
/// Every statement uses `IF NOT EXISTS`, so reopening an existing file is a
/// no-op.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 1;

{PROPERTIES_SQL}"#
    )
}

/// One row per reporting view. A domain may own several views.
pub const PROPERTIES_SQL: &str = r#"CREATE TABLE IF NOT EXISTS properties (
    domain   VARCHAR NOT NULL,
    view_id  VARCHAR PRIMARY KEY
);"#;
