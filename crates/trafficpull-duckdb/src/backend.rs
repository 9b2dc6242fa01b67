use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::{debug, info};

use trafficpull_core::property::{Property, PropertySource};

use crate::schema::{init_sql, DEFAULT_MEMORY_LIMIT};

/// Property list kept in a DuckDB file.
///
/// The connection sits behind `Arc<Mutex<_>>` so the source can be shared
/// across tasks; DuckDB allows a single writer at a time.
#[derive(Clone)]
pub struct DuckDbPropertySource {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbPropertySource {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(DEFAULT_MEMORY_LIMIT))?;
        info!(path, memory_limit = DEFAULT_MEMORY_LIMIT, "property store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database. Data is gone when the source is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql(DEFAULT_MEMORY_LIMIT))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Register a view. Re-seeding an existing `view_id` leaves the stored
    /// row untouched; returns whether a row was inserted.
    pub async fn seed_property(&self, domain: &str, view_id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO properties (domain, view_id) VALUES (?1, ?2)",
            duckdb::params![domain, view_id],
        )?;
        debug!(domain, view_id, inserted, "seed property");
        Ok(inserted > 0)
    }

    /// All stored properties ordered by domain, then view.
    pub async fn list_properties(&self) -> Result<Vec<Property>> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare("SELECT domain, view_id FROM properties ORDER BY domain, view_id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Property {
                domain: row.get(0)?,
                view_id: row.get(1)?,
            })
        })?;

        let mut properties = Vec::new();
        for row in rows {
            properties.push(row?);
        }
        Ok(properties)
    }
}

#[async_trait]
impl PropertySource for DuckDbPropertySource {
    async fn list_properties(&self) -> Result<Vec<Property>> {
        DuckDbPropertySource::list_properties(self).await
    }
}
