use duckdb::types::Value as DuckValue;
use duckdb::Connection;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{DashboardError, Result};
use crate::table::{Table, Value};

/// Runs SQL text and hands back the full result. The executor owns one of these.
pub trait QueryEngine: Send + Sync {
    fn query(&self, sql: &str) -> Result<Table>;
}

impl<E: QueryEngine + ?Sized> QueryEngine for &E {
    fn query(&self, sql: &str) -> Result<Table> {
        (**self).query(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    /// Load httpfs and enable the object cache for remote partitions.
    pub remote: bool,
    pub s3_region: Option<String>,
    pub threads: Option<usize>,
}

/// In-memory DuckDB connection. Queries are serialized through the mutex.
pub struct DuckDbEngine {
    conn: Mutex<Connection>,
}

impl DuckDbEngine {
    pub fn open(settings: &EngineSettings) -> Result<Self> {
        let start_time = Instant::now();
        let conn = Connection::open_in_memory()?;

        if settings.remote {
            info!(action = "load", component = "duckdb", extension = "httpfs", "Loading remote file system extension");
            conn.execute_batch("INSTALL httpfs; LOAD httpfs;")?;
            conn.execute_batch("SET enable_object_cache = true;")?;
            if let Some(region) = &settings.s3_region {
                conn.execute_batch(&format!(
                    "SET s3_region = {};",
                    crate::queries::sql_string(region)
                ))?;
            }
        }

        if let Some(threads) = settings.threads {
            conn.execute_batch(&format!("SET threads = {threads};"))?;
        }

        info!(
            action = "complete",
            component = "duckdb",
            remote = settings.remote,
            s3_region = settings.s3_region.as_deref(),
            threads = settings.threads,
            duration_ms = start_time.elapsed().as_millis(),
            "Query engine ready"
        );
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(&EngineSettings::default())
    }
}

impl QueryEngine for DuckDbEngine {
    fn query(&self, sql: &str) -> Result<Table> {
        let start_time = Instant::now();
        let conn = self.conn.lock().map_err(|_| DashboardError::EnginePoisoned)?;

        let mut statement = conn.prepare(sql)?;
        let mut rows = statement.query([])?;
        let columns = rows
            .as_ref()
            .map(|statement| {
                statement
                    .column_names()
                    .into_iter()
                    .map(|name| name.to_string())
                    .collect::<Vec<String>>()
            })
            .unwrap_or_default();

        let mut data = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                let value: DuckValue = row.get(index)?;
                values.push(Value::from(value));
            }
            data.push(values);
        }

        debug!(
            action = "query",
            component = "duckdb",
            row_count = data.len(),
            column_count = columns.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Query executed"
        );
        Ok(Table::new(columns, data))
    }
}
