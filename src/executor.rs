use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info};

use crate::engine::QueryEngine;
use crate::error::Result;
use crate::table::{Table, Value};

/// Runs queries through an injected engine and memoizes every result by its exact SQL text.
///
/// Results live for the lifetime of the executor. There is no eviction and no invalidation: the
/// query space is bounded by years times views and the partitions do not change under a running
/// process.
pub struct Executor<E> {
    engine: E,
    cache: Mutex<HashMap<String, Arc<Table>>>,
}

impl<E: QueryEngine> Executor<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    // A poisoned lock only means another query panicked; the map itself is still consistent.
    fn cache(&self) -> MutexGuard<'_, HashMap<String, Arc<Table>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cached_queries(&self) -> usize {
        self.cache().len()
    }

    /// Full result table for `query`.
    pub fn execute_table(&self, query: &str) -> Result<Arc<Table>> {
        if let Some(table) = self.cache().get(query) {
            debug!(action = "hit", component = "query_cache", "Serving cached result");
            return Ok(Arc::clone(table));
        }

        // The lock is not held while the engine runs. Two callers racing on the same text both
        // execute it and store the same value.
        let start_time = Instant::now();
        info!(action = "start", component = "query_executor", "Executing query");
        let table = Arc::new(self.engine.query(query)?);
        info!(
            action = "complete",
            component = "query_executor",
            row_count = table.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Query completed"
        );

        let mut cache = self.cache();
        let table = cache
            .entry(query.to_string())
            .or_insert(table)
            .clone();
        Ok(table)
    }

    /// The single row of a scalar query, such as an aggregate without `GROUP BY`.
    pub fn execute_scalar(&self, query: &str) -> Result<Vec<Value>> {
        let table = self.execute_table(query)?;
        Ok(table.first_row(query)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts engine round trips and answers every query with its own text.
    #[derive(Default)]
    struct CountingEngine {
        calls: AtomicUsize,
    }

    impl QueryEngine for CountingEngine {
        fn query(&self, sql: &str) -> Result<Table> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if sql.is_empty() {
                return Ok(Table::new(vec!["echo".into()], Vec::new()));
            }
            if sql.starts_with("FAIL") {
                return Err(DashboardError::EmptyResult {
                    query: sql.to_string(),
                });
            }
            Ok(Table::new(
                vec!["echo".into()],
                vec![vec![Value::Text(sql.to_string())]],
            ))
        }
    }

    #[test]
    fn identical_query_text_runs_once() {
        let engine = CountingEngine::default();
        let executor = Executor::new(&engine);

        let first = executor.execute_table("SELECT 1").unwrap();
        let second = executor.execute_table("SELECT 1").unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        assert_eq!(executor.cached_queries(), 1);
    }

    #[test]
    fn distinct_query_text_is_cached_separately() {
        let engine = CountingEngine::default();
        let executor = Executor::new(&engine);

        executor.execute_scalar("SELECT 1").unwrap();
        executor.execute_scalar("SELECT  1").unwrap();
        executor.execute_scalar("SELECT 1").unwrap();

        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn scalar_and_table_share_the_cache() {
        let engine = CountingEngine::default();
        let executor = Executor::new(&engine);

        let row = executor.execute_scalar("SELECT 2").unwrap();
        let table = executor.execute_table("SELECT 2").unwrap();

        assert_eq!(row, table.rows[0]);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_propagate_and_are_not_cached() {
        let engine = CountingEngine::default();
        let executor = Executor::new(&engine);

        assert!(executor.execute_table("FAIL remote").is_err());
        assert!(executor.execute_table("FAIL remote").is_err());

        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
        assert_eq!(executor.cached_queries(), 0);
    }

    #[test]
    fn scalar_query_without_rows_is_an_error() {
        let executor = Executor::new(CountingEngine::default());
        assert!(matches!(
            executor.execute_scalar(""),
            Err(DashboardError::EmptyResult { .. })
        ));
    }

    #[test]
    fn concurrent_callers_share_results() {
        let engine = CountingEngine::default();
        let executor = Executor::new(&engine);

        let (a, b) = rayon::join(
            || executor.execute_table("SELECT 3"),
            || executor.execute_table("SELECT 4"),
        );
        assert_eq!(a.unwrap().rows[0][0], Value::Text("SELECT 3".into()));
        assert_eq!(b.unwrap().rows[0][0], Value::Text("SELECT 4".into()));

        executor.execute_table("SELECT 3").unwrap();
        executor.execute_table("SELECT 4").unwrap();
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
    }
}
