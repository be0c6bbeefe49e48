//! In-memory datastore for tests.
//!
//! [`MockDataSource`] answers the same [`Query`] values the REST client
//! sends by evaluating them against JSON rows held per table. Tables can be
//! marked as failing to exercise degraded paths.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use facility_admin_common::{AppError, AppResult};
use serde_json::Value;

use crate::client::{DataSource, Rows, SharedDataSource};
use crate::query::{Filter, Query};

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    failing: HashSet<String>,
    requests: HashMap<String, usize>,
    omit_counts: bool,
}

/// In-memory [`DataSource`].
#[derive(Clone, Default)]
pub struct MockDataSource {
    state: Arc<Mutex<State>>,
}

impl MockDataSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed `table` with `rows`, replacing previous contents.
    #[must_use]
    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.lock().tables.insert(table.to_string(), rows);
        self
    }

    /// Make every request against `table` fail.
    #[must_use]
    pub fn fail_table(self, table: &str) -> Self {
        self.set_failing(table, true);
        self
    }

    /// Append a row to `table`.
    pub fn insert(&self, table: &str, row: Value) {
        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Answer counted reads without a total, like a datastore that ignores
    /// the count preference.
    #[must_use]
    pub fn without_counts(self) -> Self {
        self.lock().omit_counts = true;
        self
    }

    /// Toggle failure injection for `table`.
    pub fn set_failing(&self, table: &str, failing: bool) {
        let mut state = self.lock();
        if failing {
            state.failing.insert(table.to_string());
        } else {
            state.failing.remove(table);
        }
    }

    /// Current contents of `table`.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Number of requests made against `table`.
    #[must_use]
    pub fn request_count(&self, table: &str) -> usize {
        self.lock().requests.get(table).copied().unwrap_or(0)
    }

    /// Wrap as a shared handle for repositories.
    #[must_use]
    pub fn into_shared(self) -> SharedDataSource {
        Arc::new(self)
    }

    fn begin(&self, table: &str) -> AppResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        *state.requests.entry(table.to_string()).or_default() += 1;
        if state.failing.contains(table) {
            return Err(AppError::Datastore(format!(
                "{table}: 503 Service Unavailable"
            )));
        }
        Ok(state)
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn fetch(&self, query: &Query) -> AppResult<Rows> {
        let state = self.begin(query.table_name())?;
        let rows = state
            .tables
            .get(query.table_name())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let (rows, total) = query.apply(rows);

        Ok(Rows {
            rows,
            total: (query.counts() && !state.omit_counts).then_some(total),
        })
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> AppResult<Vec<Value>> {
        let mut state = self.begin(table)?;
        let Value::Object(patch) = patch else {
            return Err(AppError::Datastore(format!("{table}: patch must be an object")));
        };

        let mut updated = Vec::new();
        for row in state.tables.entry(table.to_string()).or_default() {
            if !filters.iter().all(|f| f.matches(row)) {
                continue;
            }
            if let Value::Object(fields) = row {
                for (key, value) in &patch {
                    fields.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::query::ColumnRef;
    use serde_json::json;

    struct Col(&'static str);

    impl ColumnRef for Col {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[tokio::test]
    async fn test_fetch_and_update() {
        let db = MockDataSource::new().with_rows(
            "things",
            vec![json!({"id": "a", "n": 1}), json!({"id": "b", "n": 2})],
        );

        let rows = db
            .fetch(&Query::new("things").filter(Col("n").gte(2)).with_count())
            .await
            .unwrap();
        assert_eq!(rows.total, Some(1));
        assert_eq!(rows.rows[0]["id"], "b");

        let updated = db
            .update("things", &[Col("id").eq("a")], json!({"n": 5}))
            .await
            .unwrap();
        assert_eq!(updated, vec![json!({"id": "a", "n": 5})]);
        assert_eq!(db.rows("things")[0]["n"], 5);
        assert_eq!(db.request_count("things"), 2);
    }

    #[tokio::test]
    async fn test_failing_table() {
        let db = MockDataSource::new().fail_table("things");
        let err = db.fetch(&Query::new("things")).await.unwrap_err();
        assert!(matches!(err, AppError::Datastore(_)));

        db.set_failing("things", false);
        assert!(db.fetch(&Query::new("things")).await.unwrap().rows.is_empty());
    }
}
