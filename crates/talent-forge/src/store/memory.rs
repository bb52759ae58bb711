use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{Direction, Filter, Query, Row, Store, StoreError};

/// In-process tables that keep rows in insertion order.
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, Vec<Row>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fixture rows (question catalogues and the like) without assigning ids.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Row>) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        tables.entry(table.to_string()).or_default().extend(rows);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<Row>>>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))
    }
}

fn stamp(mut record: Row) -> Row {
    if !record.contains_key("id") {
        record.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }
    if !record.contains_key("created_at") {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        record.insert("created_at".to_string(), Value::String(now));
    }
    record
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| filter.matches(row))
}

fn merge(target: &mut Row, patch: Row) {
    for (column, value) in patch {
        target.insert(column, value);
    }
}

fn compare(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, table: &str, record: Row) -> Result<Row, StoreError> {
        let record = stamp(record);
        let mut tables = self.lock()?;
        tables
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn upsert(
        &self,
        table: &str,
        record: Row,
        conflict_keys: &[&str],
    ) -> Result<Row, StoreError> {
        let keys: &[&str] = if conflict_keys.is_empty() {
            &["id"]
        } else {
            conflict_keys
        };
        let filters: Vec<Filter> = keys
            .iter()
            .map(|key| Filter::eq(*key, record.get(*key).cloned().unwrap_or(Value::Null)))
            .collect();

        let mut tables = self.lock()?;
        let rows = tables.entry(table.to_string()).or_default();
        if let Some(existing) = rows.iter_mut().find(|row| matches_all(row, &filters)) {
            merge(existing, record);
            return Ok(existing.clone());
        }

        let record = stamp(record);
        rows.push(record.clone());
        Ok(record)
    }

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError> {
        let tables = self.lock()?;
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_all(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn update(
        &self,
        table: &str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.lock()?;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| matches_all(row, filters)) {
            merge(row, patch.clone());
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.lock()?;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let (removed, kept): (Vec<Row>, Vec<Row>) = rows
            .drain(..)
            .partition(|row| matches_all(row, filters));
        *rows = kept;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{to_row, Order};
    use serde_json::json;

    fn row(value: Value) -> Row {
        to_row(&value).expect("object row")
    }

    #[tokio::test]
    async fn insert_assigns_identity_and_timestamp() {
        let store = MemoryStore::new();
        let stored = store
            .insert("color_assessments", row(json!({ "status": "draft" })))
            .await
            .expect("insert succeeds");

        assert!(stored.get("id").and_then(Value::as_str).is_some());
        assert!(stored.get("created_at").and_then(Value::as_str).is_some());
        assert_eq!(stored.get("status"), Some(&json!("draft")));
    }

    #[tokio::test]
    async fn select_filters_orders_and_limits() {
        let store = MemoryStore::new();
        store
            .seed(
                "color_questions",
                vec![
                    row(json!({ "id": "q3", "question_number": 3, "active": true })),
                    row(json!({ "id": "q1", "question_number": 1, "active": true })),
                    row(json!({ "id": "q2", "question_number": 2, "active": false })),
                ],
            )
            .expect("seed succeeds");

        let rows = store
            .select(
                "color_questions",
                &Query::new()
                    .filter(Filter::eq("active", true))
                    .order(Order::asc("question_number")),
            )
            .await
            .expect("select succeeds");
        let ids: Vec<_> = rows.iter().map(|row| row["id"].clone()).collect();
        assert_eq!(ids, vec![json!("q1"), json!("q3")]);

        let newest = store
            .select(
                "color_questions",
                &Query::new().order(Order::desc("question_number")).limit(1),
            )
            .await
            .expect("select succeeds");
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0]["id"], json!("q3"));
    }

    #[tokio::test]
    async fn select_on_unknown_table_is_empty() {
        let store = MemoryStore::new();
        let rows = store
            .select("missing", &Query::new())
            .await
            .expect("select succeeds");
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn upsert_merges_on_conflict_keys() {
        let store = MemoryStore::new();
        let keys = ["assessment_id", "descriptor_id", "block"];
        let first = store
            .upsert(
                "pi_descriptor_responses",
                row(json!({ "assessment_id": "a1", "descriptor_id": "d1", "block": "natural" })),
                &keys,
            )
            .await
            .expect("upsert inserts");
        let second = store
            .upsert(
                "pi_descriptor_responses",
                row(json!({ "assessment_id": "a1", "descriptor_id": "d1", "block": "natural", "note": "again" })),
                &keys,
            )
            .await
            .expect("upsert merges");

        assert_eq!(first["id"], second["id"]);
        assert_eq!(second["note"], json!("again"));

        let rows = store
            .select("pi_descriptor_responses", &Query::new())
            .await
            .expect("select succeeds");
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn update_patches_matching_rows_only() {
        let store = MemoryStore::new();
        store
            .seed(
                "disc_assessments",
                vec![
                    row(json!({ "id": "a1", "status": "draft" })),
                    row(json!({ "id": "a2", "status": "draft" })),
                ],
            )
            .expect("seed succeeds");

        let updated = store
            .update(
                "disc_assessments",
                row(json!({ "status": "completed" })),
                &[Filter::eq("id", "a2")],
            )
            .await
            .expect("update succeeds");
        assert_eq!(updated.len(), 1);

        let untouched = store
            .select(
                "disc_assessments",
                &Query::new().filter(Filter::eq("id", "a1")),
            )
            .await
            .expect("select succeeds");
        assert_eq!(untouched[0]["status"], json!("draft"));
    }

    #[tokio::test]
    async fn delete_returns_removed_rows() {
        let store = MemoryStore::new();
        store
            .seed(
                "pi_descriptor_responses",
                vec![
                    row(json!({ "id": "r1", "block": "natural" })),
                    row(json!({ "id": "r2", "block": "adaptado" })),
                ],
            )
            .expect("seed succeeds");

        let removed = store
            .delete("pi_descriptor_responses", &[Filter::eq("block", "natural")])
            .await
            .expect("delete succeeds");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0]["id"], json!("r1"));

        let remaining = store
            .select("pi_descriptor_responses", &Query::new())
            .await
            .expect("select succeeds");
        assert_eq!(remaining.len(), 1);
    }
}
