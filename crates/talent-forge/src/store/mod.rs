//! Table-oriented access to the hosted relational store.
//!
//! Services never talk to the database directly: they receive an injected [`Store`] and
//! speak in rows (JSON objects) keyed by table name, mirroring the PostgREST surface the
//! hosted database exposes. [`MemoryStore`] backs development mode and tests,
//! [`RestStore`] backs production.

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// One stored record.
pub type Row = Map<String, Value>;

/// Equality predicate on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub(crate) fn matches(&self, row: &Row) -> bool {
        row.get(&self.column).unwrap_or(&Value::Null) == &self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Descending,
        }
    }
}

/// Filters, ordering and limit for a `select`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Collaborator interface over the hosted database.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert(&self, table: &str, record: Row) -> Result<Row, StoreError>;

    /// Insert or merge into the row matching `conflict_keys` (the primary key when empty).
    async fn upsert(
        &self,
        table: &str,
        record: Row,
        conflict_keys: &[&str],
    ) -> Result<Row, StoreError>;

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError>;

    async fn update(
        &self,
        table: &str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, StoreError>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError>;
}

/// Error enumeration for store failures. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("store returned malformed data: {0}")]
    Malformed(String),
}

/// Serialize a typed record into a row.
pub fn to_row<T: Serialize>(value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Malformed(format!(
            "expected an object, got {other}"
        ))),
        Err(err) => Err(StoreError::Malformed(err.to_string())),
    }
}

/// Deserialize a row into a typed record.
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|err| StoreError::Malformed(err.to_string()))
}
