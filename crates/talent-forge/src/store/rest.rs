use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use super::{Direction, Filter, Query, Row, Store, StoreError};
use crate::config::DatabaseConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// PostgREST client for the hosted database, authenticated with the service-role key.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    service_role_key: String,
}

impl RestStore {
    pub fn new(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    async fn execute(&self, table: &str, builder: RequestBuilder) -> Result<Vec<Row>, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(table, status = status.as_u16(), %message, "store rejected request");
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| StoreError::Malformed(err.to_string()))?;
        debug!(table, "store request completed");
        rows_from_body(body)
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Render equality filters as PostgREST query parameters.
pub(crate) fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| match &filter.value {
            Value::Null => (filter.column.clone(), "is.null".to_string()),
            value => (filter.column.clone(), format!("eq.{}", literal(value))),
        })
        .collect()
}

pub(crate) fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&query.filters));
    if let Some(order) = &query.order {
        let direction = match order.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

fn rows_from_body(body: Value) -> Result<Vec<Row>, StoreError> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(StoreError::Malformed(format!(
                    "expected row object, got {other}"
                ))),
            })
            .collect(),
        Value::Object(row) => Ok(vec![row]),
        Value::Null => Ok(Vec::new()),
        other => Err(StoreError::Malformed(format!(
            "expected row array, got {other}"
        ))),
    }
}

fn single(rows: Vec<Row>, table: &str) -> Result<Row, StoreError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| StoreError::Malformed(format!("{table}: empty representation")))
}

#[async_trait]
impl Store for RestStore {
    async fn insert(&self, table: &str, record: Row) -> Result<Row, StoreError> {
        let builder = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&record);
        single(self.execute(table, builder).await?, table)
    }

    async fn upsert(
        &self,
        table: &str,
        record: Row,
        conflict_keys: &[&str],
    ) -> Result<Row, StoreError> {
        let mut builder = self
            .request(Method::POST, table)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&record);
        if !conflict_keys.is_empty() {
            builder = builder.query(&[("on_conflict", conflict_keys.join(","))]);
        }
        single(self.execute(table, builder).await?, table)
    }

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError> {
        let builder = self.request(Method::GET, table).query(&query_params(query));
        self.execute(table, builder).await
    }

    async fn update(
        &self,
        table: &str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, StoreError> {
        let builder = self
            .request(Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(&filter_params(filters))
            .json(&patch);
        self.execute(table, builder).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        let builder = self
            .request(Method::DELETE, table)
            .header("Prefer", "return=representation")
            .query(&filter_params(filters));
        self.execute(table, builder).await
    }
}
