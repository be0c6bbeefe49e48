//! Datastore access.
//!
//! [`DataSource`] is the seam between repositories and the hosted database.
//! [`RestClient`] talks to the database's REST endpoint over HTTPS; the
//! in-memory `MockDataSource` (feature `test-utils`) stands in for it in
//! tests. Handles are constructed once at startup and injected into each
//! repository.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use facility_admin_common::{AppError, AppResult, Timer, config::DatastoreConfig, get_metrics};
use reqwest::{Client, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::query::{Filter, Query};

/// Rows returned by a read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    /// Raw rows in the order the datastore returned them.
    pub rows: Vec<Value>,
    /// Exact number of matching rows, when the query asked for it.
    pub total: Option<u64>,
}

impl Rows {
    /// Deserialize every row into `T`.
    pub fn decode<T: DeserializeOwned>(self) -> AppResult<Vec<T>> {
        decode_rows(self.rows)
    }
}

/// Deserialize raw rows into entity models.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> AppResult<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| AppError::Datastore(format!("Malformed row: {e}")))
        })
        .collect()
}

/// Read/update access to the hosted relational database.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Run a read query.
    async fn fetch(&self, query: &Query) -> AppResult<Rows>;

    /// Merge `patch` into every row of `table` matching all `filters` and
    /// return the updated rows.
    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> AppResult<Vec<Value>>;
}

/// Shared datastore handle injected into repositories.
pub type SharedDataSource = Arc<dyn DataSource>;

/// Parse the total out of a `Content-Range` header such as `0-19/57`.
/// An unknown total (`0-19/*`) yields `None`.
#[must_use]
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    value
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse().ok())
}

/// HTTPS client for the database's REST endpoint.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl RestClient {
    /// Create a client from configuration.
    pub fn new(config: &DatastoreConfig) -> AppResult<Self> {
        let mut builder = Client::builder()
            .user_agent(format!("facility-admin/{}", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut base_url = Url::parse(&config.url)
            .map_err(|e| AppError::Config(format!("Invalid datastore URL: {e}")))?;
        // Url::join replaces the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> AppResult<Url> {
        self.base_url
            .join(table)
            .map_err(|e| AppError::Datastore(format!("Invalid table name {table}: {e}")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, "application/json")
    }

    async fn send(&self, table: &str, request: RequestBuilder) -> AppResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Datastore(format!("{table}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(table = %table, status = %status, body = %body, "Datastore request failed");
            Err(AppError::Datastore(format!("{table}: {status} {body}")))
        }
    }

    async fn fetch_inner(&self, query: &Query) -> AppResult<Rows> {
        let table = query.table_name();
        let mut request = self
            .authorize(self.client.get(self.table_url(table)?))
            .query(&query.to_params());
        if query.counts() {
            request = request.header("Prefer", "count=exact");
        }

        let response = self.send(table, request).await?;
        let total = if query.counts() {
            response
                .headers()
                .get(header::CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_content_range_total)
        } else {
            None
        };

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| AppError::Datastore(format!("{table}: invalid response body: {e}")))?;

        debug!(table = %table, rows = rows.len(), total = ?total, "Fetched rows");
        Ok(Rows { rows, total })
    }

    async fn update_inner(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> AppResult<Vec<Value>> {
        if filters.is_empty() {
            return Err(AppError::Internal(format!(
                "Refusing unfiltered update of {table}"
            )));
        }

        let params: Vec<(String, String)> = filters.iter().map(Filter::to_param).collect();
        let request = self
            .authorize(self.client.patch(self.table_url(table)?))
            .query(&params)
            .header("Prefer", "return=representation")
            .json(&patch);

        let rows: Vec<Value> = self
            .send(table, request)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Datastore(format!("{table}: invalid response body: {e}")))?;

        debug!(table = %table, rows = rows.len(), "Updated rows");
        Ok(rows)
    }
}

#[async_trait]
impl DataSource for RestClient {
    async fn fetch(&self, query: &Query) -> AppResult<Rows> {
        let timer = Timer::start();
        let result = self.fetch_inner(query).await;
        get_metrics().record_datastore_request(timer.elapsed(), result.is_err());
        result
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> AppResult<Vec<Value>> {
        let timer = Timer::start();
        let result = self.update_inner(table, filters, patch).await;
        get_metrics().record_datastore_request(timer.elapsed(), result.is_err());
        result
    }
}
