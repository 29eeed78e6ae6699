//! REST table client
//!
//! Reads tables exposed by a PostgREST-style service at
//! `{url}/rest/v1/{table}`.

use super::query::TableQuery;
use super::RemoteTableClient;
use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::types::JsonValue;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Remote table client over HTTP
#[derive(Debug)]
pub struct RestTableClient {
    http: HttpClient,
}

impl RestTableClient {
    /// Create a client for the service at `url`, authenticating with `api_key`
    pub fn new(url: &str, api_key: &str, remote: &RemoteConfig) -> Result<Self> {
        let base = Url::parse(url)?;
        if api_key.trim().is_empty() {
            return Err(Error::missing_field("remote.api_key"));
        }

        let mut builder = HttpClientConfig::builder()
            .base_url(base.as_str())
            .timeout(Duration::from_secs(remote.timeout_secs))
            .max_retries(remote.max_retries)
            .header("apikey", api_key)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Accept", "application/json");
        if let Some(rps) = remote.requests_per_second {
            builder = builder.rate_limit(RateLimiterConfig::per_second(rps));
        }

        Ok(Self {
            http: HttpClient::with_config(builder.build())?,
        })
    }

    /// Query string for a table query, in request order
    pub fn query_params(query: &TableQuery) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        if let Some(range) = query.window() {
            params.push(("offset".to_string(), range.offset.to_string()));
            params.push(("limit".to_string(), range.limit.to_string()));
        }
        if let Some(filter) = query.filter() {
            params.push((filter.column.clone(), format!("gt.{}", filter.value)));
        }
        params
    }
}

#[async_trait]
impl RemoteTableClient for RestTableClient {
    async fn execute(&self, query: &TableQuery) -> Result<Vec<JsonValue>> {
        let path = format!("rest/v1/{}", query.table());
        let params = Self::query_params(query);
        debug!(table = query.table(), ?params, "Querying remote table");

        match self.http.get_json(&path, &params).await? {
            JsonValue::Array(rows) => Ok(rows),
            other => Err(Error::query(
                query.table(),
                format!("expected a JSON array, got {}", json_kind(&other)),
            )),
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
