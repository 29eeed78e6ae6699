//! Remote table access
//!
//! The pipeline only needs one capability from the remote service: read a
//! window of rows from a named table, optionally bounded below on one
//! column. `RemoteTableClient` is that seam; `RestTableClient` implements it
//! over HTTP and tests substitute in-memory clients.

mod query;
mod rest;

pub use query::{GreaterThan, TableQuery};
pub use rest::RestTableClient;

use crate::error::Result;
use crate::types::JsonValue;
use async_trait::async_trait;

/// Paginated accessor over named remote tables
#[async_trait]
pub trait RemoteTableClient: Send + Sync {
    /// Run a query and return its rows as JSON objects
    async fn execute(&self, query: &TableQuery) -> Result<Vec<JsonValue>>;
}
