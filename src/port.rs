//! The storage contract a pipeline drives.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::{CrudError, PortError};
use crate::models::{FindAllQuery, Page};

/// Path parameters addressing a single record, e.g. `{"id": "42"}`.
pub type Criteria = BTreeMap<String, String>;

/// Persistence operations behind a resource pipeline.
///
/// Payloads and patches arrive as raw JSON; shape and validation checks
/// belong to the implementation. Classified failures are reported as
/// [`PortError::Crud`]; anything else may be returned as [`PortError::Raw`]
/// and is classified by the dispatcher.
#[async_trait]
pub trait DataPort: Send + Sync + 'static {
    /// Plain-data form of a persisted record.
    type Record: Serialize + Send + Sync;

    /// Validate and persist a new record.
    ///
    /// Fails with `validation_failed` (412) when the payload is invalid.
    async fn save(&self, payload: Value) -> Result<Self::Record, PortError>;

    /// Fetch the record matching `criteria`, or `not_found` (404).
    async fn find_one(&self, criteria: &Criteria) -> Result<Self::Record, PortError>;

    /// Apply `patch` to the record matching `criteria`.
    async fn update(&self, criteria: &Criteria, patch: Value) -> Result<Self::Record, PortError>;

    /// Delete the record matching `criteria`, returning its last state.
    async fn destroy(&self, criteria: &Criteria) -> Result<Self::Record, PortError>;

    /// One page of records plus the total count and paging links.
    async fn find_all(&self, query: &FindAllQuery) -> Result<Page<Self::Record>, PortError>;

    /// Persist every entry of a JSON array atomically.
    async fn bulk_create(&self, payloads: Value) -> Result<Vec<Self::Record>, PortError>;
}

/// Split a bulk payload into its entries.
///
/// - not an array: `invalid_bulk_array` (422)
/// - empty array: `empty_bulk_array` (412)
pub fn bulk_entries(payloads: Value) -> Result<Vec<Value>, CrudError> {
    match payloads {
        Value::Array(entries) if entries.is_empty() => {
            Err(CrudError::validation_failed("empty_bulk_array", None))
        }
        Value::Array(entries) => Ok(entries),
        _ => Err(CrudError::unprocessable("invalid_bulk_array")),
    }
}
