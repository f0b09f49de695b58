use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::IntoParams;

use crate::pagination::PagingInfo;
use crate::sort::SortOrder;

const fn default_limit() -> u64 {
    10
}

/// Query parameters accepted by findAll.
///
/// # Filtering
/// The `where` parameter accepts a JSON object mapping column names to values:
/// - **Equality:** `{"name": "Ada"}`
/// - **Membership:** `{"id": [1, 2, 3]}`
/// - **Null check:** `{"birth_date": null}`
///
/// Keys that are not columns of the resource are ignored.
///
/// # Pagination
/// `limit` (default 10) and `offset` (default 0).
///
/// # Sorting
/// `sortField` names a column and `sortOrder` is `ASC` or `DESC`. Without them,
/// the configured default sort applies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct FindAllQuery {
    /// Maximum number of rows to return.
    #[serde(default = "default_limit")]
    #[param(example = 10)]
    pub limit: u64,
    /// Number of rows to skip.
    #[serde(default)]
    #[param(example = 0)]
    pub offset: u64,
    /// JSON-encoded filter object.
    #[serde(rename = "where")]
    #[param(example = json!({"name": "Ada"}))]
    pub filter: Option<String>,
    #[param(example = "name")]
    pub sort_field: Option<String>,
    #[param(value_type = Option<String>, example = "ASC")]
    pub sort_order: Option<SortOrder>,
    /// Comma-separated list of fields to keep in each row.
    #[param(example = "id,name")]
    pub fields: Option<String>,
}

impl Default for FindAllQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
            filter: None,
            sort_field: None,
            sort_order: None,
            fields: None,
        }
    }
}

impl FindAllQuery {
    /// Requested projection, or `None` when every field is wanted.
    #[must_use]
    pub fn field_list(&self) -> Option<Vec<&str>> {
        let fields: Vec<&str> = self
            .fields
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .collect();
        (!fields.is_empty()).then_some(fields)
    }
}

/// One page of findAll results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub rows: Vec<T>,
    /// Total number of matching records, ignoring limit and offset
    pub count: u64,
    pub paging_info: PagingInfo,
}
