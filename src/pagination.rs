//! Offset/limit paging links for listing responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A `{limit, offset}` pair pointing at one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageRef {
    pub limit: u64,
    pub offset: u64,
}

impl PageRef {
    #[must_use]
    pub const fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }
}

/// Navigation links returned with every findAll page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagingInfo {
    pub first: PageRef,
    pub next: Option<PageRef>,
    pub previous: Option<PageRef>,
    pub last: PageRef,
}

/// Compute paging links for a listing of `total` records.
///
/// - `next` exists while `offset + limit <= total`
/// - `previous` exists when `offset > 0`, clamped at offset 0
/// - `last` points at `ceil(total / limit) * limit`
///
/// `limit` must be non-zero.
#[must_use]
pub fn compute_paging(total: u64, limit: u64, offset: u64) -> PagingInfo {
    debug_assert!(limit > 0, "paging limit must be positive");
    let total_pages = total.div_ceil(limit.max(1));
    let last_offset = total_pages.saturating_mul(limit);
    let next_offset = offset.saturating_add(limit);

    PagingInfo {
        first: PageRef::new(limit, 0),
        next: (next_offset <= total).then(|| PageRef::new(limit, next_offset)),
        previous: (offset > 0).then(|| PageRef::new(limit, offset.saturating_sub(limit))),
        last: PageRef::new(limit, last_offset),
    }
}
