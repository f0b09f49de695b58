use sea_orm::{ColumnTrait, sea_query::Order};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Direction of a findAll sort, `ASC` or `DESC` on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Case-insensitive parse of `asc`/`desc`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid sort order '{value}', expected ASC or DESC"))
        })
    }
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Resolve the column and direction for a findAll query.
///
/// The requested field wins when it names a column; otherwise the configured
/// default field, otherwise `fallback` (normally the primary key). The order
/// falls back to `default_order`.
pub fn resolve_sort<C>(
    field: Option<&str>,
    order: Option<SortOrder>,
    default_field: Option<&str>,
    default_order: SortOrder,
    fallback: C,
) -> (C, Order)
where
    C: ColumnTrait + FromStr,
{
    let column = field
        .and_then(|name| {
            let column = C::from_str(name).ok();
            if column.is_none() {
                tracing::debug!(field = name, "Ignoring sort on unknown column");
            }
            column
        })
        .or_else(|| default_field.and_then(|name| C::from_str(name).ok()))
        .unwrap_or(fallback);

    (column, order.unwrap_or(default_order).into())
}
