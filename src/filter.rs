use sea_orm::{ColumnTrait, ColumnType, Condition, Value as DbValue};
use serde_json::{Map, Value};
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::CrudError;
use crate::port::Criteria;

fn is_integer(column_type: &ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned
    )
}

/// Convert a JSON scalar into a database value suited to `column`.
///
/// Nested arrays and objects have no scalar counterpart and yield `None`.
fn json_to_value<C: ColumnTrait>(column: &C, value: &Value) -> Option<DbValue> {
    match value {
        Value::Bool(flag) => Some((*flag).into()),
        Value::Number(number) => number
            .as_i64()
            .map(DbValue::from)
            .or_else(|| number.as_f64().map(DbValue::from)),
        Value::String(text) => {
            let text = text.trim();
            if matches!(column.def().get_column_type(), ColumnType::Uuid)
                && let Ok(uuid) = Uuid::parse_str(text)
            {
                return Some(uuid.into());
            }
            Some(text.to_string().into())
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Build the findAll `where` condition.
///
/// The filter is a JSON object keyed by column name:
/// - scalar values match with `=`
/// - arrays match with `IN`
/// - `null` matches with `IS NULL`
///
/// Unknown columns and unparsable filters are ignored.
pub fn apply_where<C>(filter: Option<&str>) -> Condition
where
    C: ColumnTrait + FromStr,
{
    let mut condition = Condition::all();
    let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) else {
        return condition;
    };

    let filters: Map<String, Value> = match serde_json::from_str(filter) {
        Ok(filters) => filters,
        Err(err) => {
            tracing::debug!(filter, error = %err, "Ignoring unparsable where filter");
            return condition;
        }
    };

    for (key, value) in &filters {
        let Ok(column) = C::from_str(key) else {
            tracing::debug!(column = %key, "Ignoring filter on unknown column");
            continue;
        };
        match value {
            Value::Null => condition = condition.add(column.is_null()),
            Value::Array(items) => {
                let values: Vec<DbValue> = items
                    .iter()
                    .filter_map(|item| json_to_value(&column, item))
                    .collect();
                condition = condition.add(column.is_in(values));
            }
            scalar => {
                if let Some(value) = json_to_value(&column, scalar) {
                    condition = condition.add(column.eq(value));
                }
            }
        }
    }

    condition
}

/// Build the condition selecting the record addressed by path criteria.
///
/// A value that cannot be converted to the column type cannot match any
/// record and yields `not_found`. Criteria naming no column of the resource
/// are a routing misconfiguration and yield an internal error.
pub fn criteria_condition<C>(criteria: &Criteria) -> Result<Condition, CrudError>
where
    C: ColumnTrait + FromStr,
{
    if criteria.is_empty() {
        return Err(CrudError::internal("missing_criteria", None));
    }

    let mut condition = Condition::all();
    for (key, raw) in criteria {
        let column = C::from_str(key).map_err(|_| {
            CrudError::internal(
                "invalid_criteria",
                Some(vec![Value::String(format!("unknown column '{key}'"))]),
            )
        })?;

        let column_type = column.def().get_column_type().clone();
        let value: DbValue = if is_integer(&column_type) {
            raw.parse::<i64>().map_err(|_| CrudError::not_found())?.into()
        } else if matches!(column_type, ColumnType::Uuid) {
            Uuid::parse_str(raw).map_err(|_| CrudError::not_found())?.into()
        } else {
            raw.clone().into()
        };
        condition = condition.add(column.eq(value));
    }

    Ok(condition)
}
