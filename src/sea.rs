//! [`DataPort`] over a Sea-ORM entity.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IdenStatic, IntoActiveModel,
    Iterable, PaginatorTrait, PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::marker::PhantomData;

use crate::config::PortOptions;
use crate::errors::{CrudError, PortError};
use crate::filter::{apply_where, criteria_condition};
use crate::models::{FindAllQuery, Page};
use crate::pagination::compute_paging;
use crate::port::{Criteria, DataPort, bulk_entries};
use crate::sort::resolve_sort;
use crate::traits::CrudModel;
use crate::validation::{ValidationError, ValidationErrors};

/// Sea-ORM backed data port for the resource described by `M`.
///
/// Records are returned as JSON objects. Create, update, destroy and bulk
/// create each run in their own transaction.
pub struct SeaOrmPort<M> {
    db: DatabaseConnection,
    options: PortOptions,
    model: PhantomData<fn() -> M>,
}

impl<M: CrudModel> SeaOrmPort<M> {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_options(db, PortOptions::default())
    }

    #[must_use]
    pub fn with_options(db: DatabaseConnection, options: PortOptions) -> Self {
        Self {
            db,
            options,
            model: PhantomData,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn fetch(&self, criteria: &Criteria) -> Result<M::Model, PortError> {
        let condition = criteria_condition::<M::Column>(criteria)?;
        M::Entity::find()
            .filter(condition)
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                tracing::debug!(resource = M::RESOURCE_NAME_SINGULAR, ?criteria, "Record not found");
                CrudError::not_found().into()
            })
    }

    fn primary_key_column() -> Result<M::Column, PortError> {
        <M::Entity as EntityTrait>::PrimaryKey::iter()
            .next()
            .map(PrimaryKeyToColumn::into_column)
            .or_else(|| M::Column::iter().next())
            .ok_or_else(|| {
                PortError::raw(format!("{} has no columns", M::RESOURCE_NAME_PLURAL))
            })
    }

    /// Map a create payload onto a new active model. Auto-increment keys are
    /// assigned by the database, so client-supplied values are dropped.
    fn active_model(mut payload: Value) -> Result<M::ActiveModel, CrudError> {
        if <<M::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::auto_increment()
            && let Value::Object(map) = &mut payload
        {
            for key in <M::Entity as EntityTrait>::PrimaryKey::iter() {
                map.remove(key.into_column().as_str());
            }
        }
        M::ActiveModel::from_json(payload).map_err(|err| invalid_payload(&err))
    }
}

/// A payload Sea-ORM cannot map onto the model, e.g. a wrong value type.
fn invalid_payload(err: &DbErr) -> CrudError {
    CrudError::validation_failed("validation_failed", Some(vec![Value::String(err.to_string())]))
}

fn to_record<T: Serialize>(model: &T) -> Result<Value, PortError> {
    serde_json::to_value(model).map_err(PortError::raw)
}

/// Non-object bodies fail validation like a payload with no valid fields.
fn not_an_object(message: &str) -> PortError {
    CrudError::from(ValidationErrors::from(ValidationError::new("", message))).into()
}

/// Keep only the requested keys of each row.
fn project(rows: &mut [Value], fields: &[&str]) {
    for row in rows {
        if let Value::Object(map) = row {
            map.retain(|key, _| fields.contains(&key.as_str()));
        }
    }
}

#[async_trait]
impl<M: CrudModel> DataPort for SeaOrmPort<M> {
    type Record = Value;

    async fn save(&self, payload: Value) -> Result<Value, PortError> {
        if !payload.is_object() {
            return Err(not_an_object("Payload must be an object"));
        }
        M::validate(&payload).map_err(CrudError::from)?;
        let active_model = Self::active_model(payload)?;

        let txn = self.db.begin().await?;
        let model = active_model.insert(&txn).await?;
        txn.commit().await?;

        tracing::debug!(resource = M::RESOURCE_NAME_SINGULAR, "Record created");
        to_record(&model)
    }

    async fn find_one(&self, criteria: &Criteria) -> Result<Value, PortError> {
        let model = self.fetch(criteria).await?;
        to_record(&model)
    }

    async fn update(&self, criteria: &Criteria, patch: Value) -> Result<Value, PortError> {
        let is_empty = match &patch {
            Value::Object(map) => map.is_empty(),
            _ => return Err(not_an_object("Patch must be an object")),
        };
        let existing = self.fetch(criteria).await?;
        M::validate_patch(&patch).map_err(CrudError::from)?;
        if is_empty {
            return to_record(&existing);
        }

        // Apply the patch over the stored values so every column deserializes.
        let mut merged = to_record(&existing)?;
        if let (Value::Object(target), Value::Object(changes)) = (&mut merged, patch) {
            target.extend(changes);
        }
        let mut active_model: M::ActiveModel = existing.into_active_model();
        active_model
            .set_from_json(merged)
            .map_err(|err| invalid_payload(&err))?;

        let txn = self.db.begin().await?;
        let model = active_model.update(&txn).await?;
        txn.commit().await?;

        tracing::debug!(resource = M::RESOURCE_NAME_SINGULAR, ?criteria, "Record updated");
        to_record(&model)
    }

    async fn destroy(&self, criteria: &Criteria) -> Result<Value, PortError> {
        let existing = self.fetch(criteria).await?;
        let snapshot = to_record(&existing)?;

        let txn = self.db.begin().await?;
        let active_model: M::ActiveModel = existing.into_active_model();
        active_model.delete(&txn).await?;
        txn.commit().await?;

        tracing::debug!(resource = M::RESOURCE_NAME_SINGULAR, ?criteria, "Record deleted");
        Ok(snapshot)
    }

    async fn find_all(&self, query: &FindAllQuery) -> Result<Page<Value>, PortError> {
        // Drivers bind limit and offset as signed 64-bit integers
        if query.limit == 0 || i64::try_from(query.limit).is_err() {
            return Err(CrudError::unprocessable("invalid_limit").into());
        }
        if i64::try_from(query.offset).is_err() {
            return Err(CrudError::unprocessable("invalid_offset").into());
        }

        let condition = apply_where::<M::Column>(query.filter.as_deref());
        let (column, order) = resolve_sort::<M::Column>(
            query.sort_field.as_deref(),
            query.sort_order,
            self.options.default_sort_field.as_deref(),
            self.options.default_sort_order,
            Self::primary_key_column()?,
        );

        let count = PaginatorTrait::count(M::Entity::find().filter(condition.clone()), &self.db)
            .await?;
        let models = M::Entity::find()
            .filter(condition)
            .order_by(column, order)
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await?;

        let mut rows = models
            .iter()
            .map(to_record)
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(fields) = query.field_list() {
            project(&mut rows, &fields);
        }

        Ok(Page {
            rows,
            count,
            paging_info: compute_paging(count, query.limit, query.offset),
        })
    }

    async fn bulk_create(&self, payloads: Value) -> Result<Vec<Value>, PortError> {
        let entries = bulk_entries(payloads)?;

        let mut rejected = Vec::new();
        let mut active_models = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            if !entry.is_object() {
                rejected.push(json!({
                    "index": index,
                    "errors": [{"field": "", "message": "Entry must be an object"}],
                }));
                continue;
            }
            if let Err(errors) = M::validate(&entry) {
                rejected.push(json!({ "index": index, "errors": errors.to_values() }));
                continue;
            }
            match Self::active_model(entry) {
                Ok(active_model) => active_models.push(active_model),
                Err(err) => rejected.push(json!({ "index": index, "errors": err.errors() })),
            }
        }
        if !rejected.is_empty() {
            tracing::debug!(
                resource = M::RESOURCE_NAME_PLURAL,
                rejected = rejected.len(),
                "Bulk payload rejected"
            );
            return Err(CrudError::validation_failed("validation_failed", Some(rejected)).into());
        }

        let txn = self.db.begin().await?;
        let mut records = Vec::with_capacity(active_models.len());
        for active_model in active_models {
            let model = active_model.insert(&txn).await?;
            records.push(to_record(&model)?);
        }
        txn.commit().await?;

        tracing::debug!(
            resource = M::RESOURCE_NAME_PLURAL,
            count = records.len(),
            "Records bulk created"
        );
        Ok(records)
    }
}
