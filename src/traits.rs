use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult,
    IntoActiveModel, Iterable, ModelTrait, TryIntoModel,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::str::FromStr;

use crate::validation::ValidationErrors;

/// Ties a Sea-ORM entity to a resource served by [`SeaOrmPort`](crate::sea::SeaOrmPort).
///
/// Implemented on a marker type. Persistence lifecycle hooks belong on the
/// entity's `ActiveModelBehavior` (`before_save`, `after_save`,
/// `before_delete`, `after_delete`); an `Err` from a hook fails the request.
///
/// Create payloads omit generated keys, so the model must deserialize without
/// them, e.g. with `#[serde(skip_deserializing)]` on an auto-increment id.
///
/// ```rust,ignore
/// pub struct Persons;
///
/// impl CrudModel for Persons {
///     type Entity = person::Entity;
///     type Model = person::Model;
///     type Column = person::Column;
///     type ActiveModel = person::ActiveModel;
///
///     const RESOURCE_NAME_SINGULAR: &'static str = "person";
///     const RESOURCE_NAME_PLURAL: &'static str = "persons";
///
///     fn required_fields() -> &'static [&'static str] {
///         &["name", "last_name", "identity_doc"]
///     }
/// }
/// ```
pub trait CrudModel: Send + Sync + 'static {
    type Entity: EntityTrait<Model = Self::Model, Column = Self::Column>;
    type Model: ModelTrait<Entity = Self::Entity>
        + FromQueryResult
        + IntoActiveModel<Self::ActiveModel>
        + Serialize
        + DeserializeOwned
        + Send
        + Sync;
    type Column: ColumnTrait + Iterable + FromStr + Send + Sync;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity>
        + ActiveModelBehavior
        + TryIntoModel<Self::Model>
        + Send
        + Sync;

    const RESOURCE_NAME_SINGULAR: &'static str;
    const RESOURCE_NAME_PLURAL: &'static str;

    /// Fields a new record must carry, non-null.
    fn required_fields() -> &'static [&'static str] {
        &[]
    }

    /// Validate a create payload. Defaults to the required-field check.
    fn validate(payload: &Value) -> Result<(), ValidationErrors> {
        ValidationErrors::required(payload, Self::required_fields()).result()
    }

    /// Validate an update patch. Defaults to refusing nulls in required fields.
    fn validate_patch(patch: &Value) -> Result<(), ValidationErrors> {
        ValidationErrors::nulled(patch, Self::required_fields()).result()
    }
}
