//! Validation Support
//!
//! Field-level validation failures collected before a payload reaches the
//! database. A non-empty [`ValidationErrors`] converts into a
//! `validation_failed` (412) [`CrudError`] whose `errors` list holds one
//! `{field, message}` object per failure.
//!
//! # Example
//!
//! ```rust,ignore
//! use crudpipe::validation::{ValidationErrors, validators};
//! use serde_json::Value;
//!
//! fn validate(payload: &Value) -> Result<(), ValidationErrors> {
//!     let mut errors = ValidationErrors::required(payload, &["name"]);
//!     if let Some(name) = payload.get("name").and_then(Value::as_str) {
//!         errors.check(validators::validate_length("name", name, Some(2), Some(64)));
//!     }
//!     errors.result()
//! }
//! ```

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::errors::CrudError;

/// Validation error with field name and message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "field": self.field, "message": self.message })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Errors for every field in `required` that is missing or null in `payload`.
    #[must_use]
    pub fn required(payload: &Value, required: &[&str]) -> Self {
        let mut errors = Self::new();
        for field in required {
            if payload.get(field).is_none_or(Value::is_null) {
                errors.add(ValidationError::new(*field, "This field is required"));
            }
        }
        errors
    }

    /// Errors for every field in `required` that a patch sets to null.
    ///
    /// Absent fields are fine in a patch; they keep their stored value.
    #[must_use]
    pub fn nulled(patch: &Value, required: &[&str]) -> Self {
        let mut errors = Self::new();
        for field in required {
            if patch.get(field).is_some_and(Value::is_null) {
                errors.add(ValidationError::new(*field, "This field cannot be null"));
            }
        }
        errors
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Record the failure of a single check, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(error) = result {
            self.add(error);
        }
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    #[must_use]
    pub fn to_values(&self) -> Vec<Value> {
        self.errors.iter().map(ValidationError::to_value).collect()
    }

    /// Convert to Result
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl From<ValidationErrors> for CrudError {
    fn from(errors: ValidationErrors) -> Self {
        CrudError::validation_failed("validation_failed", Some(errors.to_values()))
    }
}

/// Helper validators for common patterns
pub mod validators {
    use super::ValidationError;

    /// Validate string length is within range
    pub fn validate_length(
        field: &str,
        value: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Result<(), ValidationError> {
        let len = value.chars().count();

        if let Some(min_len) = min
            && len < min_len
        {
            return Err(ValidationError::new(
                field,
                format!("Must be at least {min_len} characters"),
            ));
        }

        if let Some(max_len) = max
            && len > max_len
        {
            return Err(ValidationError::new(
                field,
                format!("Must be at most {max_len} characters"),
            ));
        }

        Ok(())
    }

    /// Validate value is not blank
    pub fn validate_required(field: &str, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new(field, "This field is required"));
        }
        Ok(())
    }
}
