//! # Error taxonomy
//!
//! Every failure a pipeline can report falls into one of four classes, each with
//! a fixed HTTP status:
//!
//! | Variant              | Status |
//! |----------------------|--------|
//! | `ValidationFailed`   | 412    |
//! | `UnprocessableEntity`| 422    |
//! | `NotFound`           | 404    |
//! | `Internal`           | 500    |
//!
//! Data ports report either a classified [`CrudError`] or an arbitrary error
//! through [`PortError::Raw`]. Raw errors are classified by the dispatcher as
//! internal errors carrying the per-action default message.
//!
//! ## Logging
//!
//! Internal errors are logged with `tracing::error!`, everything else at debug
//! level. The library never installs a subscriber:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt()
//!     .with_target(false)
//!     .compact()
//!     .init();
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::{Value, json};
use std::fmt;

use crate::action::Action;
use crate::envelope::ResponseEnvelope;

/// Classified pipeline error.
#[derive(Debug, Clone, PartialEq)]
pub enum CrudError {
    /// 412 Precondition Failed - payload failed validation
    ValidationFailed {
        message: String,
        errors: Option<Vec<Value>>,
    },

    /// 422 Unprocessable Entity - request shape is wrong
    UnprocessableEntity {
        message: String,
        errors: Option<Vec<Value>>,
    },

    /// 404 Not Found - no record matches the criteria
    NotFound {
        message: String,
        errors: Option<Vec<Value>>,
    },

    /// 500 Internal Server Error
    Internal {
        message: String,
        errors: Option<Vec<Value>>,
    },
}

impl CrudError {
    // ============================================================================
    // Constructors
    // ============================================================================

    pub fn validation_failed(message: impl Into<String>, errors: Option<Vec<Value>>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
            errors,
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::UnprocessableEntity {
            message: message.into(),
            errors: None,
        }
    }

    /// The canonical `not_found` error returned when zero records match.
    #[must_use]
    pub fn not_found() -> Self {
        Self::NotFound {
            message: "not_found".to_string(),
            errors: None,
        }
    }

    pub fn internal(message: impl Into<String>, errors: Option<Vec<Value>>) -> Self {
        Self::Internal {
            message: message.into(),
            errors,
        }
    }

    /// Classify a database error.
    ///
    /// - `DbErr::RecordNotFound` becomes `not_found`
    /// - unique-constraint violations become `validation_failed`, with the
    ///   driver message as the single error entry
    /// - everything else is internal
    #[must_use]
    pub fn database(err: &DbErr) -> Self {
        if let DbErr::RecordNotFound(_) = err {
            return Self::not_found();
        }
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                Self::validation_failed("validation_failed", Some(vec![Value::String(detail)]))
            }
            _ => Self::internal("database_error", Some(vec![Value::String(err.to_string())])),
        }
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::ValidationFailed { .. } => 412,
            Self::UnprocessableEntity { .. } => 422,
            Self::NotFound { .. } => 404,
            Self::Internal { .. } => 500,
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationFailed { .. } => StatusCode::PRECONDITION_FAILED,
            Self::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::ValidationFailed { message, .. }
            | Self::UnprocessableEntity { message, .. }
            | Self::NotFound { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    #[must_use]
    pub fn errors(&self) -> Option<&[Value]> {
        match self {
            Self::ValidationFailed { errors, .. }
            | Self::UnprocessableEntity { errors, .. }
            | Self::NotFound { errors, .. }
            | Self::Internal { errors, .. } => errors.as_deref(),
        }
    }

    /// Consume the error into its message and error entries.
    #[must_use]
    pub fn into_parts(self) -> (String, Option<Vec<Value>>) {
        match self {
            Self::ValidationFailed { message, errors }
            | Self::UnprocessableEntity { message, errors }
            | Self::NotFound { message, errors }
            | Self::Internal { message, errors } => (message, errors),
        }
    }

    /// Render as `{code, message, errors}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "code": self.code(),
            "message": self.message(),
            "errors": self.errors(),
        })
    }

    /// Log the error, at error level when internal and debug otherwise.
    pub fn log(&self, action: Option<Action>) {
        let action = action.map_or("-", Action::name);
        match self {
            Self::Internal { message, errors } => {
                tracing::error!(
                    action,
                    message = %message,
                    errors = ?errors,
                    "Internal error occurred"
                );
            }
            _ => {
                tracing::debug!(
                    action,
                    code = self.code(),
                    message = %self.message(),
                    "Request rejected"
                );
            }
        }
    }
}

impl fmt::Display for CrudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.message())
    }
}

impl std::error::Error for CrudError {}

impl IntoResponse for CrudError {
    fn into_response(self) -> Response {
        self.log(None);
        ResponseEnvelope::from_error(self).into_response()
    }
}

impl From<DbErr> for CrudError {
    fn from(err: DbErr) -> Self {
        Self::database(&err)
    }
}

/// Failure reported by a data port.
#[derive(Debug)]
pub enum PortError {
    /// Already classified; passed through unchanged.
    Crud(CrudError),
    /// Anything else. Classified as internal with the action's default message.
    Raw(Box<dyn std::error::Error + Send + Sync>),
}

impl PortError {
    pub fn raw(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Raw(err.into())
    }

    /// Resolve into a classified error for the given action.
    #[must_use]
    pub fn classify(self, action: Action) -> CrudError {
        match self {
            Self::Crud(err) => err,
            Self::Raw(err) => CrudError::internal(
                action.error_message(),
                Some(vec![Value::String(err.to_string())]),
            ),
        }
    }
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crud(err) => fmt::Display::fmt(err, f),
            Self::Raw(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for PortError {}

impl From<CrudError> for PortError {
    fn from(err: CrudError) -> Self {
        Self::Crud(err)
    }
}

/// Not-found and unique violations keep their class; other database errors
/// stay raw so the dispatcher attaches the action's message.
impl From<DbErr> for PortError {
    fn from(err: DbErr) -> Self {
        match CrudError::database(&err) {
            CrudError::Internal { .. } => Self::Raw(Box::new(err)),
            classified => Self::Crud(classified),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_statuses() {
        let cases = vec![
            (CrudError::validation_failed("validation_failed", None), 412),
            (CrudError::unprocessable("invalid_bulk_array"), 422),
            (CrudError::not_found(), 404),
            (CrudError::internal("error_creating", None), 500),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.status_code().as_u16(), code);
        }
    }

    #[test]
    fn test_to_json_shape() {
        let err = CrudError::validation_failed(
            "validation_failed",
            Some(vec![json!({"field": "name", "message": "required"})]),
        );
        assert_eq!(
            err.to_json(),
            json!({
                "code": 412,
                "message": "validation_failed",
                "errors": [{"field": "name", "message": "required"}]
            })
        );
        assert_eq!(
            CrudError::not_found().to_json(),
            json!({"code": 404, "message": "not_found", "errors": null})
        );
    }

    #[test]
    fn test_raw_error_takes_action_message() {
        let err = PortError::raw("connection reset").classify(Action::Update);
        assert_eq!(err.code(), 500);
        assert_eq!(err.message(), "error_updating");
        assert_eq!(err.errors(), Some(&[json!("connection reset")][..]));

        let err = PortError::raw("boom").classify(Action::FindAll);
        assert_eq!(err.message(), "error_finding");
    }

    #[test]
    fn test_classified_error_passes_through() {
        let err = PortError::from(CrudError::not_found()).classify(Action::Destroy);
        assert_eq!(err, CrudError::not_found());
    }

    #[test]
    fn test_dberr_record_not_found_becomes_404() {
        let err: CrudError = DbErr::RecordNotFound("person".to_string()).into();
        assert_eq!(err.code(), 404);
        assert_eq!(err.message(), "not_found");

        let port: PortError = DbErr::RecordNotFound("person".to_string()).into();
        assert!(matches!(port, PortError::Crud(CrudError::NotFound { .. })));
    }

    #[test]
    fn test_other_dberr_stay_raw() {
        let port: PortError = DbErr::Custom("hook refused".to_string()).into();
        let err = port.classify(Action::Create);
        assert_eq!(err.code(), 500);
        assert_eq!(err.message(), "error_creating");
    }

    #[test]
    fn test_display() {
        assert_eq!(CrudError::not_found().to_string(), "404 not_found");
    }
}
