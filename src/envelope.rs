use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::action::Action;
use crate::errors::CrudError;

/// Uniform response body produced for every request, success or failure.
///
/// ```json
/// {"status": 201, "statusMessage": "Created", "message": "created", "data": {...}, "errors": null}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status: u16,
    /// Canonical reason phrase of `status`
    pub status_message: String,
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub errors: Option<Vec<Value>>,
}

impl ResponseEnvelope {
    pub fn new(
        status: StatusCode,
        message: impl Into<String>,
        data: Option<Value>,
        errors: Option<Vec<Value>>,
    ) -> Self {
        Self {
            status: status.as_u16(),
            status_message: status.canonical_reason().unwrap_or_default().to_string(),
            message: message.into(),
            data,
            errors,
        }
    }

    /// Success envelope for `action`, using its status and message.
    #[must_use]
    pub fn success(action: Action, data: Value) -> Self {
        Self::new(
            action.success_status(),
            action.success_message(),
            Some(data),
            None,
        )
    }

    #[must_use]
    pub fn from_error(err: CrudError) -> Self {
        let status = err.status_code();
        let (message, errors) = err.into_parts();
        Self::new(status, message, None, errors)
    }

    /// Status as an HTTP status code, falling back to 500 for out-of-range values.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code().is_success()
    }
}

/// Default emission: `status` as the transport status, the envelope as JSON.
impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
