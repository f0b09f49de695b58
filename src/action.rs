use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// The six operations a resource pipeline exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    FindOne,
    FindAll,
    Create,
    Update,
    Destroy,
    BulkCreate,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::FindOne,
        Action::FindAll,
        Action::Create,
        Action::Update,
        Action::Destroy,
        Action::BulkCreate,
    ];

    /// Position of the action in [`Action::ALL`], used to index per-action stacks.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Action::FindOne => 0,
            Action::FindAll => 1,
            Action::Create => 2,
            Action::Update => 3,
            Action::Destroy => 4,
            Action::BulkCreate => 5,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Action::FindOne => "findOne",
            Action::FindAll => "findAll",
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "destroy",
            Action::BulkCreate => "bulkCreate",
        }
    }

    /// HTTP method the router binds this action to.
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Action::FindOne | Action::FindAll => Method::GET,
            Action::Create | Action::BulkCreate => Method::POST,
            Action::Update => Method::PUT,
            Action::Destroy => Method::DELETE,
        }
    }

    #[must_use]
    pub const fn success_status(self) -> StatusCode {
        match self {
            Action::Create | Action::BulkCreate => StatusCode::CREATED,
            Action::Destroy => StatusCode::ACCEPTED,
            Action::FindOne | Action::FindAll | Action::Update => StatusCode::OK,
        }
    }

    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Action::FindOne => "resource_found",
            Action::FindAll => "resources_found",
            Action::Create => "created",
            Action::Update => "updated",
            Action::Destroy => "deleted",
            Action::BulkCreate => "bulk_created",
        }
    }

    /// Message used when an untyped failure escapes the data port.
    #[must_use]
    pub const fn error_message(self) -> &'static str {
        match self {
            Action::FindOne | Action::FindAll => "error_finding",
            Action::Create => "error_creating",
            Action::Update => "error_updating",
            Action::Destroy => "error_deleting",
            Action::BulkCreate => "error_bulkcreating",
        }
    }

    /// Actions whose payload must arrive as `application/json`.
    #[must_use]
    pub const fn expects_json_body(self) -> bool {
        matches!(self, Action::Create | Action::Update | Action::BulkCreate)
    }

    /// Actions addressed through the primary-key path.
    #[must_use]
    pub const fn targets_single_record(self) -> bool {
        matches!(self, Action::FindOne | Action::Update | Action::Destroy)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing a name that is not one of the six actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action '{}'", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}
