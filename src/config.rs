//! Pipeline and adapter configuration.
//!
//! Plain options deserialize with serde and reject unknown keys, so a typo in
//! a configuration file fails loudly instead of being ignored:
//!
//! ```rust,ignore
//! let options: PipelineOptions = serde_json::from_value(json!({
//!     "primaryKeyUrl": "/{id}",
//!     "numericPrimaryKey": true
//! }))?;
//! let config = PipelineConfig::new(options).middleware(middleware);
//! ```
//!
//! Steps and emitters are closures and attach through [`PipelineConfig`].

use serde::Deserialize;
use std::fmt;

use crate::action::Action;
use crate::emit::{SendResponse, SharedEmitter};
use crate::middleware::MiddlewareConfig;
use crate::port::Criteria;
use crate::sort::SortOrder;

const fn default_body_limit() -> usize {
    2 * 1024 * 1024
}

fn default_primary_key_url() -> String {
    "/{id}".to_string()
}

/// Options of a resource pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct PipelineOptions {
    /// Axum path of single-record routes, relative to the resource root.
    pub primary_key_url: String,
    /// Only route keys made of ASCII digits; anything else is a bare 404.
    pub numeric_primary_key: bool,
    /// Largest accepted request body, in bytes.
    pub body_limit: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            primary_key_url: default_primary_key_url(),
            numeric_primary_key: false,
            body_limit: default_body_limit(),
        }
    }
}

impl PipelineOptions {
    /// Check the options and derive the primary-key route pattern.
    pub fn key_pattern(&self) -> Result<KeyPattern, ConfigError> {
        let path = self.primary_key_url.trim();
        if !path.starts_with('/') {
            return Err(ConfigError::InvalidPrimaryKeyUrl {
                path: path.to_string(),
                reason: "must start with '/'",
            });
        }
        if !(path.contains('{') && path.contains('}')) {
            return Err(ConfigError::InvalidPrimaryKeyUrl {
                path: path.to_string(),
                reason: "must capture at least one parameter",
            });
        }
        if self.body_limit == 0 {
            return Err(ConfigError::ZeroBodyLimit);
        }
        Ok(KeyPattern {
            path: path.to_string(),
            numeric: self.numeric_primary_key,
        })
    }
}

/// Options of the Sea-ORM adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct PortOptions {
    /// Column used when findAll names no (or an unknown) sort field.
    /// Falls back to the primary key.
    pub default_sort_field: Option<String>,
    pub default_sort_order: SortOrder,
}

/// Primary-key route and its key matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    path: String,
    numeric: bool,
}

impl KeyPattern {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether captured path parameters are acceptable keys.
    #[must_use]
    pub fn accepts(&self, params: &Criteria) -> bool {
        !self.numeric
            || params
                .values()
                .all(|value| !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPrimaryKeyUrl { path: String, reason: &'static str },
    ZeroBodyLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPrimaryKeyUrl { path, reason } => {
                write!(f, "invalid primary key url '{path}': {reason}")
            }
            Self::ZeroBodyLimit => f.write_str("body limit must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything a pipeline is built from.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub options: PipelineOptions,
    pub middleware: MiddlewareConfig,
    pub send_response: SendResponse,
}

impl PipelineConfig {
    #[must_use]
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn middleware(mut self, middleware: MiddlewareConfig) -> Self {
        self.middleware = middleware;
        self
    }

    #[must_use]
    pub fn send_response(mut self, send_response: SendResponse) -> Self {
        self.send_response = send_response;
        self
    }

    /// Emit every action's response through `emitter`.
    #[must_use]
    pub fn emit_all(mut self, emitter: SharedEmitter) -> Self {
        self.send_response = self.send_response.global(emitter);
        self
    }

    #[must_use]
    pub fn emit_for(mut self, action: Action, emitter: SharedEmitter) -> Self {
        self.send_response = self.send_response.for_action(action, emitter);
        self
    }
}
