use axum::{
    body::Bytes,
    extract::Query,
    http::{
        Extensions, HeaderMap, HeaderName, HeaderValue, Method, Uri, header::CONTENT_TYPE,
        request::Parts,
    },
};
use serde_json::Value;

use crate::action::Action;
use crate::errors::CrudError;
use crate::models::FindAllQuery;
use crate::port::Criteria;

/// A fully buffered inbound request, shared by every step of one dispatch.
///
/// Before-steps may mutate it (headers, params, body) and stash typed
/// per-request state in [`RequestContext::extensions_mut`]; after-steps and
/// emitters see the final state.
#[derive(Debug)]
pub struct RequestContext {
    action: Action,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: Criteria,
    body: Bytes,
    extensions: Extensions,
}

impl RequestContext {
    /// Build from split request parts and an already collected body.
    #[must_use]
    pub fn from_parts(action: Action, parts: Parts, params: Criteria, body: Bytes) -> Self {
        Self {
            action,
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params,
            body,
            extensions: parts.extensions,
        }
    }

    #[must_use]
    pub fn builder(action: Action) -> RequestContextBuilder {
        RequestContextBuilder::new(action)
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Path parameters captured by the primary-key route.
    pub fn params(&self) -> &Criteria {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Criteria {
        &mut self.params
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Whether `Content-Type` names JSON (`application/json` or any `+json` type).
    #[must_use]
    pub fn is_json(&self) -> bool {
        let Some(content_type) = self
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        else {
            return false;
        };
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
    }

    /// Parse the body as JSON. An empty body reads as `{}`.
    pub fn json_body(&self) -> Result<Value, CrudError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_slice(&self.body).map_err(|err| {
            CrudError::UnprocessableEntity {
                message: "invalid_json".to_string(),
                errors: Some(vec![Value::String(err.to_string())]),
            }
        })
    }

    /// Parse the query string into findAll parameters.
    pub fn find_all_query(&self) -> Result<FindAllQuery, CrudError> {
        Query::<FindAllQuery>::try_from_uri(&self.uri)
            .map(|Query(query)| query)
            .map_err(|rejection| CrudError::UnprocessableEntity {
                message: "invalid_query".to_string(),
                errors: Some(vec![Value::String(rejection.body_text())]),
            })
    }
}

/// Builds a [`RequestContext`] without an HTTP request, e.g. for non-axum
/// transports and tests.
#[derive(Debug)]
pub struct RequestContextBuilder {
    action: Action,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: Criteria,
    body: Bytes,
}

impl RequestContextBuilder {
    fn new(action: Action) -> Self {
        Self {
            action,
            method: action.method(),
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            params: Criteria::new(),
            body: Bytes::new(),
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the request URI. Unparsable values leave the URI unchanged.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        match uri.parse() {
            Ok(uri) => self.uri = uri,
            Err(err) => tracing::warn!(uri, error = %err, "Ignoring invalid request URI"),
        }
        self
    }

    /// Set a header. Invalid names or values are skipped.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "Ignoring invalid header"),
        }
        self
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body and `Content-Type: application/json`.
    #[must_use]
    pub fn json(mut self, value: &Value) -> Self {
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Bytes::from(value.to_string());
        self
    }

    #[must_use]
    pub fn build(self) -> RequestContext {
        RequestContext {
            action: self.action,
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            params: self.params,
            body: self.body,
            extensions: Extensions::new(),
        }
    }
}
