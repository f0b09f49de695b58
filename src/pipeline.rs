//! # Request dispatch
//!
//! A [`ResourcePipeline`] runs every request through the same sequence:
//!
//! 1. before-steps of the action, in order; any step may respond early
//! 2. the content-type check for create, update and bulkCreate
//! 3. the data-port call
//! 4. the response envelope, emitted through the configured emitter
//! 5. after-steps, on a spawned task
//!
//! Early responses from before-steps skip everything after step 1.

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::{FromRequestParts, Path, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::action::Action;
use crate::config::{ConfigError, KeyPattern, PipelineConfig};
use crate::context::RequestContext;
use crate::emit::SendResponse;
use crate::envelope::ResponseEnvelope;
use crate::errors::{CrudError, PortError};
use crate::middleware::{Flow, ResolvedMiddleware, SharedAfterStep};
use crate::port::{Criteria, DataPort};

struct Inner<P> {
    port: Arc<P>,
    middleware: ResolvedMiddleware,
    send_response: SendResponse,
    key: KeyPattern,
    body_limit: usize,
}

/// CRUD request pipeline for one resource.
///
/// Built once; cloning shares the same port, middleware and emitters.
pub struct ResourcePipeline<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for ResourcePipeline<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: DataPort> ResourcePipeline<P> {
    /// Validate the configuration and resolve the middleware stacks.
    pub fn new(port: Arc<P>, config: PipelineConfig) -> Result<Self, ConfigError> {
        let key = config.options.key_pattern()?;
        let middleware = ResolvedMiddleware::resolve(config.middleware);
        tracing::debug!(
            primary_key = key.path(),
            before_mode = ?middleware.before_mode(),
            after_mode = ?middleware.after_mode(),
            middleware = ?middleware,
            send_response = ?config.send_response,
            "Resource pipeline configured"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                port,
                middleware,
                send_response: config.send_response,
                key,
                body_limit: config.options.body_limit,
            }),
        })
    }

    pub fn port(&self) -> &Arc<P> {
        &self.inner.port
    }

    pub fn middleware(&self) -> &ResolvedMiddleware {
        &self.inner.middleware
    }

    pub fn key_pattern(&self) -> &KeyPattern {
        &self.inner.key
    }

    /// Buffer an axum request and dispatch it as `action`.
    ///
    /// Keys rejected by the primary-key matcher get a bare 404, as for an
    /// unmatched route. Keys that cannot be decoded at all (e.g. invalid
    /// UTF-8) get a `not_found` envelope.
    pub async fn handle(&self, action: Action, request: Request) -> Response {
        let (mut parts, body) = request.into_parts();

        let params = if action.targets_single_record() {
            match Path::<Criteria>::from_request_parts(&mut parts, &()).await {
                Ok(Path(params)) => params,
                Err(rejection) => {
                    tracing::debug!(
                        %action,
                        error = %rejection.body_text(),
                        "Undecodable key"
                    );
                    let ctx =
                        RequestContext::from_parts(action, parts, Criteria::new(), Bytes::new());
                    return self
                        .inner
                        .send_response
                        .emit(&ctx, ResponseEnvelope::from_error(CrudError::not_found()));
                }
            }
        } else {
            Criteria::new()
        };

        if !self.inner.key.accepts(&params) {
            tracing::debug!(%action, ?params, "Key rejected by primary key pattern");
            return StatusCode::NOT_FOUND.into_response();
        }

        match collect_body(body, self.inner.body_limit).await {
            Ok(bytes) => {
                let ctx = RequestContext::from_parts(action, parts, params, bytes);
                self.dispatch(ctx).await
            }
            Err(err) => {
                err.log(Some(action));
                let ctx = RequestContext::from_parts(action, parts, params, Bytes::new());
                self.inner
                    .send_response
                    .emit(&ctx, ResponseEnvelope::from_error(err))
            }
        }
    }

    /// Run a buffered request through the pipeline.
    pub async fn dispatch(&self, mut ctx: RequestContext) -> Response {
        let action = ctx.action();
        tracing::debug!(%action, method = %ctx.method(), uri = %ctx.uri(), "Dispatching request");

        for step in self.inner.middleware.before(action) {
            if let Flow::Respond(response) = step.call(&mut ctx).await {
                tracing::debug!(%action, status = %response.status(), "Before middleware responded");
                return response;
            }
        }

        let envelope = match self.perform(&ctx).await {
            Ok(data) => ResponseEnvelope::success(action, data),
            Err(err) => {
                err.log(Some(action));
                ResponseEnvelope::from_error(err)
            }
        };

        tracing::debug!(
            %action,
            status = envelope.status,
            success = envelope.is_success(),
            "Request handled"
        );
        let response = self.inner.send_response.emit(&ctx, envelope.clone());
        self.run_after(ctx, envelope).await;
        response
    }

    async fn perform(&self, ctx: &RequestContext) -> Result<Value, CrudError> {
        let action = ctx.action();
        if action.expects_json_body() && !ctx.is_json() {
            return Err(CrudError::unprocessable("content_type_json"));
        }

        let port = &self.inner.port;
        match action {
            Action::Create => {
                let payload = ctx.json_body()?;
                to_data(action, port.save(payload).await)
            }
            Action::FindOne => to_data(action, port.find_one(ctx.params()).await),
            Action::Update => {
                let patch = ctx.json_body()?;
                to_data(action, port.update(ctx.params(), patch).await)
            }
            Action::Destroy => to_data(action, port.destroy(ctx.params()).await),
            Action::FindAll => {
                let query = ctx.find_all_query()?;
                to_data(action, port.find_all(&query).await)
            }
            Action::BulkCreate => {
                let payloads = ctx.json_body()?;
                to_data(action, port.bulk_create(payloads).await)
            }
        }
    }

    /// Hand the finished request to the after-steps without holding up the response.
    async fn run_after(&self, ctx: RequestContext, envelope: ResponseEnvelope) {
        let steps: Vec<SharedAfterStep> = self.inner.middleware.after(ctx.action()).to_vec();
        if steps.is_empty() {
            return;
        }

        let task = async move {
            for step in &steps {
                step.call(&ctx, &envelope).await;
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => task.await,
        }
    }
}

async fn collect_body(body: Body, limit: usize) -> Result<Bytes, CrudError> {
    to_bytes(body, limit)
        .await
        .map_err(|err| CrudError::UnprocessableEntity {
            message: "invalid_body".to_string(),
            errors: Some(vec![Value::String(err.to_string())]),
        })
}

fn to_data<T: Serialize>(action: Action, result: Result<T, PortError>) -> Result<Value, CrudError> {
    let record = result.map_err(|err| err.classify(action))?;
    serde_json::to_value(record).map_err(|err| PortError::raw(err).classify(action))
}
