use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::context::RequestContext;
use crate::envelope::ResponseEnvelope;

/// Turns a finished envelope into the transport response.
pub trait ResponseEmitter: Send + Sync + 'static {
    fn emit(&self, ctx: &RequestContext, envelope: ResponseEnvelope) -> Response;
}

impl<F> ResponseEmitter for F
where
    F: Fn(&RequestContext, ResponseEnvelope) -> Response + Send + Sync + 'static,
{
    fn emit(&self, ctx: &RequestContext, envelope: ResponseEnvelope) -> Response {
        self(ctx, envelope)
    }
}

pub type SharedEmitter = Arc<dyn ResponseEmitter>;

/// Wrap a closure as an emitter.
pub fn emitter<F>(f: F) -> SharedEmitter
where
    F: Fn(&RequestContext, ResponseEnvelope) -> Response + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Emission overrides. A global emitter wins over per-action emitters for
/// every action; without either, the envelope is sent as JSON with its
/// `status` as the HTTP status.
#[derive(Clone, Default)]
pub struct SendResponse {
    global: Option<SharedEmitter>,
    per_action: HashMap<Action, SharedEmitter>,
}

impl SendResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn global(mut self, emitter: SharedEmitter) -> Self {
        self.global = Some(emitter);
        self
    }

    #[must_use]
    pub fn for_action(mut self, action: Action, emitter: SharedEmitter) -> Self {
        self.per_action.insert(action, emitter);
        self
    }

    /// The emitter that applies to `action`, if any override does.
    #[must_use]
    pub fn resolve(&self, action: Action) -> Option<&SharedEmitter> {
        self.global.as_ref().or_else(|| self.per_action.get(&action))
    }

    pub fn emit(&self, ctx: &RequestContext, envelope: ResponseEnvelope) -> Response {
        match self.resolve(ctx.action()) {
            Some(emitter) => emitter.emit(ctx, envelope),
            None => envelope.into_response(),
        }
    }
}

impl fmt::Debug for SendResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut per_action: Vec<_> = self.per_action.keys().map(|action| action.name()).collect();
        per_action.sort_unstable();
        f.debug_struct("SendResponse")
            .field("global", &self.global.is_some())
            .field("per_action", &per_action)
            .finish()
    }
}
