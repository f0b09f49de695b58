//! # Per-action middleware
//!
//! Each pipeline carries two middleware slots. Before-steps run ahead of the
//! data-port call and may short-circuit with their own response; after-steps
//! observe the finished request once the response has been produced.
//!
//! A slot is configured in one of two shapes:
//!
//! - [`MiddlewareSlot::Global`]: the same steps for every action
//! - [`MiddlewareSlot::Local`]: steps keyed by [`Action`]
//!
//! The shape is fixed when the pipeline is built, where the slots are resolved
//! into one ordered stack per action. Entries the resolver cannot use are
//! logged with `tracing::warn!` and skipped:
//!
//! - a global after slot holding several steps
//! - a local after entry holding several steps
//!
//! ```rust,ignore
//! use crudpipe::{Action, Flow, MiddlewareConfig, step, after_step};
//!
//! let middleware = MiddlewareConfig::new()
//!     .before_for(Action::FindAll, step(|ctx| {
//!         ctx.extensions_mut().insert(Scenario("listing"));
//!         Flow::Next
//!     }))
//!     .after_all(after_step(|ctx, envelope| {
//!         tracing::info!(action = %ctx.action(), status = envelope.status, "served");
//!     }));
//! ```

use async_trait::async_trait;
use axum::response::Response;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::context::RequestContext;
use crate::envelope::ResponseEnvelope;

/// Outcome of a before-step.
#[derive(Debug)]
pub enum Flow {
    /// Continue with the next step, then the action.
    Next,
    /// Stop here and send this response. The action and the after-steps are skipped.
    Respond(Response),
}

/// A step run before the action.
#[async_trait]
pub trait Step: Send + Sync + 'static {
    async fn call(&self, ctx: &mut RequestContext) -> Flow;
}

#[async_trait]
impl<F> Step for F
where
    F: Fn(&mut RequestContext) -> Flow + Send + Sync + 'static,
{
    async fn call(&self, ctx: &mut RequestContext) -> Flow {
        self(ctx)
    }
}

/// A step run after the response has been produced.
#[async_trait]
pub trait AfterStep: Send + Sync + 'static {
    async fn call(&self, ctx: &RequestContext, envelope: &ResponseEnvelope);
}

#[async_trait]
impl<F> AfterStep for F
where
    F: Fn(&RequestContext, &ResponseEnvelope) + Send + Sync + 'static,
{
    async fn call(&self, ctx: &RequestContext, envelope: &ResponseEnvelope) {
        self(ctx, envelope);
    }
}

pub type SharedStep = Arc<dyn Step>;
pub type SharedAfterStep = Arc<dyn AfterStep>;

/// Wrap a synchronous closure as a before-step.
pub fn step<F>(f: F) -> SharedStep
where
    F: Fn(&mut RequestContext) -> Flow + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a synchronous closure as an after-step.
pub fn after_step<F>(f: F) -> SharedAfterStep
where
    F: Fn(&RequestContext, &ResponseEnvelope) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One step or an ordered list of steps.
#[derive(Clone)]
pub enum Steps<S> {
    One(S),
    Many(Vec<S>),
}

impl<S> Steps<S> {
    fn push(self, step: S) -> Self {
        match self {
            Steps::One(first) => Steps::Many(vec![first, step]),
            Steps::Many(mut steps) => {
                steps.push(step);
                Steps::Many(steps)
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Steps::One(_) => 1,
            Steps::Many(steps) => steps.len(),
        }
    }
}

/// Configuration shape of one middleware slot.
#[derive(Clone)]
pub enum MiddlewareSlot<S> {
    Absent,
    Global(Steps<S>),
    Local(HashMap<Action, Steps<S>>),
}

impl<S> Default for MiddlewareSlot<S> {
    fn default() -> Self {
        MiddlewareSlot::Absent
    }
}

impl<S> MiddlewareSlot<S> {
    #[must_use]
    pub fn mode(&self) -> SlotMode {
        match self {
            MiddlewareSlot::Absent => SlotMode::Absent,
            MiddlewareSlot::Global(_) => SlotMode::Global,
            MiddlewareSlot::Local(_) => SlotMode::Local,
        }
    }
}

impl<S> fmt::Debug for MiddlewareSlot<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareSlot::Absent => f.write_str("Absent"),
            MiddlewareSlot::Global(steps) => write!(f, "Global({} step(s))", steps.len()),
            MiddlewareSlot::Local(map) => {
                let mut actions: Vec<_> = map.keys().map(|action| action.name()).collect();
                actions.sort_unstable();
                write!(f, "Local({actions:?})")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMode {
    Absent,
    Global,
    Local,
}

/// Before and after slots of a pipeline.
#[derive(Clone, Default, Debug)]
pub struct MiddlewareConfig {
    pub before: MiddlewareSlot<SharedStep>,
    pub after: MiddlewareSlot<SharedAfterStep>,
}

impl MiddlewareConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a before-step to every action. Switches a local slot to global.
    #[must_use]
    pub fn before_all(mut self, step: SharedStep) -> Self {
        self.before = match self.before {
            MiddlewareSlot::Global(steps) => MiddlewareSlot::Global(steps.push(step)),
            MiddlewareSlot::Local(_) => {
                tracing::warn!("Replacing per-action before middleware with a global step");
                MiddlewareSlot::Global(Steps::One(step))
            }
            MiddlewareSlot::Absent => MiddlewareSlot::Global(Steps::One(step)),
        };
        self
    }

    /// Add a before-step to one action. Ignored when the slot is global.
    #[must_use]
    pub fn before_for(mut self, action: Action, step: SharedStep) -> Self {
        self.before = match self.before {
            MiddlewareSlot::Global(steps) => {
                tracing::warn!(%action, "Before middleware is global; ignoring per-action step");
                MiddlewareSlot::Global(steps)
            }
            MiddlewareSlot::Local(mut map) => {
                let steps = match map.remove(&action) {
                    Some(steps) => steps.push(step),
                    None => Steps::One(step),
                };
                map.insert(action, steps);
                MiddlewareSlot::Local(map)
            }
            MiddlewareSlot::Absent => {
                MiddlewareSlot::Local(HashMap::from([(action, Steps::One(step))]))
            }
        };
        self
    }

    /// Set the after-step run for every action.
    #[must_use]
    pub fn after_all(mut self, step: SharedAfterStep) -> Self {
        if !matches!(self.after, MiddlewareSlot::Absent) {
            tracing::warn!("Replacing previously configured after middleware");
        }
        self.after = MiddlewareSlot::Global(Steps::One(step));
        self
    }

    /// Set the after-step of one action. Ignored when the slot is global.
    #[must_use]
    pub fn after_for(mut self, action: Action, step: SharedAfterStep) -> Self {
        self.after = match self.after {
            MiddlewareSlot::Global(steps) => {
                tracing::warn!(%action, "After middleware is global; ignoring per-action step");
                MiddlewareSlot::Global(steps)
            }
            MiddlewareSlot::Local(mut map) => {
                if map.insert(action, Steps::One(step)).is_some() {
                    tracing::warn!(%action, "Replacing after middleware");
                }
                MiddlewareSlot::Local(map)
            }
            MiddlewareSlot::Absent => {
                MiddlewareSlot::Local(HashMap::from([(action, Steps::One(step))]))
            }
        };
        self
    }
}

/// Middleware stacks per action, computed once from a [`MiddlewareConfig`].
#[derive(Clone)]
pub struct ResolvedMiddleware {
    before: [Vec<SharedStep>; 6],
    after: [Vec<SharedAfterStep>; 6],
    before_mode: SlotMode,
    after_mode: SlotMode,
}

impl ResolvedMiddleware {
    #[must_use]
    pub fn resolve(config: MiddlewareConfig) -> Self {
        let before_mode = config.before.mode();
        let after_mode = config.after.mode();

        let mut before: [Vec<SharedStep>; 6] = std::array::from_fn(|_| Vec::new());
        match config.before {
            MiddlewareSlot::Absent => {}
            MiddlewareSlot::Global(steps) => {
                let steps = match steps {
                    Steps::One(step) => vec![step],
                    Steps::Many(steps) => steps,
                };
                for stack in &mut before {
                    stack.clone_from(&steps);
                }
            }
            MiddlewareSlot::Local(map) => {
                for (action, steps) in map {
                    let stack = &mut before[action.index()];
                    match steps {
                        Steps::One(step) => stack.push(step),
                        Steps::Many(steps) => stack.extend(steps),
                    }
                }
            }
        }

        let mut after: [Vec<SharedAfterStep>; 6] = std::array::from_fn(|_| Vec::new());
        match config.after {
            MiddlewareSlot::Absent => {}
            MiddlewareSlot::Global(Steps::One(step)) => {
                for stack in &mut after {
                    stack.push(Arc::clone(&step));
                }
            }
            MiddlewareSlot::Global(Steps::Many(steps)) => {
                tracing::warn!(
                    count = steps.len(),
                    "Global after middleware must be a single step; skipping"
                );
            }
            MiddlewareSlot::Local(map) => {
                for (action, steps) in map {
                    match steps {
                        Steps::One(step) => after[action.index()].push(step),
                        Steps::Many(steps) => tracing::warn!(
                            %action,
                            count = steps.len(),
                            "Per-action after middleware must be a single step; skipping"
                        ),
                    }
                }
            }
        }

        Self {
            before,
            after,
            before_mode,
            after_mode,
        }
    }

    #[must_use]
    pub fn before(&self, action: Action) -> &[SharedStep] {
        &self.before[action.index()]
    }

    #[must_use]
    pub fn after(&self, action: Action) -> &[SharedAfterStep] {
        &self.after[action.index()]
    }

    #[must_use]
    pub fn before_mode(&self) -> SlotMode {
        self.before_mode
    }

    #[must_use]
    pub fn after_mode(&self) -> SlotMode {
        self.after_mode
    }
}

impl fmt::Debug for ResolvedMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for action in Action::ALL {
            map.entry(
                &action.name(),
                &(self.before(action).len(), self.after(action).len()),
            );
        }
        map.finish()
    }
}
