//! # crudpipe
//!
//! Uniform CRUD request pipelines for Axum. A [`ResourcePipeline`] drives any
//! [`DataPort`] through the same request lifecycle for six actions (findOne,
//! findAll, create, update, destroy, bulkCreate), with per-action middleware,
//! a single response envelope and a fixed error taxonomy.
//!
//! ```rust,ignore
//! use crudpipe::{PipelineConfig, ResourcePipeline, SeaOrmPort};
//!
//! let port = Arc::new(SeaOrmPort::<Persons>::new(db));
//! let pipeline = ResourcePipeline::new(port, PipelineConfig::default())?;
//! let app = Router::new().nest("/persons", pipeline.router());
//! ```

pub mod action;
pub mod config;
pub mod context;
pub mod emit;
pub mod envelope;
pub mod errors;
pub mod filter;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod pipeline;
pub mod port;
pub mod routes;
pub mod sea;
pub mod sort;
pub mod traits;
pub mod validation;

pub use action::Action;
pub use config::{ConfigError, KeyPattern, PipelineConfig, PipelineOptions, PortOptions};
pub use context::RequestContext;
pub use emit::{ResponseEmitter, SendResponse, SharedEmitter, emitter};
pub use envelope::ResponseEnvelope;
pub use errors::{CrudError, PortError};
pub use middleware::{
    AfterStep, Flow, MiddlewareConfig, MiddlewareSlot, ResolvedMiddleware, SharedAfterStep,
    SharedStep, SlotMode, Step, Steps, after_step, step,
};
pub use models::{FindAllQuery, Page};
pub use pagination::{PageRef, PagingInfo, compute_paging};
pub use pipeline::ResourcePipeline;
pub use port::{Criteria, DataPort};
pub use sea::SeaOrmPort;
pub use sort::SortOrder;
pub use traits::CrudModel;
pub use validation::{ValidationError, ValidationErrors};
