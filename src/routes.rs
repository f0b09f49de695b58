use axum::{
    Router,
    extract::{Request, State},
    response::Response,
    routing::{get, post},
};

use crate::action::Action;
use crate::pipeline::ResourcePipeline;
use crate::port::DataPort;

// Get a page of resources.
async fn find_all<P: DataPort>(
    State(pipeline): State<ResourcePipeline<P>>,
    request: Request,
) -> Response {
    pipeline.handle(Action::FindAll, request).await
}

// Get one resource.
async fn find_one<P: DataPort>(
    State(pipeline): State<ResourcePipeline<P>>,
    request: Request,
) -> Response {
    pipeline.handle(Action::FindOne, request).await
}

// Create one resource.
async fn create<P: DataPort>(
    State(pipeline): State<ResourcePipeline<P>>,
    request: Request,
) -> Response {
    pipeline.handle(Action::Create, request).await
}

// Update one resource.
async fn update<P: DataPort>(
    State(pipeline): State<ResourcePipeline<P>>,
    request: Request,
) -> Response {
    pipeline.handle(Action::Update, request).await
}

// Delete one resource.
async fn destroy<P: DataPort>(
    State(pipeline): State<ResourcePipeline<P>>,
    request: Request,
) -> Response {
    pipeline.handle(Action::Destroy, request).await
}

// Create many resources at once.
async fn bulk_create<P: DataPort>(
    State(pipeline): State<ResourcePipeline<P>>,
    request: Request,
) -> Response {
    pipeline.handle(Action::BulkCreate, request).await
}

impl<P: DataPort> ResourcePipeline<P> {
    /// Routes of the resource, meant to be nested under its base path:
    ///
    /// | Method | Path          | Action     |
    /// |--------|---------------|------------|
    /// | GET    | `/`           | findAll    |
    /// | POST   | `/`           | create     |
    /// | POST   | `/batch`      | bulkCreate |
    /// | GET    | primary key   | findOne    |
    /// | PUT    | primary key   | update     |
    /// | DELETE | primary key   | destroy    |
    ///
    /// ```rust,ignore
    /// let app = Router::new().nest("/persons", pipeline.router());
    /// ```
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new()
            .route("/", get(find_all::<P>).post(create::<P>))
            .route("/batch", post(bulk_create::<P>))
            .route(
                self.key_pattern().path(),
                get(find_one::<P>).put(update::<P>).delete(destroy::<P>),
            )
            .with_state(self.clone())
    }
}
