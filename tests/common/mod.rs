#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use crudpipe::{
    CrudModel, PipelineConfig, ResourcePipeline, SeaOrmPort,
    validation::{ValidationErrors, validators},
};
use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

pub mod person {
    use sea_orm::entity::prelude::*;
    use sea_orm::{ActiveValue, ConnectionTrait};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "persons")]
    pub struct Model {
        #[sea_orm(primary_key)]
        #[serde(skip_deserializing)]
        pub id: i32,
        pub name: String,
        pub last_name: String,
        #[sea_orm(unique)]
        pub identity_doc: String,
        pub birth_date: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    #[async_trait::async_trait]
    impl ActiveModelBehavior for ActiveModel {
        async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
        where
            C: ConnectionTrait,
        {
            if let ActiveValue::Set(name) = &self.name
                && name == "Forbidden"
            {
                return Err(DbErr::Custom("reserved name".to_string()));
            }
            Ok(self)
        }
    }
}

/// Marker tying the person entity to its resource.
pub struct Persons;

impl CrudModel for Persons {
    type Entity = person::Entity;
    type Model = person::Model;
    type Column = person::Column;
    type ActiveModel = person::ActiveModel;

    const RESOURCE_NAME_SINGULAR: &'static str = "person";
    const RESOURCE_NAME_PLURAL: &'static str = "persons";

    fn required_fields() -> &'static [&'static str] {
        &["name", "last_name", "identity_doc"]
    }

    fn validate(payload: &Value) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::required(payload, Self::required_fields());
        errors.extend(identity_doc_errors(payload));
        errors.result()
    }

    fn validate_patch(patch: &Value) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::nulled(patch, Self::required_fields());
        errors.extend(identity_doc_errors(patch));
        errors.result()
    }
}

fn identity_doc_errors(payload: &Value) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if let Some(doc) = payload.get("identity_doc").and_then(Value::as_str) {
        errors.check(validators::validate_length("identity_doc", doc, Some(2), Some(32)));
    }
    errors
}

pub type PersonPipeline = ResourcePipeline<SeaOrmPort<Persons>>;

/// Route library logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

pub fn person_pipeline(db: DatabaseConnection, config: PipelineConfig) -> PersonPipeline {
    ResourcePipeline::new(Arc::new(SeaOrmPort::<Persons>::new(db)), config)
        .expect("valid pipeline config")
}

pub fn setup_test_app(pipeline: &PersonPipeline) -> Router {
    Router::new().nest("/api/v1/persons", pipeline.router())
}

pub fn person_json(index: usize) -> Value {
    json!({
        "name": format!("Person {index}"),
        "last_name": "Villarreal",
        "identity_doc": format!("doc-{index:04}"),
        "birth_date": "1989-10-11"
    })
}

/// Send a request and decode the JSON body (`Value::Null` when empty).
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<&Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send_request(app, request).await
}

pub async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Create `count` persons through the API.
pub async fn seed(app: &Router, count: usize) {
    for index in 0..count {
        let (status, _) = send(app, Method::POST, "/api/v1/persons", Some(&person_json(index))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreatePersonTable)]
    }
}

pub struct CreatePersonTable;

#[async_trait::async_trait]
impl MigrationName for CreatePersonTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_person_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreatePersonTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(PersonEntity)
            .if_not_exists()
            .col(
                ColumnDef::new(PersonColumn::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(PersonColumn::Name).string().not_null())
            .col(ColumnDef::new(PersonColumn::LastName).string().not_null())
            .col(
                ColumnDef::new(PersonColumn::IdentityDoc)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(PersonColumn::BirthDate).string().null())
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PersonEntity).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum PersonColumn {
    Id,
    Name,
    LastName,
    IdentityDoc,
    BirthDate,
}

impl Iden for PersonColumn {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(
            s,
            "{}",
            match self {
                Self::Id => "id",
                Self::Name => "name",
                Self::LastName => "last_name",
                Self::IdentityDoc => "identity_doc",
                Self::BirthDate => "birth_date",
            }
        )
        .unwrap();
    }
}

#[derive(Debug)]
pub struct PersonEntity;

impl Iden for PersonEntity {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "persons").unwrap();
    }
}
