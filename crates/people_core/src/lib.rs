//! Data-access layer for the `people` document collection.
//! This crate owns the `Person` schema and every operation on it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use db::{connect, ConnectionTarget, DbError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::person::{
    Person, PersonDraft, PersonId, PersonProjection, PersonValidationError, PEOPLE_COLLECTION,
};
pub use repo::person_repo::{
    parse_person_id, DeleteSummary, PersonRepository, PersonUpdate, RepoError, RepoResult,
    SqlitePersonRepository,
};
pub use repo::query::{
    PersonField, PersonFilter, PersonQuery, Projection, ProjectionError, SortOrder,
};
pub use service::person_service::{
    PersonService, DEFAULT_AGE_TO_SET, DEFAULT_FOOD_TO_ADD, QUERY_CHAIN_LIMIT,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
