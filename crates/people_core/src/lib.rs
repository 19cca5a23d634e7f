//! Core logic for the people document store.
//! This crate owns the `people` collection schema and every operation on it.

pub mod config;
pub mod db;
pub mod demo;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError, StoreUri};
pub use demo::{run_demo, DemoError, DemoReport};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::person::{NewPerson, Person, PersonId, PersonSummary, PersonValidationError};
pub use repo::person_repo::{
    DeleteSummary, InsertPolicy, Operation, PersonRepository, RepoError, RepoResult,
    SqlitePersonRepository, WriteCause, CHAINED_QUERY_LIMIT,
};
pub use service::observer::{LogObserver, NoopObserver, RepoObserver};
pub use service::person_service::{PersonService, APPENDED_FOOD};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
