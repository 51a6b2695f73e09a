//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for the people collection.
//! - Isolate SQLite/JSON document details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate declarative field rules before persistence.
//! - Repository APIs return semantic errors (`Cast`, `NotFound`,
//!   `VersionConflict`) in addition to DB transport errors.

pub mod person_repo;
pub mod query;
