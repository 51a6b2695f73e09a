//! Domain model for the people collection.
//!
//! # Responsibility
//! - Define canonical data structures used by repository and service code.
//! - Keep wire field naming (`_id`, `favoriteFoods`, `__v`) in one place.
//!
//! # Invariants
//! - Every persisted person is identified by a stable `PersonId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod person;
