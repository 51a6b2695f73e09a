//! Person use-case service.
//!
//! # Responsibility
//! - Expose the people collection operations as stable entry points.
//! - Cast raw identifiers and shape arguments before delegating.
//! - Emit one `person_op` log event per operation.
//!
//! # Invariants
//! - Each operation issues one repository request, except
//!   `find_edit_then_save` which loads and then saves.
//! - Repository errors are returned unchanged; nothing is retried.
//! - The service holds no state besides its repository.

use crate::model::person::{Person, PersonDraft, PersonProjection};
use crate::repo::person_repo::{
    parse_person_id, DeleteSummary, PersonRepository, PersonUpdate, RepoError, RepoResult,
};
use crate::repo::query::{PersonField, PersonFilter, PersonQuery, Projection, SortOrder};
use log::{debug, warn};
use std::time::Instant;

/// Food appended by the load-modify-save walkthrough.
pub const DEFAULT_FOOD_TO_ADD: &str = "hamburger";
/// Age assigned by the atomic update walkthrough.
pub const DEFAULT_AGE_TO_SET: i64 = 20;
/// Maximum rows returned by `query_chain`.
pub const QUERY_CHAIN_LIMIT: u32 = 2;
/// Field selection applied by `query_chain`.
pub const QUERY_CHAIN_SELECT: &str = "-age";

/// Use-case service wrapper for the people collection.
pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the underlying repository (the collection handle).
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates and stores one person.
    ///
    /// # Contract
    /// - Returns the stored record with a newly assigned id and `__v = 0`.
    /// - Blank `name` is a validation error.
    pub fn create_and_save_person<I, S>(
        &self,
        name: &str,
        age: i64,
        favorite_foods: I,
    ) -> RepoResult<Person>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let started_at = Instant::now();
        let draft = PersonDraft::new(name, age, favorite_foods);
        let result = self.repo.insert_person(&draft);
        log_outcome("create_and_save_person", started_at, &result);
        result
    }

    /// Stores every draft, or none of them when one fails validation.
    pub fn create_many_people(&self, people: &[PersonDraft]) -> RepoResult<Vec<Person>> {
        let started_at = Instant::now();
        let result = self.repo.insert_many(people);
        log_outcome("create_many_people", started_at, &result);
        result
    }

    /// Returns every person whose name matches exactly. Empty when none.
    pub fn find_people_by_name(&self, name: &str) -> RepoResult<Vec<Person>> {
        let started_at = Instant::now();
        let query = PersonQuery::new().filter(PersonFilter::by_name(name));
        let result = self.repo.find_people(&query);
        log_outcome("find_people_by_name", started_at, &result);
        result
    }

    /// Returns the first person (insertion order) listing `food`.
    pub fn find_one_by_food(&self, food: &str) -> RepoResult<Option<Person>> {
        let started_at = Instant::now();
        let result = self.repo.find_one(&PersonFilter::by_favorite_food(food));
        log_outcome("find_one_by_food", started_at, &result);
        result
    }

    /// Looks a person up by raw id.
    ///
    /// # Contract
    /// - Malformed id returns `RepoError::Cast`.
    /// - Well-formed but unknown id returns `Ok(None)`.
    pub fn find_person_by_id(&self, person_id: &str) -> RepoResult<Option<Person>> {
        let started_at = Instant::now();
        let result = parse_person_id(person_id).and_then(|id| self.repo.get_person(id));
        log_outcome("find_person_by_id", started_at, &result);
        result
    }

    /// Loads a person, appends `food_to_add` to their favorites and saves.
    ///
    /// # Contract
    /// - Two round-trips: load, then a version-guarded save.
    /// - Unknown id returns `RepoError::NotFound`.
    /// - A write between load and save returns `RepoError::VersionConflict`
    ///   and leaves the stored document untouched.
    pub fn find_edit_then_save(&self, person_id: &str, food_to_add: &str) -> RepoResult<Person> {
        let started_at = Instant::now();
        let result = parse_person_id(person_id).and_then(|id| {
            let mut person = self.repo.get_person(id)?.ok_or(RepoError::NotFound(id))?;
            person.add_favorite_food(food_to_add);
            self.repo.save_person(&person)
        });
        if let Err(RepoError::VersionConflict { id, .. }) = &result {
            warn!("event=person_op module=service op=find_edit_then_save status=conflict id={id}");
        }
        log_outcome("find_edit_then_save", started_at, &result);
        result
    }

    /// Atomically sets `age` on the first person named `person_name`.
    ///
    /// Returns the post-update record, or `Ok(None)` when nobody matches.
    pub fn find_and_update(&self, person_name: &str, age: i64) -> RepoResult<Option<Person>> {
        let started_at = Instant::now();
        let result = self.repo.find_one_and_update(
            &PersonFilter::by_name(person_name),
            &PersonUpdate::set_age(age),
        );
        log_outcome("find_and_update", started_at, &result);
        result
    }

    /// Deletes a person by raw id and returns the deleted record.
    ///
    /// `Ok(None)` when the id is well-formed but unknown.
    pub fn remove_by_id(&self, person_id: &str) -> RepoResult<Option<Person>> {
        let started_at = Instant::now();
        let result = parse_person_id(person_id).and_then(|id| self.repo.delete_person(id));
        log_outcome("remove_by_id", started_at, &result);
        result
    }

    /// Deletes every person named `name`.
    pub fn remove_many_people(&self, name: &str) -> RepoResult<DeleteSummary> {
        let started_at = Instant::now();
        let result = self.repo.delete_many(&PersonFilter::by_name(name));
        log_outcome("remove_many_people", started_at, &result);
        result
    }

    /// People who like `food`, sorted by name, at most two, without `age`.
    pub fn query_chain(&self, food: &str) -> RepoResult<Vec<PersonProjection>> {
        let started_at = Instant::now();
        let result = QUERY_CHAIN_SELECT
            .parse::<Projection>()
            .map_err(RepoError::from)
            .and_then(|projection| {
                let query = PersonQuery::new()
                    .filter(PersonFilter::by_favorite_food(food))
                    .sort(PersonField::Name, SortOrder::Ascending)
                    .limit(QUERY_CHAIN_LIMIT)
                    .select(projection);
                self.repo.find_projected(&query)
            });
        log_outcome("query_chain", started_at, &result);
        result
    }
}

fn log_outcome<T>(op: &str, started_at: Instant, result: &RepoResult<T>) {
    match result {
        Ok(_) => debug!(
            "event=person_op module=service op={} status=ok duration_ms={}",
            op,
            started_at.elapsed().as_millis()
        ),
        Err(err) => debug!(
            "event=person_op module=service op={} status=error duration_ms={} error={}",
            op,
            started_at.elapsed().as_millis(),
            err
        ),
    }
}
