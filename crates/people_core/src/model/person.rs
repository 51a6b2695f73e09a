//! Person domain model.
//!
//! # Responsibility
//! - Define the single document shape stored in the `people` collection.
//! - Validate declarative field rules before a draft becomes a record.
//!
//! # Invariants
//! - `id` is assigned once on insert and never reused for another person.
//! - Every `Person` has a non-blank `name` and an `age`.
//! - `favorite_foods` order is preserved exactly as written.
//! - `version` only grows; the store bumps it on every write.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned identifier of a person document.
pub type PersonId = Uuid;

/// Name of the document collection backing `Person`.
pub const PEOPLE_COLLECTION: &str = "people";

/// Validation errors for the declarative `Person` field rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonValidationError {
    /// `name` is absent or blank.
    MissingName,
    /// `age` is absent.
    MissingAge,
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "Path `name` is required."),
            Self::MissingAge => write!(f, "Path `age` is required."),
        }
    }
}

impl Error for PersonValidationError {}

/// Caller-supplied person data that has not been validated yet.
///
/// Every field is optional so that documents arriving from JSON can express
/// a missing required field; `Person::from_draft` enforces the rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonDraft {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub favorite_foods: Vec<String>,
}

impl PersonDraft {
    /// Creates a draft with all required fields present.
    pub fn new<I, S>(name: impl Into<String>, age: i64, favorite_foods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Some(name.into()),
            age: Some(age),
            favorite_foods: favorite_foods.into_iter().map(Into::into).collect(),
        }
    }

    /// Checks the declarative field rules without consuming the draft.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => {}
            _ => return Err(PersonValidationError::MissingName),
        }
        if self.age.is_none() {
            return Err(PersonValidationError::MissingAge);
        }
        Ok(())
    }
}

/// A persisted person document.
///
/// Serialized with the collection's wire field names (`_id`, `favoriteFoods`,
/// `__v`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: PersonId,
    pub name: String,
    pub age: i64,
    #[serde(default)]
    pub favorite_foods: Vec<String>,
    /// Version key used as optimistic concurrency token on save.
    #[serde(rename = "__v", default)]
    pub version: u32,
}

impl Person {
    /// Validates a draft and assigns a freshly generated id.
    pub fn from_draft(draft: &PersonDraft) -> Result<Self, PersonValidationError> {
        Self::from_draft_with_id(Uuid::new_v4(), draft)
    }

    /// Validates a draft under a caller-provided id.
    ///
    /// Used by tests and import paths where identity already exists.
    pub fn from_draft_with_id(
        id: PersonId,
        draft: &PersonDraft,
    ) -> Result<Self, PersonValidationError> {
        draft.validate()?;
        let (Some(name), Some(age)) = (draft.name.clone(), draft.age) else {
            return Err(PersonValidationError::MissingName);
        };
        Ok(Self {
            id,
            name,
            age,
            favorite_foods: draft.favorite_foods.clone(),
            version: 0,
        })
    }

    /// Re-checks required fields on an already constructed record.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.name.trim().is_empty() {
            return Err(PersonValidationError::MissingName);
        }
        Ok(())
    }

    /// Appends one item to the end of `favorite_foods`.
    pub fn add_favorite_food(&mut self, food: impl Into<String>) {
        self.favorite_foods.push(food.into());
    }

    /// Returns whether `food` is one of this person's favorites.
    pub fn likes(&self, food: &str) -> bool {
        self.favorite_foods.iter().any(|item| item == food)
    }
}

/// A person document after a field projection.
///
/// Excluded fields are `None` and omitted from serialized output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonProjection {
    #[serde(rename = "_id")]
    pub id: PersonId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub favorite_foods: Option<Vec<String>>,
    #[serde(rename = "__v", skip_serializing_if = "Option::is_none", default)]
    pub version: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::{Person, PersonDraft, PersonValidationError};

    #[test]
    fn blank_name_is_missing() {
        let draft = PersonDraft::new("   ", 3, Vec::<String>::new());
        assert_eq!(draft.validate(), Err(PersonValidationError::MissingName));
    }

    #[test]
    fn add_favorite_food_appends_in_order() {
        let mut person = Person::from_draft(&PersonDraft::new("Ann", 4, ["tea"])).unwrap();
        person.add_favorite_food("cake");
        assert_eq!(person.favorite_foods, vec!["tea", "cake"]);
        assert!(person.likes("cake"));
        assert!(!person.likes("Cake"));
    }
}
