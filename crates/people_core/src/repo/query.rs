//! Chainable query description for the people collection.
//!
//! # Responsibility
//! - Describe filter, sort, skip, limit and projection clauses as one value.
//! - Parse textual field selections (`"-age"`, `"name favoriteFoods"`).
//!
//! # Invariants
//! - A query is inert data; repositories decide how to execute it.
//! - A projection never mixes inclusion and exclusion.
//! - `_id` is always part of a projected result.

use crate::model::person::{Person, PersonId, PersonProjection};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Document fields addressable by filters, sorts and projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonField {
    Name,
    Age,
    FavoriteFoods,
    Version,
}

impl PersonField {
    /// Wire name of the field inside a stored document.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::FavoriteFoods => "favoriteFoods",
            Self::Version => "__v",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "age" => Some(Self::Age),
            "favoriteFoods" => Some(Self::FavoriteFoods),
            "__v" => Some(Self::Version),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Conjunction of equality clauses. Empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonFilter {
    pub id: Option<PersonId>,
    pub name: Option<String>,
    pub age: Option<i64>,
    /// Array membership: matches when `favoriteFoods` contains this value.
    pub favorite_food: Option<String>,
}

impl PersonFilter {
    pub fn by_id(id: PersonId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_favorite_food(food: impl Into<String>) -> Self {
        Self {
            favorite_food: Some(food.into()),
            ..Self::default()
        }
    }

    /// Evaluates the filter against an in-memory record.
    pub fn matches(&self, person: &Person) -> bool {
        self.id.map_or(true, |id| person.id == id)
            && self.name.as_deref().map_or(true, |name| person.name == name)
            && self.age.map_or(true, |age| person.age == age)
            && self
                .favorite_food
                .as_deref()
                .map_or(true, |food| person.likes(food))
    }
}

/// Field selection applied to query results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    All,
    Include(Vec<PersonField>),
    Exclude(Vec<PersonField>),
}

impl Projection {
    pub fn include(fields: impl IntoIterator<Item = PersonField>) -> Self {
        Self::Include(fields.into_iter().collect())
    }

    pub fn exclude(fields: impl IntoIterator<Item = PersonField>) -> Self {
        Self::Exclude(fields.into_iter().collect())
    }

    /// Returns whether `field` survives this projection.
    pub fn keeps(&self, field: PersonField) -> bool {
        match self {
            Self::All => true,
            Self::Include(fields) => fields.contains(&field),
            Self::Exclude(fields) => !fields.contains(&field),
        }
    }

    /// Applies the projection to a full record.
    pub fn apply(&self, person: Person) -> PersonProjection {
        PersonProjection {
            id: person.id,
            name: self.keeps(PersonField::Name).then_some(person.name),
            age: self.keeps(PersonField::Age).then_some(person.age),
            favorite_foods: self
                .keeps(PersonField::FavoriteFoods)
                .then_some(person.favorite_foods),
            version: self.keeps(PersonField::Version).then_some(person.version),
        }
    }
}

/// Error raised by a malformed textual projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionError(pub String);

impl Display for ProjectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid projection: {}", self.0)
    }
}

impl std::error::Error for ProjectionError {}

impl FromStr for Projection {
    type Err = ProjectionError;

    /// Parses space-separated field names; a leading `-` excludes a field.
    /// `_id` is accepted and ignored because it is always returned.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut included = Vec::new();
        let mut excluded = Vec::new();

        for token in value.split_whitespace() {
            let (negated, name) = match token.strip_prefix('-') {
                Some(name) => (true, name),
                None => (false, token.strip_prefix('+').unwrap_or(token)),
            };
            if name == "_id" {
                continue;
            }
            let field = PersonField::parse(name)
                .ok_or_else(|| ProjectionError(format!("unknown field `{name}`")))?;
            if negated {
                excluded.push(field);
            } else {
                included.push(field);
            }
        }

        match (included.is_empty(), excluded.is_empty()) {
            (true, true) => Ok(Self::All),
            (false, true) => Ok(Self::Include(included)),
            (true, false) => Ok(Self::Exclude(excluded)),
            (false, false) => Err(ProjectionError(format!(
                "cannot mix inclusion and exclusion in `{}`",
                value.trim()
            ))),
        }
    }
}

/// Fluent query over the people collection.
///
/// Without an explicit sort, results come back in insertion order. Explicit
/// sorts fall back to insertion order for ties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonQuery {
    filter: PersonFilter,
    sort: Vec<(PersonField, SortOrder)>,
    skip: Option<u32>,
    limit: Option<u32>,
    projection: Projection,
}

impl PersonQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: PersonFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Appends a sort key; earlier keys take precedence.
    pub fn sort(mut self, field: PersonField, order: SortOrder) -> Self {
        self.sort.push((field, order));
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn select(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn get_filter(&self) -> &PersonFilter {
        &self.filter
    }

    pub fn get_sort(&self) -> &[(PersonField, SortOrder)] {
        &self.sort
    }

    pub fn get_skip(&self) -> Option<u32> {
        self.skip
    }

    pub fn get_limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn get_projection(&self) -> &Projection {
        &self.projection
    }
}
