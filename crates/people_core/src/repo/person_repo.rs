//! Person repository contracts and SQLite document-store implementation.
//!
//! # Responsibility
//! - Provide single-request CRUD and query APIs over the `people` collection.
//! - Keep SQL and JSON document details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate the declarative field rules before SQL mutations.
//! - Every write bumps the document version (`__v`).
//! - `save_person` only succeeds when the stored version still matches.
//! - Read paths reject invalid persisted documents instead of masking them.
//! - Single-record lookups report absence as `Ok(None)`, not an error.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::person::{
    Person, PersonDraft, PersonId, PersonProjection, PersonValidationError, PEOPLE_COLLECTION,
};
use crate::repo::query::{PersonField, PersonFilter, PersonQuery, ProjectionError, SortOrder};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PERSON_SELECT_SQL: &str = "SELECT id, version, body FROM people";
const RETURNING_SQL: &str = "RETURNING id, version, body";
const TOUCH_SQL: &str = "version = version + 1, updated_at = (strftime('%s', 'now') * 1000)";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for person persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// A declarative field rule failed.
    Validation(PersonValidationError),
    /// A raw identifier could not be cast to `PersonId`.
    Cast { value: String },
    /// The target document does not exist.
    NotFound(PersonId),
    /// The document changed since it was loaded.
    VersionConflict {
        id: PersonId,
        expected_version: u32,
    },
    /// A textual projection was malformed.
    Projection(ProjectionError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid document.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "Person validation failed: {err}"),
            Self::Cast { value } => {
                write!(f, "Cast to UUID failed for value \"{value}\" at path \"_id\"")
            }
            Self::NotFound(id) => write!(f, "person not found: {id}"),
            Self::VersionConflict {
                id,
                expected_version,
            } => write!(
                f,
                "no matching document found for id \"{id}\" version {expected_version}"
            ),
            Self::Projection(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column missing: {table}.{column}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted person data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Projection(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersonValidationError> for RepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ProjectionError> for RepoError {
    fn from(value: ProjectionError) -> Self {
        Self::Projection(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Casts a raw identifier into a `PersonId`.
///
/// Malformed input is a `RepoError::Cast`, distinct from "not found".
pub fn parse_person_id(raw: &str) -> RepoResult<PersonId> {
    Uuid::parse_str(raw.trim()).map_err(|_| RepoError::Cast {
        value: raw.to_string(),
    })
}

/// Field assignments applied by `find_one_and_update`. `None` leaves a field
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonUpdate {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub favorite_foods: Option<Vec<String>>,
}

impl PersonUpdate {
    pub fn set_age(age: i64) -> Self {
        Self {
            age: Some(age),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.favorite_foods.is_none()
    }
}

/// Outcome of a bulk delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub deleted_count: usize,
}

/// Repository interface for the people collection.
pub trait PersonRepository {
    /// Validates and inserts one document, returning it with its new id.
    fn insert_person(&self, draft: &PersonDraft) -> RepoResult<Person>;
    /// Inserts every draft or none of them.
    fn insert_many(&self, drafts: &[PersonDraft]) -> RepoResult<Vec<Person>>;
    /// Runs a query and returns full documents; the projection is ignored.
    fn find_people(&self, query: &PersonQuery) -> RepoResult<Vec<Person>>;
    /// Runs a query and applies its projection to each result.
    fn find_projected(&self, query: &PersonQuery) -> RepoResult<Vec<PersonProjection>>;
    /// Returns the first match in insertion order.
    fn find_one(&self, filter: &PersonFilter) -> RepoResult<Option<Person>>;
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// Writes a loaded document back, guarded by its version.
    fn save_person(&self, person: &Person) -> RepoResult<Person>;
    /// Atomically applies `update` to the first match and returns the
    /// post-update document.
    fn find_one_and_update(
        &self,
        filter: &PersonFilter,
        update: &PersonUpdate,
    ) -> RepoResult<Option<Person>>;
    /// Deletes one document and returns its pre-deletion snapshot.
    fn delete_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    fn delete_many(&self, filter: &PersonFilter) -> RepoResult<DeleteSummary>;
}

/// SQLite-backed document store for the people collection.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_people_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn insert_validated(&self, person: &Person) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO people (id, version, body) VALUES (?1, ?2, ?3);",
            params![
                person.id.to_string(),
                person.version,
                encode_body(person)?,
            ],
        )?;
        Ok(())
    }

    fn version_of(&self, id: PersonId) -> RepoResult<Option<u32>> {
        let version = self
            .conn
            .query_row(
                "SELECT version FROM people WHERE id = ?1;",
                [id.to_string()],
                |row| row.get::<_, u32>(0),
            )
            .optional()?;
        Ok(version)
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn insert_person(&self, draft: &PersonDraft) -> RepoResult<Person> {
        let person = Person::from_draft(draft)?;
        self.insert_validated(&person)?;
        Ok(person)
    }

    fn insert_many(&self, drafts: &[PersonDraft]) -> RepoResult<Vec<Person>> {
        let people = drafts
            .iter()
            .map(Person::from_draft)
            .collect::<Result<Vec<_>, _>>()?;

        let tx = self.conn.unchecked_transaction()?;
        for person in &people {
            self.insert_validated(person)?;
        }
        tx.commit()?;

        Ok(people)
    }

    fn find_people(&self, query: &PersonQuery) -> RepoResult<Vec<Person>> {
        let mut sql = PERSON_SELECT_SQL.to_string();
        let mut bind_values: Vec<Value> = Vec::new();

        push_filter(query.get_filter(), &mut sql, &mut bind_values);
        push_order(query.get_sort(), &mut sql);

        match (query.get_limit(), query.get_skip()) {
            (Some(limit), skip) => {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(i64::from(limit)));
                if let Some(skip) = skip.filter(|skip| *skip > 0) {
                    sql.push_str(" OFFSET ?");
                    bind_values.push(Value::Integer(i64::from(skip)));
                }
            }
            (None, Some(skip)) if skip > 0 => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                bind_values.push(Value::Integer(i64::from(skip)));
            }
            (None, _) => {}
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut people = Vec::new();

        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?);
        }

        Ok(people)
    }

    fn find_projected(&self, query: &PersonQuery) -> RepoResult<Vec<PersonProjection>> {
        let projection = query.get_projection();
        Ok(self
            .find_people(query)?
            .into_iter()
            .map(|person| projection.apply(person))
            .collect())
    }

    fn find_one(&self, filter: &PersonFilter) -> RepoResult<Option<Person>> {
        let query = PersonQuery::new().filter(filter.clone()).limit(1);
        Ok(self.find_people(&query)?.into_iter().next())
    }

    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }

        Ok(None)
    }

    fn save_person(&self, person: &Person) -> RepoResult<Person> {
        person.validate()?;

        let mut stmt = self.conn.prepare(&format!(
            "UPDATE people
             SET body = ?1, {TOUCH_SQL}
             WHERE id = ?2 AND version = ?3
             {RETURNING_SQL};"
        ))?;
        let mut rows = stmt.query(params![
            encode_body(person)?,
            person.id.to_string(),
            person.version,
        ])?;
        if let Some(row) = rows.next()? {
            return parse_person_row(row);
        }
        drop(rows);

        match self.version_of(person.id)? {
            None => Err(RepoError::NotFound(person.id)),
            Some(_) => Err(RepoError::VersionConflict {
                id: person.id,
                expected_version: person.version,
            }),
        }
    }

    fn find_one_and_update(
        &self,
        filter: &PersonFilter,
        update: &PersonUpdate,
    ) -> RepoResult<Option<Person>> {
        if update.is_empty() {
            return self.find_one(filter);
        }
        if update
            .name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(PersonValidationError::MissingName.into());
        }

        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(name) = &update.name {
            assignments.push("'$.name', ?");
            bind_values.push(Value::Text(name.clone()));
        }
        if let Some(age) = update.age {
            assignments.push("'$.age', ?");
            bind_values.push(Value::Integer(age));
        }
        if let Some(foods) = &update.favorite_foods {
            assignments.push("'$.favoriteFoods', json(?)");
            let encoded = serde_json::to_string(foods)
                .map_err(|err| RepoError::InvalidData(err.to_string()))?;
            bind_values.push(Value::Text(encoded));
        }

        let mut target = "SELECT seq FROM people".to_string();
        push_filter(filter, &mut target, &mut bind_values);
        target.push_str(" ORDER BY seq ASC LIMIT 1");

        let sql = format!(
            "UPDATE people
             SET body = json_set(body, {}), {TOUCH_SQL}
             WHERE seq = ({target})
             {RETURNING_SQL};",
            assignments.join(", ")
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }

        Ok(None)
    }

    fn delete_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("DELETE FROM people WHERE id = ?1 {RETURNING_SQL};"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }

        Ok(None)
    }

    fn delete_many(&self, filter: &PersonFilter) -> RepoResult<DeleteSummary> {
        let mut sql = "DELETE FROM people".to_string();
        let mut bind_values: Vec<Value> = Vec::new();
        push_filter(filter, &mut sql, &mut bind_values);

        let deleted_count = self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(DeleteSummary { deleted_count })
    }
}

/// Stored JSON body. Identity and version live in their own columns.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonBody {
    name: String,
    age: i64,
    #[serde(default)]
    favorite_foods: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersonBodyRef<'a> {
    name: &'a str,
    age: i64,
    favorite_foods: &'a [String],
}

fn encode_body(person: &Person) -> RepoResult<String> {
    let body = PersonBodyRef {
        name: &person.name,
        age: person.age,
        favorite_foods: &person.favorite_foods,
    };
    serde_json::to_string(&body).map_err(|err| RepoError::InvalidData(err.to_string()))
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in people.id"))
    })?;

    let body_text: String = row.get("body")?;
    let body: PersonBody = serde_json::from_str(&body_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid document body for `{id}`: {err}"))
    })?;

    let person = Person {
        id,
        name: body.name,
        age: body.age,
        favorite_foods: body.favorite_foods,
        version: row.get("version")?,
    };
    person.validate()?;
    Ok(person)
}

fn push_filter(filter: &PersonFilter, sql: &mut String, bind_values: &mut Vec<Value>) {
    sql.push_str(" WHERE 1 = 1");

    if let Some(id) = filter.id {
        sql.push_str(" AND id = ?");
        bind_values.push(Value::Text(id.to_string()));
    }
    if let Some(name) = &filter.name {
        sql.push_str(" AND json_extract(body, '$.name') = ?");
        bind_values.push(Value::Text(name.clone()));
    }
    if let Some(age) = filter.age {
        sql.push_str(" AND json_extract(body, '$.age') = ?");
        bind_values.push(Value::Integer(age));
    }
    if let Some(food) = &filter.favorite_food {
        sql.push_str(
            " AND EXISTS (
                SELECT 1 FROM json_each(people.body, '$.favoriteFoods') AS food
                WHERE food.value = ?
            )",
        );
        bind_values.push(Value::Text(food.clone()));
    }
}

fn push_order(sort: &[(PersonField, SortOrder)], sql: &mut String) {
    sql.push_str(" ORDER BY ");
    for (field, order) in sort {
        let direction = match order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        match field {
            PersonField::Version => sql.push_str("version"),
            body_field => {
                sql.push_str(&format!("json_extract(body, '$.{}')", body_field.wire_name()))
            }
        }
        sql.push(' ');
        sql.push_str(direction);
        sql.push_str(", ");
    }
    sql.push_str("seq ASC");
}

fn ensure_people_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, PEOPLE_COLLECTION)? {
        return Err(RepoError::MissingRequiredTable(PEOPLE_COLLECTION));
    }

    for column in ["seq", "id", "version", "body", "created_at", "updated_at"] {
        if !table_has_column(conn, PEOPLE_COLLECTION, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: PEOPLE_COLLECTION,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
