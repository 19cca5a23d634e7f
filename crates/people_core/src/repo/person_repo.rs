//! Person repository contract and SQLite document-store implementation.
//!
//! # Responsibility
//! - Provide the fixed-shape CRUD and query operations over `people`.
//! - Translate store faults into `RepoError` values tagged with the
//!   operation that raised them.
//!
//! # Invariants
//! - Documents are returned in store (insertion) order unless a query sorts.
//! - `save` only succeeds when the stored `version` matches the caller's copy.
//! - Single-document "find and update" runs as one SQL statement.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::person::{
    NewPerson, Person, PersonBody, PersonId, PersonSummary, PersonValidationError,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PEOPLE_TABLE: &str = "people";
const NAME_PATH: &str = "json_extract(body, '$.name')";
const TOUCH_UPDATED_AT: &str = "updated_at = (strftime('%s', 'now') * 1000)";

/// Result size of [`PersonRepository::chained_query`].
pub const CHAINED_QUERY_LIMIT: u32 = 2;

pub type RepoResult<T> = Result<T, RepoError>;

/// Named repository operations, carried by errors and observer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateOne,
    CreateMany,
    FindByName,
    FindOneByFood,
    FindById,
    ReadModifyWrite,
    Save,
    FindAndUpdate,
    DeleteById,
    DeleteMany,
    ChainedQuery,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateOne => "create_one",
            Self::CreateMany => "create_many",
            Self::FindByName => "find_by_name",
            Self::FindOneByFood => "find_one_by_food",
            Self::FindById => "find_by_id",
            Self::ReadModifyWrite => "read_modify_write",
            Self::Save => "save",
            Self::FindAndUpdate => "find_and_update",
            Self::DeleteById => "delete_by_id",
            Self::DeleteMany => "delete_many",
            Self::ChainedQuery => "chained_query",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a write was rejected.
#[derive(Debug)]
pub enum WriteCause {
    Validation(PersonValidationError),
    /// The stored document changed since the caller loaded it.
    Conflict {
        id: PersonId,
        expected_version: u64,
    },
    /// A multi-document insert stopped at `failed_index`. `inserted` lists
    /// the documents that remain persisted (empty after an atomic rollback).
    Batch {
        failed_index: usize,
        inserted: Vec<PersonId>,
        cause: Box<WriteCause>,
    },
    Encode(String),
    Store(rusqlite::Error),
}

impl Display for WriteCause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict {
                id,
                expected_version,
            } => write!(
                f,
                "document {id} changed since version {expected_version} was loaded"
            ),
            Self::Batch {
                failed_index,
                inserted,
                cause,
            } => write!(
                f,
                "insert of document #{failed_index} failed after {} persisted: {cause}",
                inserted.len()
            ),
            Self::Encode(message) => write!(f, "cannot encode document: {message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WriteCause {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Batch { cause, .. } => Some(cause.as_ref()),
            Self::Store(err) => Some(err),
            Self::Conflict { .. } | Self::Encode(_) => None,
        }
    }
}

/// Repository error taxonomy.
#[derive(Debug)]
pub enum RepoError {
    /// The store rejected a create/update/delete.
    Write {
        operation: Operation,
        cause: WriteCause,
    },
    /// The store rejected a read.
    Query {
        operation: Operation,
        source: rusqlite::Error,
    },
    /// An id-keyed operation received text that is not a store id.
    InvalidId(String),
    /// A persisted document does not match the collection schema.
    InvalidData(String),
    Db(DbError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl RepoError {
    fn write(operation: Operation, cause: WriteCause) -> Self {
        Self::Write { operation, cause }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write { operation, cause } => write!(f, "{operation} write failed: {cause}"),
            Self::Query { operation, source } => write!(f, "{operation} query failed: {source}"),
            Self::InvalidId(value) => write!(f, "invalid person id `{value}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted person data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store schema is at version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write { cause, .. } => Some(cause),
            Self::Query { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::InvalidId(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// How `create_many` behaves when one document fails to insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertPolicy {
    /// Insert in order and stop at the first failure; earlier documents stay.
    #[default]
    Ordered,
    /// All documents or none.
    Atomic,
}

impl InsertPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ordered" => Some(Self::Ordered),
            "atomic" => Some(Self::Atomic),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Atomic => "atomic",
        }
    }
}

/// Outcome of a multi-document delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteSummary {
    pub deleted_count: usize,
}

/// Document operations over the `people` collection.
pub trait PersonRepository {
    fn create_one(&self, person: &NewPerson) -> RepoResult<Person>;
    fn create_many(&self, people: &[NewPerson], policy: InsertPolicy) -> RepoResult<Vec<Person>>;
    fn find_by_name(&self, name: &str) -> RepoResult<Vec<Person>>;
    /// First document in store order whose `favoriteFoods` contains `food`.
    fn find_one_by_food(&self, food: &str) -> RepoResult<Option<Person>>;
    fn find_by_id(&self, id: &str) -> RepoResult<Option<Person>>;
    /// Loads a document, appends `food` and persists it with a version check.
    fn append_food(&self, id: &str, food: &str) -> RepoResult<Option<Person>>;
    /// Persists a modified document; `None` when it no longer exists.
    fn save(&self, person: &Person) -> RepoResult<Option<Person>>;
    /// Sets `age` on the first document named `name` in a single request.
    fn find_and_update_age(&self, name: &str, age: i64) -> RepoResult<Option<Person>>;
    fn delete_by_id(&self, id: &str) -> RepoResult<Option<Person>>;
    fn delete_many_by_name(&self, name: &str) -> RepoResult<DeleteSummary>;
    /// Documents containing `food`, sorted by name, limited to
    /// [`CHAINED_QUERY_LIMIT`], without `age`.
    fn chained_query(&self, food: &str) -> RepoResult<Vec<PersonSummary>>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` when the `people` table is absent.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version > expected_version {
            return Err(RepoError::Db(DbError::UnsupportedSchemaVersion {
                db_version: actual_version,
                latest_supported: expected_version,
            }));
        }
        if actual_version < expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
                );",
                [PEOPLE_TABLE],
                |row| row.get(0),
            )
            .map_err(DbError::from)?;
        if !table_exists {
            return Err(RepoError::MissingRequiredTable(PEOPLE_TABLE));
        }

        Ok(Self { conn })
    }

    fn insert(&self, person: &NewPerson) -> Result<Person, WriteCause> {
        person.validate().map_err(WriteCause::Validation)?;

        let id = PersonId::generate();
        let body = person.to_body();
        let encoded =
            serde_json::to_string(&body).map_err(|err| WriteCause::Encode(err.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO people (id, body) VALUES (?1, ?2);",
                params![id.to_string(), encoded],
            )
            .map_err(WriteCause::Store)?;

        Ok(Person::from_body(id, 0, body))
    }

    fn insert_ordered(&self, people: &[NewPerson]) -> RepoResult<Vec<Person>> {
        let mut persisted = Vec::with_capacity(people.len());
        for (index, person) in people.iter().enumerate() {
            match self.insert(person) {
                Ok(stored) => persisted.push(stored),
                Err(cause) => {
                    return Err(RepoError::write(
                        Operation::CreateMany,
                        WriteCause::Batch {
                            failed_index: index,
                            inserted: persisted.iter().map(|stored| stored.id()).collect(),
                            cause: Box::new(cause),
                        },
                    ));
                }
            }
        }
        Ok(persisted)
    }

    fn insert_atomic(&self, people: &[NewPerson]) -> RepoResult<Vec<Person>> {
        let store_err = |err: rusqlite::Error| RepoError::write(Operation::CreateMany, WriteCause::Store(err));

        let tx = self.conn.unchecked_transaction().map_err(store_err)?;
        let mut persisted = Vec::with_capacity(people.len());
        for (index, person) in people.iter().enumerate() {
            match self.insert(person) {
                Ok(stored) => persisted.push(stored),
                // Dropping `tx` rolls back every insert from this call.
                Err(cause) => {
                    return Err(RepoError::write(
                        Operation::CreateMany,
                        WriteCause::Batch {
                            failed_index: index,
                            inserted: Vec::new(),
                            cause: Box::new(cause),
                        },
                    ));
                }
            }
        }
        tx.commit().map_err(store_err)?;
        Ok(persisted)
    }

    fn select(&self, query: &PersonQuery<'_>) -> Result<Vec<Person>, Fault> {
        let body_column = if query.exclude_age {
            "json_remove(body, '$.age')"
        } else {
            "body"
        };
        let mut sql = format!("SELECT id, version, {body_column} AS body FROM people WHERE ");
        let mut bind_values: Vec<Value> = Vec::new();

        match query.filter {
            PersonFilter::Id(id) => {
                sql.push_str("id = ?");
                bind_values.push(Value::Text(id.to_string()));
            }
            PersonFilter::Name(name) => {
                sql.push_str(NAME_PATH);
                sql.push_str(" = ?");
                bind_values.push(Value::Text(name.to_string()));
            }
            PersonFilter::Food(food) => {
                sql.push_str(
                    "EXISTS (
                        SELECT 1
                        FROM json_each(people.body, '$.favoriteFoods') AS food
                        WHERE food.value = ?
                    )",
                );
                bind_values.push(Value::Text(food.to_string()));
            }
        }

        match query.order {
            SortOrder::Store => sql.push_str(" ORDER BY seq ASC"),
            SortOrder::NameAscending => {
                sql.push_str(" ORDER BY ");
                sql.push_str(NAME_PATH);
                sql.push_str(" ASC, seq ASC");
            }
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?);
        }
        Ok(people)
    }

    fn select_first(&self, query: PersonQuery<'_>) -> Result<Option<Person>, Fault> {
        let query = PersonQuery {
            limit: Some(1),
            ..query
        };
        Ok(self.select(&query)?.into_iter().next())
    }

    /// Runs a DML statement with a `RETURNING id, version, body` clause.
    fn returning(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Person>, Fault> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?);
        }
        Ok(people)
    }

    fn persist(&self, operation: Operation, person: &Person) -> RepoResult<Option<Person>> {
        person
            .validate()
            .map_err(|err| RepoError::write(operation, WriteCause::Validation(err)))?;
        let encoded = serde_json::to_string(&person.to_body())
            .map_err(|err| RepoError::write(operation, WriteCause::Encode(err.to_string())))?;
        let expected_version = version_to_db(person.version)
            .map_err(|fault| fault.into_write(operation))?;

        let updated = self
            .returning(
                &format!(
                    "UPDATE people
                     SET body = ?1, version = version + 1, {TOUCH_UPDATED_AT}
                     WHERE id = ?2 AND version = ?3
                     RETURNING id, version, body;"
                ),
                params![encoded, person.id().to_string(), expected_version],
            )
            .map_err(|fault| fault.into_write(operation))?;
        if let Some(stored) = updated.into_iter().next() {
            return Ok(Some(stored));
        }

        let still_exists = self
            .conn
            .query_row(
                "SELECT 1 FROM people WHERE id = ?1;",
                [person.id().to_string()],
                |_| Ok(()),
            )
            .optional()
            .map_err(|err| RepoError::write(operation, WriteCause::Store(err)))?
            .is_some();
        if still_exists {
            return Err(RepoError::write(
                operation,
                WriteCause::Conflict {
                    id: person.id(),
                    expected_version: person.version,
                },
            ));
        }
        Ok(None)
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_one(&self, person: &NewPerson) -> RepoResult<Person> {
        self.insert(person)
            .map_err(|cause| RepoError::write(Operation::CreateOne, cause))
    }

    fn create_many(&self, people: &[NewPerson], policy: InsertPolicy) -> RepoResult<Vec<Person>> {
        match policy {
            InsertPolicy::Ordered => self.insert_ordered(people),
            InsertPolicy::Atomic => self.insert_atomic(people),
        }
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Vec<Person>> {
        self.select(&PersonQuery::new(PersonFilter::Name(name)))
            .map_err(|fault| fault.into_query(Operation::FindByName))
    }

    fn find_one_by_food(&self, food: &str) -> RepoResult<Option<Person>> {
        self.select_first(PersonQuery::new(PersonFilter::Food(food)))
            .map_err(|fault| fault.into_query(Operation::FindOneByFood))
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Person>> {
        let id = parse_id(id)?;
        self.select_first(PersonQuery::new(PersonFilter::Id(id)))
            .map_err(|fault| fault.into_query(Operation::FindById))
    }

    fn append_food(&self, id: &str, food: &str) -> RepoResult<Option<Person>> {
        let operation = Operation::ReadModifyWrite;
        let id = parse_id(id)?;
        let loaded = self
            .select_first(PersonQuery::new(PersonFilter::Id(id)))
            .map_err(|fault| fault.into_query(operation))?;
        let Some(mut person) = loaded else {
            return Ok(None);
        };

        person.favorite_foods.push(food.to_string());
        self.persist(operation, &person)
    }

    fn save(&self, person: &Person) -> RepoResult<Option<Person>> {
        self.persist(Operation::Save, person)
    }

    fn find_and_update_age(&self, name: &str, age: i64) -> RepoResult<Option<Person>> {
        let updated = self
            .returning(
                &format!(
                    "UPDATE people
                     SET body = json_set(body, '$.age', ?2), version = version + 1, {TOUCH_UPDATED_AT}
                     WHERE seq = (
                        SELECT seq FROM people
                        WHERE {NAME_PATH} = ?1
                        ORDER BY seq ASC
                        LIMIT 1
                     )
                     RETURNING id, version, body;"
                ),
                params![name, age],
            )
            .map_err(|fault| fault.into_query(Operation::FindAndUpdate))?;
        Ok(updated.into_iter().next())
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<Option<Person>> {
        let id = parse_id(id)?;
        let removed = self
            .returning(
                "DELETE FROM people WHERE id = ?1 RETURNING id, version, body;",
                [id.to_string()],
            )
            .map_err(|fault| fault.into_write(Operation::DeleteById))?;
        Ok(removed.into_iter().next())
    }

    fn delete_many_by_name(&self, name: &str) -> RepoResult<DeleteSummary> {
        let deleted_count = self
            .conn
            .execute(
                &format!("DELETE FROM people WHERE {NAME_PATH} = ?1;"),
                [name],
            )
            .map_err(|err| RepoError::write(Operation::DeleteMany, WriteCause::Store(err)))?;
        Ok(DeleteSummary { deleted_count })
    }

    fn chained_query(&self, food: &str) -> RepoResult<Vec<PersonSummary>> {
        let query = PersonQuery {
            filter: PersonFilter::Food(food),
            order: SortOrder::NameAscending,
            limit: Some(CHAINED_QUERY_LIMIT),
            exclude_age: true,
        };
        let people = self
            .select(&query)
            .map_err(|fault| fault.into_query(Operation::ChainedQuery))?;
        Ok(people.iter().map(Person::summary).collect())
    }
}

#[derive(Debug, Clone, Copy)]
enum PersonFilter<'a> {
    Id(PersonId),
    Name(&'a str),
    Food(&'a str),
}

#[derive(Debug, Clone, Copy)]
enum SortOrder {
    Store,
    NameAscending,
}

#[derive(Debug, Clone, Copy)]
struct PersonQuery<'a> {
    filter: PersonFilter<'a>,
    order: SortOrder,
    limit: Option<u32>,
    exclude_age: bool,
}

impl<'a> PersonQuery<'a> {
    fn new(filter: PersonFilter<'a>) -> Self {
        Self {
            filter,
            order: SortOrder::Store,
            limit: None,
            exclude_age: false,
        }
    }
}

/// Failure inside a repository helper, before it is tagged with an
/// operation.
enum Fault {
    Store(rusqlite::Error),
    Data(String),
}

impl Fault {
    fn into_query(self, operation: Operation) -> RepoError {
        match self {
            Self::Store(source) => RepoError::Query { operation, source },
            Self::Data(message) => RepoError::InvalidData(message),
        }
    }

    fn into_write(self, operation: Operation) -> RepoError {
        match self {
            Self::Store(err) => RepoError::write(operation, WriteCause::Store(err)),
            Self::Data(message) => RepoError::InvalidData(message),
        }
    }
}

impl From<rusqlite::Error> for Fault {
    fn from(value: rusqlite::Error) -> Self {
        Self::Store(value)
    }
}

fn parse_id(value: &str) -> RepoResult<PersonId> {
    PersonId::parse(value).ok_or_else(|| RepoError::InvalidId(value.to_string()))
}

fn version_to_db(version: u64) -> Result<i64, Fault> {
    i64::try_from(version).map_err(|_| Fault::Data(format!("version {version} out of range")))
}

fn parse_person_row(row: &Row<'_>) -> Result<Person, Fault> {
    let id_text: String = row.get("id")?;
    let id = PersonId::parse(&id_text)
        .ok_or_else(|| Fault::Data(format!("invalid id value `{id_text}` in people.id")))?;

    let version_value: i64 = row.get("version")?;
    let version = u64::try_from(version_value).map_err(|_| {
        Fault::Data(format!(
            "invalid version value `{version_value}` in people.version"
        ))
    })?;

    let body_text: String = row.get("body")?;
    let body: PersonBody = serde_json::from_str(&body_text)
        .map_err(|err| Fault::Data(format!("invalid body for person {id}: {err}")))?;

    let person = Person::from_body(id, version, body);
    person
        .validate()
        .map_err(|err| Fault::Data(format!("person {id}: {err}")))?;
    Ok(person)
}
