//! Person document model.
//!
//! # Responsibility
//! - Define the validated input record (`NewPerson`) and persisted record
//!   (`Person`) for the `people` collection.
//! - Define the age-less projection returned by chained queries.
//!
//! # Invariants
//! - `name` is non-empty after trimming for every record that reaches storage.
//! - `favorite_foods` keeps insertion order and allows duplicates.
//! - `PersonId` values are minted by the store only.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque identifier assigned by the store when a document is inserted.
///
/// There is no public constructor. Callers obtain ids from persisted
/// documents and refer back to them through their text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PersonId(Uuid);

impl PersonId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses the text form of a stored id. Nil UUIDs are never generated,
    /// so they are rejected like any other malformed input. Surrounding
    /// whitespace is not stripped.
    pub(crate) fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value)
            .ok()
            .filter(|uuid| !uuid.is_nil())
            .map(Self)
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Validation failures for person records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    /// `name` is required and must contain non-whitespace text.
    EmptyName,
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name is required and cannot be blank"),
        }
    }
}

impl Error for PersonValidationError {}

/// JSON body stored per document: `{ name, age?, favoriteFoods }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PersonBody {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default)]
    pub favorite_foods: Vec<String>,
}

/// Validated person record that has not been stored yet.
///
/// Deserialization runs the same validation as [`NewPerson::new`], so a
/// document without a usable `name` can never be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersonBody", into = "PersonBody")]
pub struct NewPerson {
    name: String,
    age: Option<i64>,
    favorite_foods: Vec<String>,
}

impl NewPerson {
    /// Builds a record, rejecting a blank `name`.
    pub fn new<I, S>(
        name: impl Into<String>,
        age: Option<i64>,
        favorite_foods: I,
    ) -> Result<Self, PersonValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let person = Self {
            name: name.into(),
            age,
            favorite_foods: favorite_foods.into_iter().map(Into::into).collect(),
        };
        person.validate()?;
        Ok(person)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> Option<i64> {
        self.age
    }

    pub fn favorite_foods(&self) -> &[String] {
        &self.favorite_foods
    }

    /// Re-checks required fields. Repository write paths call this before
    /// touching storage.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        validate_name(&self.name)
    }

    pub(crate) fn to_body(&self) -> PersonBody {
        PersonBody {
            name: self.name.clone(),
            age: self.age,
            favorite_foods: self.favorite_foods.clone(),
        }
    }
}

impl TryFrom<PersonBody> for NewPerson {
    type Error = PersonValidationError;

    fn try_from(body: PersonBody) -> Result<Self, Self::Error> {
        Self::new(body.name, body.age, body.favorite_foods)
    }
}

impl From<NewPerson> for PersonBody {
    fn from(person: NewPerson) -> Self {
        Self {
            name: person.name,
            age: person.age,
            favorite_foods: person.favorite_foods,
        }
    }
}

/// A document as persisted in the `people` collection.
///
/// The id is read-only outside this crate:
///
/// ```compile_fail
/// fn reassign(person: &mut people_core::Person, other: &people_core::Person) {
///     person.id = other.id();
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Store-generated identity, immutable for the document lifetime.
    pub(crate) id: PersonId,
    /// Revision counter bumped by every persisted modification.
    pub version: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    pub favorite_foods: Vec<String>,
}

impl Person {
    pub(crate) fn from_body(id: PersonId, version: u64, body: PersonBody) -> Self {
        Self {
            id,
            version,
            name: body.name,
            age: body.age,
            favorite_foods: body.favorite_foods,
        }
    }

    pub fn id(&self) -> PersonId {
        self.id
    }

    pub fn validate(&self) -> Result<(), PersonValidationError> {
        validate_name(&self.name)
    }

    /// Projection without `age`.
    pub fn summary(&self) -> PersonSummary {
        PersonSummary {
            id: self.id,
            name: self.name.clone(),
            favorite_foods: self.favorite_foods.clone(),
        }
    }

    pub(crate) fn to_body(&self) -> PersonBody {
        PersonBody {
            name: self.name.clone(),
            age: self.age,
            favorite_foods: self.favorite_foods.clone(),
        }
    }
}

/// Person projection returned by chained queries; carries no `age` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub id: PersonId,
    pub name: String,
    pub favorite_foods: Vec<String>,
}

fn validate_name(name: &str) -> Result<(), PersonValidationError> {
    if name.trim().is_empty() {
        return Err(PersonValidationError::EmptyName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{PersonBody, PersonId};

    #[test]
    fn parse_accepts_generated_ids_and_rejects_garbage() {
        let id = PersonId::generate();
        assert_eq!(PersonId::parse(&id.to_string()), Some(id));
        assert_eq!(PersonId::parse("not-an-id"), None);
        assert_eq!(PersonId::parse("00000000-0000-0000-0000-000000000000"), None);
        assert_eq!(PersonId::parse(&format!(" {id} ")), None);
        assert_eq!(PersonId::parse(&format!("{id}\n")), None);
    }

    #[test]
    fn body_omits_missing_age() {
        let body = PersonBody {
            name: "Jane Doe".to_string(),
            age: None,
            favorite_foods: vec!["Sushi".to_string()],
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"name":"Jane Doe","favoriteFoods":["Sushi"]}"#);
    }
}
