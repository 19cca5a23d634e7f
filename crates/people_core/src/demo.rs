//! One-shot demonstration sequence over the person façade.
//!
//! # Responsibility
//! - Exercise every façade operation once, in a fixed order.
//! - Collect each step's observable result into a `DemoReport`.
//!
//! # Invariants
//! - The first failing step aborts the run; later steps never execute.

use crate::model::person::{NewPerson, Person, PersonSummary, PersonValidationError};
use crate::repo::person_repo::{DeleteSummary, PersonRepository, RepoError};
use crate::service::observer::RepoObserver;
use crate::service::person_service::PersonService;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const FOOD_QUERY: &str = "Pizza";
const UPDATED_AGE: i64 = 20;

/// Results observed by each demo step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoReport {
    pub created: Person,
    pub created_many: Vec<Person>,
    pub found_by_name: Vec<Person>,
    pub found_by_food: Option<Person>,
    pub found_by_id: Option<Person>,
    pub edited: Option<Person>,
    pub updated: Option<Person>,
    pub removed: Option<Person>,
    pub removed_many: DeleteSummary,
    pub chained: Vec<PersonSummary>,
}

#[derive(Debug)]
pub enum DemoError {
    InvalidSeed(PersonValidationError),
    Step {
        step: &'static str,
        source: RepoError,
    },
}

impl Display for DemoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSeed(err) => write!(f, "invalid demo seed: {err}"),
            Self::Step { step, source } => write!(f, "demo step `{step}` failed: {source}"),
        }
    }
}

impl Error for DemoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSeed(err) => Some(err),
            Self::Step { source, .. } => Some(source),
        }
    }
}

impl From<PersonValidationError> for DemoError {
    fn from(value: PersonValidationError) -> Self {
        Self::InvalidSeed(value)
    }
}

/// Runs the demo sequence against `service`.
///
/// # Side effects
/// - Inserts, modifies and deletes documents in the backing collection.
/// - Emits one `demo_step` event per completed step and a final `demo_run`.
pub fn run_demo<R, O>(service: &PersonService<R, O>) -> Result<DemoReport, DemoError>
where
    R: PersonRepository,
    O: RepoObserver,
{
    let started_at = Instant::now();
    info!("event=demo_run module=demo status=start");

    let result = run_steps(service);
    match &result {
        Ok(_) => info!(
            "event=demo_run module=demo status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=demo_run module=demo status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn run_steps<R, O>(service: &PersonService<R, O>) -> Result<DemoReport, DemoError>
where
    R: PersonRepository,
    O: RepoObserver,
{
    let john = NewPerson::new("John Doe", Some(25), ["Pizza", "Pasta"])?;
    let created = step("create_one", service.create_one(&john))?;
    let john_id = created.id().to_string();

    let others = [
        NewPerson::new("Mary Doe", Some(30), ["Burrito", "Pizza"])?,
        NewPerson::new("Jane Doe", Some(28), ["Sushi"])?,
        NewPerson::new("Bob Smith", Some(40), ["Pizza", "Tacos"])?,
    ];
    let created_many = step("create_many", service.create_many(&others))?;

    let found_by_name = step("find_by_name", service.find_by_name(created.name.as_str()))?;
    let found_by_food = step("find_one_by_food", service.find_one_by_food(FOOD_QUERY))?;
    let found_by_id = step("find_by_id", service.find_by_id(&john_id))?;
    let edited = step("read_modify_write", service.read_modify_write(&john_id))?;
    let updated = step(
        "find_and_update",
        service.find_and_update("Mary Doe", UPDATED_AGE),
    )?;

    let removed = match created_many.iter().find(|person| person.name == "Jane Doe") {
        Some(jane) => step("delete_by_id", service.delete_by_id(&jane.id().to_string()))?,
        None => None,
    };
    let removed_many = step("delete_many", service.delete_many("Mary Doe"))?;
    let chained = step("chained_query", service.chained_query(FOOD_QUERY))?;

    Ok(DemoReport {
        created,
        created_many,
        found_by_name,
        found_by_food,
        found_by_id,
        edited,
        updated,
        removed,
        removed_many,
        chained,
    })
}

fn step<T>(name: &'static str, result: Result<T, RepoError>) -> Result<T, DemoError> {
    match result {
        Ok(value) => {
            info!("event=demo_step module=demo status=ok step={name}");
            Ok(value)
        }
        Err(source) => Err(DemoError::Step { step: name, source }),
    }
}
