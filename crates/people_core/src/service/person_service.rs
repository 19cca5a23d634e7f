//! Person document façade.
//!
//! # Responsibility
//! - Provide the fixed set of document operations for core callers.
//! - Delegate persistence to a `PersonRepository` and report outcomes to a
//!   `RepoObserver`.
//!
//! # Invariants
//! - Each call maps to exactly one repository call; there are no retries.
//! - Repository results are returned unchanged, errors included.

use crate::model::person::{NewPerson, Person, PersonSummary};
use crate::repo::person_repo::{
    DeleteSummary, InsertPolicy, Operation, PersonRepository, RepoResult,
};
use crate::service::observer::{LogObserver, RepoObserver};

/// Food appended by [`PersonService::read_modify_write`].
pub const APPENDED_FOOD: &str = "Hamburger";

/// Document repository façade over one `people` collection.
pub struct PersonService<R: PersonRepository, O: RepoObserver = LogObserver> {
    repo: R,
    observer: O,
    insert_policy: InsertPolicy,
}

impl<R: PersonRepository> PersonService<R> {
    /// Creates a façade that reports outcomes through `log`.
    pub fn new(repo: R) -> Self {
        Self::with_observer(repo, LogObserver)
    }
}

impl<R: PersonRepository, O: RepoObserver> PersonService<R, O> {
    pub fn with_observer(repo: R, observer: O) -> Self {
        Self {
            repo,
            observer,
            insert_policy: InsertPolicy::default(),
        }
    }

    /// Sets the policy used by [`Self::create_many`].
    pub fn with_insert_policy(mut self, policy: InsertPolicy) -> Self {
        self.insert_policy = policy;
        self
    }

    pub fn insert_policy(&self) -> InsertPolicy {
        self.insert_policy
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn create_one(&self, person: &NewPerson) -> RepoResult<Person> {
        let result = self.repo.create_one(person);
        self.report(Operation::CreateOne, &result, |stored| {
            format!("id={}", stored.id())
        });
        result
    }

    /// Inserts documents in input order under the configured policy.
    pub fn create_many(&self, people: &[NewPerson]) -> RepoResult<Vec<Person>> {
        let result = self.repo.create_many(people, self.insert_policy);
        self.report(Operation::CreateMany, &result, |stored| {
            format!(
                "count={} policy={}",
                stored.len(),
                self.insert_policy.as_str()
            )
        });
        result
    }

    pub fn find_by_name(&self, name: &str) -> RepoResult<Vec<Person>> {
        let result = self.repo.find_by_name(name);
        self.report(Operation::FindByName, &result, |found| {
            format!("count={}", found.len())
        });
        result
    }

    pub fn find_one_by_food(&self, food: &str) -> RepoResult<Option<Person>> {
        let result = self.repo.find_one_by_food(food);
        self.report(Operation::FindOneByFood, &result, describe_optional);
        result
    }

    pub fn find_by_id(&self, id: &str) -> RepoResult<Option<Person>> {
        let result = self.repo.find_by_id(id);
        self.report(Operation::FindById, &result, describe_optional);
        result
    }

    /// Loads the document, appends [`APPENDED_FOOD`] and saves it.
    ///
    /// Not idempotent: every call appends another entry.
    pub fn read_modify_write(&self, id: &str) -> RepoResult<Option<Person>> {
        let result = self.repo.append_food(id, APPENDED_FOOD);
        self.report(Operation::ReadModifyWrite, &result, describe_optional);
        result
    }

    /// Persists a caller-modified document. A stale `version` is a
    /// conflict; `None` when the document was deleted meanwhile.
    pub fn save(&self, person: &Person) -> RepoResult<Option<Person>> {
        let result = self.repo.save(person);
        self.report(Operation::Save, &result, describe_optional);
        result
    }

    /// Sets `age` on the first document named `name`; `None` when no
    /// document matches.
    pub fn find_and_update(&self, name: &str, age: i64) -> RepoResult<Option<Person>> {
        let result = self.repo.find_and_update_age(name, age);
        self.report(Operation::FindAndUpdate, &result, describe_optional);
        result
    }

    pub fn delete_by_id(&self, id: &str) -> RepoResult<Option<Person>> {
        let result = self.repo.delete_by_id(id);
        self.report(Operation::DeleteById, &result, describe_optional);
        result
    }

    pub fn delete_many(&self, name: &str) -> RepoResult<DeleteSummary> {
        let result = self.repo.delete_many_by_name(name);
        self.report(Operation::DeleteMany, &result, |summary| {
            format!("deleted_count={}", summary.deleted_count)
        });
        result
    }

    pub fn chained_query(&self, food: &str) -> RepoResult<Vec<PersonSummary>> {
        let result = self.repo.chained_query(food);
        self.report(Operation::ChainedQuery, &result, |found| {
            format!("count={}", found.len())
        });
        result
    }

    fn report<T>(
        &self,
        operation: Operation,
        result: &RepoResult<T>,
        describe: impl FnOnce(&T) -> String,
    ) {
        match result {
            Ok(value) => self.observer.on_success(operation, &describe(value)),
            Err(err) => self.observer.on_error(operation, err),
        }
    }
}

fn describe_optional(person: &Option<Person>) -> String {
    match person {
        Some(person) => format!("found=true id={}", person.id()),
        None => "found=false".to_string(),
    }
}
