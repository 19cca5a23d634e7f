use people_core::db::open_db_in_memory;
use people_core::{
    InsertPolicy, NewPerson, NoopObserver, Operation, PersonService, RepoError, RepoObserver,
    SqlitePersonRepository, WriteCause, APPENDED_FOOD,
};
use std::cell::RefCell;

#[derive(Default)]
struct RecordingObserver {
    successes: RefCell<Vec<(Operation, String)>>,
    errors: RefCell<Vec<(Operation, String)>>,
}

impl RepoObserver for RecordingObserver {
    fn on_success(&self, operation: Operation, detail: &str) {
        self.successes
            .borrow_mut()
            .push((operation, detail.to_string()));
    }

    fn on_error(&self, operation: Operation, error: &RepoError) {
        self.errors.borrow_mut().push((operation, error.to_string()));
    }
}

#[test]
fn every_operation_reports_success_to_observer() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let observer = RecordingObserver::default();
    let service = PersonService::with_observer(repo, &observer);

    let john = NewPerson::new("John Doe", Some(25), ["Pizza"]).unwrap();
    let created = service.create_one(&john).unwrap();
    let id = created.id().to_string();
    service.find_by_name("John Doe").unwrap();
    service.find_one_by_food("Pizza").unwrap();
    service.find_by_id(&id).unwrap();
    service.read_modify_write(&id).unwrap();
    service.find_and_update("John Doe", 26).unwrap();
    service.chained_query("Pizza").unwrap();
    service.delete_by_id(&id).unwrap();
    service.delete_many("John Doe").unwrap();

    let operations: Vec<_> = observer
        .successes
        .borrow()
        .iter()
        .map(|(operation, _)| *operation)
        .collect();
    assert_eq!(
        operations,
        vec![
            Operation::CreateOne,
            Operation::FindByName,
            Operation::FindOneByFood,
            Operation::FindById,
            Operation::ReadModifyWrite,
            Operation::FindAndUpdate,
            Operation::ChainedQuery,
            Operation::DeleteById,
            Operation::DeleteMany,
        ]
    );
    assert!(observer.errors.borrow().is_empty());
    assert_eq!(
        observer.successes.borrow()[0].1,
        format!("id={}", created.id())
    );
}

#[test]
fn errors_are_reported_and_returned_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let observer = RecordingObserver::default();
    let service = PersonService::with_observer(repo, &observer);

    let err = service.find_by_id("not-an-id").unwrap_err();
    assert!(matches!(err, RepoError::InvalidId(_)));

    let errors = observer.errors.borrow();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, Operation::FindById);
    assert_eq!(errors[0].1, err.to_string());
    assert!(observer.successes.borrow().is_empty());
}

#[test]
fn save_reports_success_and_stale_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let observer = RecordingObserver::default();
    let service = PersonService::with_observer(repo, &observer);

    let created = service
        .create_one(&NewPerson::new("John Doe", Some(25), ["Pizza"]).unwrap())
        .unwrap();
    let mut edited = created.clone();
    edited.age = Some(26);
    let saved = service.save(&edited).unwrap().unwrap();
    assert_eq!(saved.age, Some(26));
    assert_eq!(saved.version, created.version + 1);

    let err = service.save(&created).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Write {
            operation: Operation::Save,
            cause: WriteCause::Conflict { .. },
        }
    ));

    assert_eq!(
        observer.successes.borrow()[1],
        (Operation::Save, format!("found=true id={}", created.id()))
    );
    let errors = observer.errors.borrow();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0], (Operation::Save, err.to_string()));
}

#[test]
fn not_found_is_a_success_with_no_document() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let observer = RecordingObserver::default();
    let service = PersonService::with_observer(repo, &observer);

    assert!(service.find_and_update("Nobody", 20).unwrap().is_none());
    assert_eq!(
        observer.successes.borrow()[0],
        (Operation::FindAndUpdate, "found=false".to_string())
    );
}

#[test]
fn read_modify_write_appends_fixed_food_each_call() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let service = PersonService::with_observer(repo, NoopObserver);

    let created = service
        .create_one(&NewPerson::new("John Doe", None, ["Pizza"]).unwrap())
        .unwrap();
    let id = created.id().to_string();

    service.read_modify_write(&id).unwrap();
    let twice = service.read_modify_write(&id).unwrap().unwrap();
    assert_eq!(twice.favorite_foods, vec!["Pizza", APPENDED_FOOD, APPENDED_FOOD]);
}

#[test]
fn find_and_update_round_trips_through_find_by_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let service = PersonService::with_observer(repo, NoopObserver);
    service
        .create_one(&NewPerson::new("Mary Doe", Some(30), ["Burrito"]).unwrap())
        .unwrap();

    let updated = service.find_and_update("Mary Doe", 20).unwrap().unwrap();
    assert_eq!(updated.age, Some(20));

    let found = service.find_by_name("Mary Doe").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].age, Some(20));
}

#[test]
fn create_many_uses_configured_insert_policy() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let observer = RecordingObserver::default();
    let service =
        PersonService::with_observer(repo, &observer).with_insert_policy(InsertPolicy::Atomic);
    assert_eq!(service.insert_policy(), InsertPolicy::Atomic);

    let people = [
        NewPerson::new("Mary Doe", Some(30), ["Burrito"]).unwrap(),
        NewPerson::new("Jane Doe", Some(28), ["Sushi"]).unwrap(),
        NewPerson::new("Bob Smith", Some(40), ["Pizza"]).unwrap(),
    ];
    let created = service.create_many(&people).unwrap();
    assert_eq!(created.len(), 3);
    assert_eq!(
        observer.successes.borrow()[0],
        (Operation::CreateMany, "count=3 policy=atomic".to_string())
    );
}
