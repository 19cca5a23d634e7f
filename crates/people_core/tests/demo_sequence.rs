use people_core::db::open_db_in_memory;
use people_core::{
    run_demo, DemoError, NoopObserver, Operation, PersonService, RepoError, SqlitePersonRepository,
    APPENDED_FOOD,
};

#[test]
fn demo_runs_every_step_against_fresh_store() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let service = PersonService::with_observer(repo, NoopObserver);

    let report = run_demo(&service).unwrap();

    assert_eq!(report.created.name, "John Doe");
    assert_eq!(report.created_many.len(), 3);
    assert_eq!(report.found_by_name.len(), 1);
    assert_eq!(report.found_by_name[0].id(), report.created.id());
    assert_eq!(
        report.found_by_food.as_ref().map(|p| p.id()),
        Some(report.created.id())
    );
    assert_eq!(report.found_by_id.as_ref(), Some(&report.created));

    let edited = report.edited.unwrap();
    assert_eq!(edited.favorite_foods, vec!["Pizza", "Pasta", APPENDED_FOOD]);

    let updated = report.updated.unwrap();
    assert_eq!(updated.name, "Mary Doe");
    assert_eq!(updated.age, Some(20));

    assert_eq!(report.removed.map(|p| p.name), Some("Jane Doe".to_string()));
    assert_eq!(report.removed_many.deleted_count, 1);

    let names: Vec<_> = report.chained.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Bob Smith", "John Doe"]);
}

#[test]
fn demo_aborts_at_first_failing_step() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_second_batch
         BEFORE INSERT ON people
         WHEN json_extract(NEW.body, '$.name') = 'Jane Doe'
         BEGIN
            SELECT RAISE(ABORT, 'rejected by test trigger');
         END;",
    )
    .unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let service = PersonService::with_observer(repo, NoopObserver);

    let err = run_demo(&service).unwrap_err();
    assert!(matches!(
        err,
        DemoError::Step {
            step: "create_many",
            source: RepoError::Write {
                operation: Operation::CreateMany,
                ..
            },
        }
    ));

    // Later steps never ran: John and Mary (inserted before the failure)
    // are untouched.
    let john = service.find_by_name("John Doe").unwrap();
    assert_eq!(john[0].favorite_foods, vec!["Pizza", "Pasta"]);
    let mary = service.find_by_name("Mary Doe").unwrap();
    assert_eq!(mary[0].age, Some(30));
}
