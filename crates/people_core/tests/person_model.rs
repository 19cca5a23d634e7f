use people_core::{NewPerson, PersonValidationError};

#[test]
fn new_person_keeps_fields_in_order() {
    let person = NewPerson::new("John Doe", Some(25), ["Pizza", "Pasta", "Pizza"]).unwrap();

    assert_eq!(person.name(), "John Doe");
    assert_eq!(person.age(), Some(25));
    assert_eq!(person.favorite_foods(), ["Pizza", "Pasta", "Pizza"]);
}

#[test]
fn new_person_rejects_blank_name() {
    let err = NewPerson::new("   ", Some(25), Vec::<String>::new()).unwrap_err();
    assert_eq!(err, PersonValidationError::EmptyName);
}

#[test]
fn serialization_uses_collection_wire_fields() {
    let person = NewPerson::new("Mary Doe", None, ["Burrito"]).unwrap();

    let json = serde_json::to_value(&person).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "name": "Mary Doe", "favoriteFoods": ["Burrito"] })
    );

    let decoded: NewPerson = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, person);
}

#[test]
fn deserialize_rejects_missing_name() {
    let value = serde_json::json!({ "age": 40, "favoriteFoods": ["Tacos"] });

    let err = serde_json::from_value::<NewPerson>(value).unwrap_err();
    assert!(
        err.to_string().contains("name is required"),
        "unexpected error: {err}"
    );
}

#[test]
fn deserialize_defaults_missing_optional_fields() {
    let value = serde_json::json!({ "name": "Jane Doe" });

    let person: NewPerson = serde_json::from_value(value).unwrap();
    assert_eq!(person.age(), None);
    assert!(person.favorite_foods().is_empty());
}
