use people_core::{Person, PersonDraft, PersonValidationError};
use uuid::Uuid;

#[test]
fn draft_new_sets_required_fields() {
    let draft = PersonDraft::new("John Doe", 30, ["Pizza", "Sushi"]);

    assert_eq!(draft.name.as_deref(), Some("John Doe"));
    assert_eq!(draft.age, Some(30));
    assert_eq!(draft.favorite_foods, vec!["Pizza", "Sushi"]);
    assert_eq!(draft.validate(), Ok(()));
}

#[test]
fn from_draft_generates_fresh_ids() {
    let draft = PersonDraft::new("Twin", 8, Vec::<String>::new());
    let first = Person::from_draft(&draft).unwrap();
    let second = Person::from_draft(&draft).unwrap();

    assert!(!first.id.is_nil());
    assert_ne!(first.id, second.id);
    assert_eq!(first.version, 0);
}

#[test]
fn draft_deserializes_with_missing_fields() {
    let draft: PersonDraft = serde_json::from_str(r#"{"age": 4}"#).unwrap();
    assert_eq!(draft.name, None);
    assert!(draft.favorite_foods.is_empty());
    assert_eq!(
        Person::from_draft(&draft).unwrap_err(),
        PersonValidationError::MissingName
    );
}

#[test]
fn person_serialization_uses_collection_field_names() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let person = Person::from_draft_with_id(id, &PersonDraft::new("Ana", 27, ["burrito"])).unwrap();

    let json = serde_json::to_value(&person).unwrap();
    assert_eq!(json["_id"], id.to_string());
    assert_eq!(json["name"], "Ana");
    assert_eq!(json["age"], 27);
    assert_eq!(json["favoriteFoods"][0], "burrito");
    assert_eq!(json["__v"], 0);

    let decoded: Person = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, person);
}
