use people_core::db::open_db_in_memory;
use people_core::{
    PersonDraft, PersonFilter, PersonRepository, PersonService, PersonUpdate,
    PersonValidationError, RepoError, SqlitePersonRepository, DEFAULT_AGE_TO_SET,
    DEFAULT_FOOD_TO_ADD,
};
use uuid::Uuid;

#[test]
fn create_and_save_person_assigns_id_and_keeps_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());

    let person = service
        .create_and_save_person("John Doe", 30, ["Pizza", "Sushi"])
        .unwrap();

    assert!(!person.id.is_nil());
    assert_eq!(person.name, "John Doe");
    assert_eq!(person.age, 30);
    assert_eq!(person.favorite_foods, vec!["Pizza", "Sushi"]);
    assert_eq!(person.version, 0);

    let loaded = service
        .find_person_by_id(&person.id.to_string())
        .unwrap()
        .unwrap();
    assert_eq!(loaded, person);
}

#[test]
fn create_rejects_missing_required_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let no_name = PersonDraft {
        age: Some(3),
        ..PersonDraft::default()
    };
    let err = repo.insert_person(&no_name).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(PersonValidationError::MissingName)
    ));

    let no_age: PersonDraft = serde_json::from_str(r#"{"name":"Ann"}"#).unwrap();
    let err = repo.insert_person(&no_age).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(PersonValidationError::MissingAge)
    ));
}

#[test]
fn create_many_people_returns_every_record_in_order() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());

    let created = service
        .create_many_people(&[
            PersonDraft::new("Mary", 22, ["burrito"]),
            PersonDraft::new("Bob", 41, Vec::<String>::new()),
            PersonDraft::new("Mary", 35, ["salad"]),
        ])
        .unwrap();

    assert_eq!(created.len(), 3);
    let names: Vec<_> = created.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Mary", "Bob", "Mary"]);
    assert_ne!(created[0].id, created[2].id);
    assert_eq!(service.find_people_by_name("Mary").unwrap().len(), 2);
}

#[test]
fn create_many_people_is_all_or_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());

    let err = service
        .create_many_people(&[
            PersonDraft::new("Zed", 50, ["soup"]),
            PersonDraft {
                name: Some("Nobody".to_string()),
                ..PersonDraft::default()
            },
        ])
        .unwrap_err();

    assert!(matches!(err, RepoError::Validation(_)));
    assert!(service.find_people_by_name("Zed").unwrap().is_empty());
}

#[test]
fn find_people_by_name_returns_empty_when_no_match() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());
    service.create_and_save_person("Marylin", 60, ["tea"]).unwrap();

    let found = service.find_people_by_name("Mary").unwrap();
    assert!(found.is_empty());
}

#[test]
fn find_one_by_food_returns_first_match_or_none() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());
    assert!(service.find_one_by_food("burrito").unwrap().is_none());

    let first = service
        .create_and_save_person("Lee", 28, ["taco", "burrito"])
        .unwrap();
    service
        .create_and_save_person("Ada", 36, ["burrito"])
        .unwrap();

    let found = service.find_one_by_food("burrito").unwrap().unwrap();
    assert_eq!(found.id, first.id);
    assert!(found.likes("burrito"));
    assert!(service.find_one_by_food("Burrito").unwrap().is_none());
}

#[test]
fn find_person_by_id_distinguishes_cast_error_from_absence() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());

    let err = service.find_person_by_id("not-an-id").unwrap_err();
    assert!(matches!(err, RepoError::Cast { ref value } if value == "not-an-id"));

    let missing = service
        .find_person_by_id(&Uuid::new_v4().to_string())
        .unwrap();
    assert!(missing.is_none());
}

#[test]
fn find_edit_then_save_appends_one_food_and_bumps_version() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());
    let person = service
        .create_and_save_person("Kim", 33, ["ramen"])
        .unwrap();

    let updated = service
        .find_edit_then_save(&person.id.to_string(), DEFAULT_FOOD_TO_ADD)
        .unwrap();

    assert_eq!(updated.favorite_foods.len(), person.favorite_foods.len() + 1);
    assert_eq!(updated.favorite_foods.last().map(String::as_str), Some("hamburger"));
    assert_eq!(updated.version, person.version + 1);

    let stored = service.repository().get_person(person.id).unwrap().unwrap();
    assert_eq!(stored, updated);
}

#[test]
fn find_edit_then_save_reports_missing_person() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());
    let id = Uuid::new_v4();

    let err = service
        .find_edit_then_save(&id.to_string(), DEFAULT_FOOD_TO_ADD)
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
}

#[test]
fn stale_save_is_rejected_instead_of_overwriting() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let person = repo
        .insert_person(&PersonDraft::new("Sam", 40, ["pho"]))
        .unwrap();

    let mut first_copy = repo.get_person(person.id).unwrap().unwrap();
    let mut second_copy = first_copy.clone();

    first_copy.add_favorite_food("hamburger");
    repo.save_person(&first_copy).unwrap();

    second_copy.add_favorite_food("pizza");
    let err = repo.save_person(&second_copy).unwrap_err();
    assert!(matches!(
        err,
        RepoError::VersionConflict { id, expected_version: 0 } if id == person.id
    ));

    let stored = repo.get_person(person.id).unwrap().unwrap();
    assert_eq!(stored.favorite_foods, vec!["pho", "hamburger"]);
}

#[test]
fn save_of_deleted_person_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let person = repo
        .insert_person(&PersonDraft::new("Gone", 70, Vec::<String>::new()))
        .unwrap();
    repo.delete_person(person.id).unwrap();

    let err = repo.save_person(&person).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == person.id));
}

#[test]
fn find_and_update_sets_age_atomically() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());
    let first = service.create_and_save_person("Eve", 51, ["figs"]).unwrap();
    let second = service.create_and_save_person("Eve", 19, ["kale"]).unwrap();

    let updated = service
        .find_and_update("Eve", DEFAULT_AGE_TO_SET)
        .unwrap()
        .unwrap();
    assert_eq!(updated.id, first.id);
    assert_eq!(updated.age, 20);
    assert_eq!(updated.favorite_foods, vec!["figs"]);
    assert_eq!(updated.version, 1);

    let untouched = service.repository().get_person(second.id).unwrap().unwrap();
    assert_eq!(untouched.age, 19);
}

#[test]
fn find_and_update_without_match_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());

    assert!(service.find_and_update("Nobody", 20).unwrap().is_none());
}

#[test]
fn find_one_and_update_rejects_blank_name_and_replaces_foods() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let person = repo
        .insert_person(&PersonDraft::new("Ivy", 24, ["rice"]))
        .unwrap();

    let blank = PersonUpdate {
        name: Some(" ".to_string()),
        ..PersonUpdate::default()
    };
    let err = repo
        .find_one_and_update(&PersonFilter::by_id(person.id), &blank)
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let foods = PersonUpdate {
        favorite_foods: Some(vec!["bread".to_string(), "jam".to_string()]),
        ..PersonUpdate::default()
    };
    let updated = repo
        .find_one_and_update(&PersonFilter::by_id(person.id), &foods)
        .unwrap()
        .unwrap();
    assert_eq!(updated.favorite_foods, vec!["bread", "jam"]);
    assert_eq!(updated.name, "Ivy");
}

#[test]
fn remove_by_id_returns_snapshot_then_none() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());
    let person = service.create_and_save_person("Tom", 45, ["steak"]).unwrap();
    let id = person.id.to_string();

    let removed = service.remove_by_id(&id).unwrap().unwrap();
    assert_eq!(removed, person);
    assert!(service.find_person_by_id(&id).unwrap().is_none());
    assert!(service.remove_by_id(&id).unwrap().is_none());

    let err = service.remove_by_id("12345").unwrap_err();
    assert!(matches!(err, RepoError::Cast { .. }));
}

#[test]
fn remove_many_people_deletes_every_match_and_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());
    service
        .create_many_people(&[
            PersonDraft::new("Mary", 22, ["burrito"]),
            PersonDraft::new("Mary", 35, ["salad"]),
            PersonDraft::new("Jon", 29, ["burrito"]),
        ])
        .unwrap();

    let summary = service.remove_many_people("Mary").unwrap();
    assert_eq!(summary.deleted_count, 2);
    assert!(service.find_people_by_name("Mary").unwrap().is_empty());

    let again = service.remove_many_people("Mary").unwrap();
    assert_eq!(again.deleted_count, 0);
    assert_eq!(service.find_people_by_name("Jon").unwrap().len(), 1);
}
