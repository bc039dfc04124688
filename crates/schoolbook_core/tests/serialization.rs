use schoolbook_core::{
    ClassTemplate, CommunicationBook, Gender, Profile, ReferentialAction, StudentResult, Term,
    TermKind, RELATIONS,
};
use serde_json::json;
use uuid::Uuid;

#[test]
fn enums_serialize_as_labels() {
    assert_eq!(serde_json::to_value(TermKind::First).unwrap(), json!("FIRST"));
    assert_eq!(serde_json::to_value(TermKind::Error).unwrap(), json!("ERROR"));
    assert_eq!(serde_json::to_value(Gender::Neither).unwrap(), json!("NEITHER"));
    assert_eq!(
        serde_json::from_value::<Gender>(json!("FEMALE")).unwrap(),
        Gender::Female
    );
    assert!(serde_json::from_value::<TermKind>(json!("FOURTH")).is_err());
}

#[test]
fn term_payload_carries_label_and_class() {
    let class = ClassTemplate::new("2024", "Grade 5A");
    let term = Term::new(class.id, TermKind::Third);
    let value = serde_json::to_value(&term).unwrap();
    assert_eq!(value["term"], json!("THIRD"));
    assert_eq!(value["class_template_id"], json!(class.id.to_string()));
}

#[test]
fn cleared_references_serialize_as_null() {
    let mut result = StudentResult::new(Uuid::new_v4(), Uuid::new_v4());
    result.subject_id = None;
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["subject_id"], serde_json::Value::Null);
    assert_eq!(value["test"], serde_json::Value::Null);

    let profile = Profile::new(Uuid::new_v4(), "https://cdn.school.test/p.png");
    let value = serde_json::to_value(&profile).unwrap();
    assert_eq!(value["dob"], serde_json::Value::Null);
    assert_eq!(value["gender"], serde_json::Value::Null);
}

#[test]
fn book_members_serialize_as_arrays() {
    let student = Uuid::new_v4();
    let comment = Uuid::new_v4();
    let book = CommunicationBook::new([student], [comment]);
    let value = serde_json::to_value(&book).unwrap();
    assert_eq!(value["students"], json!([student.to_string()]));
    assert_eq!(value["comments"], json!([comment.to_string()]));
}

#[test]
fn relation_registry_is_serializable() {
    let value = serde_json::to_value(RELATIONS).unwrap();
    let first = &value[0];
    assert_eq!(first["table"], json!("teachers"));
    assert_eq!(first["action"], json!("clear"));
    assert_eq!(
        serde_json::to_value(ReferentialAction::Cascade).unwrap(),
        json!("cascade")
    );
}
