use chrono::NaiveDate;
use schoolbook_core::db::open_db_in_memory;
use schoolbook_core::repo::account_repo::{AccountRepository, SqliteAccountRepository};
use schoolbook_core::repo::class_repo::{ClassTemplateRepository, SqliteClassTemplateRepository};
use schoolbook_core::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use schoolbook_core::{
    Account, AccountId, ClassTemplate, ClassTemplateId, Gender, Profile, RepoError,
    ValidationErrorKind,
};
use rusqlite::Connection;

fn seed(conn: &Connection) -> (AccountId, ClassTemplateId) {
    let accounts = SqliteAccountRepository::try_new(conn).unwrap();
    let classes = SqliteClassTemplateRepository::try_new(conn).unwrap();
    let account = accounts.create_account(&Account::new("Kemi")).unwrap();
    let class = classes
        .create_class_template(&ClassTemplate::new("2024", "Grade 5A"))
        .unwrap();
    (account.id, class.id)
}

fn complete(account_id: AccountId, class_id: ClassTemplateId, gender: Gender) -> Profile {
    let mut profile = Profile::new(account_id, "https://cdn.school.test/kemi.jpg");
    profile.dob = NaiveDate::from_ymd_opt(2013, 11, 2);
    profile.gender = Some(gender);
    profile.class_template_id = Some(class_id);
    profile.guardian_name = Some("Lola Ade".to_string());
    profile.guardian_phone = Some("08031234567".to_string());
    profile.guardian_address = Some("4 Allen Avenue".to_string());
    profile
}

#[test]
fn profile_round_trips_every_field() {
    let conn = open_db_in_memory().unwrap();
    let (account_id, class_id) = seed(&conn);
    let profiles = SqliteProfileRepository::try_new(&conn).unwrap();

    let draft = complete(account_id, class_id, Gender::Female);
    let created = profiles.create_profile(&draft).unwrap();
    assert_eq!(created.dob, draft.dob);
    assert_eq!(created.gender, Some(Gender::Female));
    assert_eq!(created.class_template_id, Some(class_id));
    assert_eq!(created.guardian_phone.as_deref(), Some("08031234567"));

    let by_account = profiles.get_profile_for_account(account_id).unwrap().unwrap();
    assert_eq!(by_account, created);
}

#[test]
fn gender_values_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let accounts = SqliteAccountRepository::try_new(&conn).unwrap();
    let classes = SqliteClassTemplateRepository::try_new(&conn).unwrap();
    let profiles = SqliteProfileRepository::try_new(&conn).unwrap();
    let class = classes
        .create_class_template(&ClassTemplate::new("2024", "Grade 5A"))
        .unwrap();

    for gender in Gender::ALL {
        let account = accounts.create_account(&Account::new("Student")).unwrap();
        let created = profiles
            .create_profile(&complete(account.id, class.id, gender))
            .unwrap();
        let loaded = profiles.get_profile(created.id).unwrap().unwrap();
        assert_eq!(loaded.gender, Some(gender));
    }
    assert_eq!(profiles.list_profiles().unwrap().len(), 3);
}

#[test]
fn raw_gender_outside_enumeration_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let (account_id, _) = seed(&conn);

    let err: RepoError = conn
        .execute(
            "INSERT INTO profiles (id, account_id, image, gender)
             VALUES ('p1', ?1, 'https://cdn.school.test/x.jpg', 'X');",
            [account_id.to_string()],
        )
        .unwrap_err()
        .into();
    assert!(matches!(err, RepoError::Integrity(_)));

    let err = "unknown".parse::<Gender>().unwrap_err();
    assert!(matches!(err.kind, ValidationErrorKind::InvalidChoice { .. }));
}

#[test]
fn second_profile_for_account_is_integrity_error() {
    let conn = open_db_in_memory().unwrap();
    let (account_id, class_id) = seed(&conn);
    let profiles = SqliteProfileRepository::try_new(&conn).unwrap();

    profiles
        .create_profile(&complete(account_id, class_id, Gender::Male))
        .unwrap();
    let err = profiles
        .create_profile(&complete(account_id, class_id, Gender::Male))
        .unwrap_err();
    assert!(matches!(err, RepoError::Integrity(_)), "{err}");
}

#[test]
fn incomplete_profile_is_rejected_before_write() {
    let conn = open_db_in_memory().unwrap();
    let (account_id, class_id) = seed(&conn);
    let profiles = SqliteProfileRepository::try_new(&conn).unwrap();

    let mut profile = complete(account_id, class_id, Gender::Neither);
    profile.image = "kemi.jpg".to_string();
    match profiles.create_profile(&profile).unwrap_err() {
        RepoError::Validation(err) => {
            assert_eq!(err.field, "image");
            assert!(matches!(err.kind, ValidationErrorKind::InvalidUrl { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut profile = complete(account_id, class_id, Gender::Neither);
    profile.dob = None;
    assert!(matches!(
        profiles.create_profile(&profile).unwrap_err(),
        RepoError::Validation(_)
    ));
    assert!(profiles.list_profiles().unwrap().is_empty());
}

#[test]
fn class_removal_clears_profile_class_and_account_removal_deletes_profile() {
    let conn = open_db_in_memory().unwrap();
    let (account_id, class_id) = seed(&conn);
    let accounts = SqliteAccountRepository::try_new(&conn).unwrap();
    let classes = SqliteClassTemplateRepository::try_new(&conn).unwrap();
    let profiles = SqliteProfileRepository::try_new(&conn).unwrap();

    let profile = profiles
        .create_profile(&complete(account_id, class_id, Gender::Female))
        .unwrap();

    classes.delete_class_template(class_id).unwrap();
    let cleared = profiles.get_profile(profile.id).unwrap().unwrap();
    assert_eq!(cleared.class_template_id, None);

    let summary = accounts.delete_account(account_id).unwrap();
    assert_eq!(summary.deleted_in("profiles"), 1);
    assert!(profiles.get_profile(profile.id).unwrap().is_none());
}
