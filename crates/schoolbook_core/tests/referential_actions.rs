use schoolbook_core::db::open_db_in_memory;
use schoolbook_core::repo::account_repo::{
    AccountDirectory, AccountRepository, SqliteAccountRepository,
};
use schoolbook_core::repo::class_repo::{ClassTemplateRepository, SqliteClassTemplateRepository};
use schoolbook_core::repo::comment_repo::{CommentRepository, SqliteCommentRepository};
use schoolbook_core::repo::result_repo::{
    ResultListQuery, SqliteStudentResultRepository, StudentResultRepository,
};
use schoolbook_core::repo::subject_repo::{SqliteSubjectRepository, SubjectRepository};
use schoolbook_core::repo::teacher_repo::{SqliteTeacherRepository, TeacherRepository};
use schoolbook_core::repo::term_repo::{SqliteTermRepository, TermRepository};
use schoolbook_core::repo::ticket_repo::{SqliteTicketRepository, TicketRepository};
use schoolbook_core::{
    Account, ClassTemplate, Comment, RepoError, StudentResult, Subject, Teacher, Term, TermKind,
    Ticket,
};
use uuid::Uuid;

#[test]
fn deleting_class_clears_subjects_and_removes_terms() {
    let conn = open_db_in_memory().unwrap();
    let classes = SqliteClassTemplateRepository::try_new(&conn).unwrap();
    let subjects = SqliteSubjectRepository::try_new(&conn).unwrap();
    let terms = SqliteTermRepository::try_new(&conn).unwrap();

    let class = classes
        .create_class_template(&ClassTemplate::new("2024", "Grade 5A"))
        .unwrap();
    let subject = subjects
        .create_subject(&Subject::new(class.id, "Math", "Algebra"))
        .unwrap();
    terms
        .create_term(&Term::new(class.id, TermKind::First))
        .unwrap();
    terms
        .create_term(&Term::new(class.id, TermKind::Second))
        .unwrap();

    let summary = classes.delete_class_template(class.id).unwrap();

    let survivor = subjects.get_subject(subject.id).unwrap().unwrap();
    assert_eq!(survivor.class_template_id, None);
    assert_eq!(survivor.name, "Math");
    assert!(terms.list_terms(class.id).unwrap().is_empty());
    assert!(classes.get_class_template(class.id).unwrap().is_none());

    assert_eq!(summary.deleted_in("class_templates"), 1);
    assert_eq!(summary.deleted_in("terms"), 2);
    assert_eq!(summary.cleared_in("subjects"), 1);
}

#[test]
fn deleting_subject_keeps_results_with_empty_subject() {
    let conn = open_db_in_memory().unwrap();
    let accounts = SqliteAccountRepository::try_new(&conn).unwrap();
    let classes = SqliteClassTemplateRepository::try_new(&conn).unwrap();
    let subjects = SqliteSubjectRepository::try_new(&conn).unwrap();
    let results = SqliteStudentResultRepository::try_new(&conn).unwrap();

    let student = accounts.create_account(&Account::new("Tolu")).unwrap();
    let class = classes
        .create_class_template(&ClassTemplate::new("2024", "Grade 5A"))
        .unwrap();
    let subject = subjects
        .create_subject(&Subject::new(class.id, "Science", "Basic science"))
        .unwrap();
    let result = results
        .create_result(&StudentResult::new(student.id, subject.id).with_scores(Some(18), Some(52)))
        .unwrap();

    let summary = subjects.delete_subject(subject.id).unwrap();
    assert_eq!(summary.cleared_in("results"), 1);

    let kept = results.get_result(result.id).unwrap().unwrap();
    assert_eq!(kept.subject_id, None);
    assert_eq!(kept.account_id, Some(student.id));
    assert_eq!((kept.test, kept.exam), (Some(18), Some(52)));

    let orphaned = results
        .list_results(&ResultListQuery {
            orphaned_only: true,
            ..ResultListQuery::default()
        })
        .unwrap();
    assert_eq!(orphaned.len(), 1);
}

#[test]
fn deleting_account_applies_every_account_relation() {
    let conn = open_db_in_memory().unwrap();
    let accounts = SqliteAccountRepository::try_new(&conn).unwrap();
    let teachers = SqliteTeacherRepository::try_new(&conn).unwrap();
    let classes = SqliteClassTemplateRepository::try_new(&conn).unwrap();
    let subjects = SqliteSubjectRepository::try_new(&conn).unwrap();
    let results = SqliteStudentResultRepository::try_new(&conn).unwrap();
    let comments = SqliteCommentRepository::try_new(&conn).unwrap();
    let tickets = SqliteTicketRepository::try_new(&conn).unwrap();

    let account = accounts.create_account(&Account::new("Bisi")).unwrap();
    let other = accounts.create_account(&Account::new("Chidi")).unwrap();
    let teacher = teachers.create_teacher(&Teacher::new(account.id)).unwrap();
    let class = classes
        .create_class_template(&ClassTemplate::new("2024", "Grade 6B"))
        .unwrap();
    classes.link_teacher(class.id, teacher.id).unwrap();
    let subject = subjects
        .create_subject(&Subject::new(class.id, "English", "Grammar"))
        .unwrap();
    let own_result = results
        .create_result(&StudentResult::new(account.id, subject.id))
        .unwrap();
    let other_result = results
        .create_result(&StudentResult::new(other.id, subject.id))
        .unwrap();
    let comment = comments
        .create_comment(&Comment::new(account.id, "Good progress"))
        .unwrap();
    let ticket = tickets.create_ticket(&Ticket::new(account.id, "A1B2C")).unwrap();

    let summary = accounts.delete_account(account.id).unwrap();

    assert!(results.get_result(own_result.id).unwrap().is_none());
    assert!(results.get_result(other_result.id).unwrap().is_some());

    let teacher = teachers.get_teacher(teacher.id).unwrap().unwrap();
    assert_eq!(teacher.account_id, None);
    assert_eq!(classes.teachers_of(class.id).unwrap().len(), 1);

    let comment = comments.get_comment(comment.id).unwrap().unwrap();
    assert_eq!(comment.account_id, None);
    assert_eq!(comment.comment, "Good progress");

    let ticket = tickets.get_ticket(ticket.id).unwrap().unwrap();
    assert_eq!(ticket.used_by, None);

    assert_eq!(summary.deleted_in("accounts"), 1);
    assert_eq!(summary.deleted_in("results"), 1);
    assert_eq!(summary.cleared_in("teachers"), 1);
    assert_eq!(summary.cleared_in("comments"), 1);
    assert_eq!(summary.cleared_in("tickets"), 1);
    assert_eq!(summary.total_deleted(), 2);
    assert_eq!(summary.total_cleared(), 3);
}

#[test]
fn deleting_teacher_drops_only_its_class_links() {
    let conn = open_db_in_memory().unwrap();
    let accounts = SqliteAccountRepository::try_new(&conn).unwrap();
    let teachers = SqliteTeacherRepository::try_new(&conn).unwrap();
    let classes = SqliteClassTemplateRepository::try_new(&conn).unwrap();

    let account = accounts.create_account(&Account::new("Dayo")).unwrap();
    let teacher = teachers.create_teacher(&Teacher::new(account.id)).unwrap();
    let class_a = classes
        .create_class_template(&ClassTemplate::new("2024", "Grade 1A"))
        .unwrap();
    let class_b = classes
        .create_class_template(&ClassTemplate::new("2024", "Grade 1B"))
        .unwrap();
    classes.link_teacher(class_a.id, teacher.id).unwrap();
    classes.link_teacher(class_b.id, teacher.id).unwrap();

    let summary = teachers.delete_teacher(teacher.id).unwrap();
    assert_eq!(summary.deleted_in("class_template_teachers"), 2);

    assert!(classes.get_class_template(class_a.id).unwrap().is_some());
    assert!(classes.teachers_of(class_a.id).unwrap().is_empty());
    assert!(classes.teachers_of(class_b.id).unwrap().is_empty());
    assert!(accounts.find_account(account.id).unwrap().is_some());
}

#[test]
fn deleting_missing_record_is_not_found_and_touches_nothing() {
    let conn = open_db_in_memory().unwrap();
    let classes = SqliteClassTemplateRepository::try_new(&conn).unwrap();
    classes
        .create_class_template(&ClassTemplate::new("2024", "Grade 2A"))
        .unwrap();

    let missing = Uuid::new_v4();
    let err = classes.delete_class_template(missing).unwrap_err();
    match err {
        RepoError::NotFound { entity, id } => {
            assert_eq!(entity, "class_template");
            assert_eq!(id, missing);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(classes.list_class_templates(None).unwrap().len(), 1);
}

#[test]
fn references_to_missing_records_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    let subjects = SqliteSubjectRepository::try_new(&conn).unwrap();

    let err = subjects
        .create_subject(&Subject::new(Uuid::new_v4(), "Math", "Algebra"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "class_template",
            ..
        }
    ));
}

#[test]
fn raw_writes_with_dangling_references_are_integrity_errors() {
    let conn = open_db_in_memory().unwrap();
    let err: RepoError = conn
        .execute(
            "INSERT INTO terms (id, term, class_template_id) VALUES ('t1', 'F', 'nope');",
            [],
        )
        .unwrap_err()
        .into();
    assert!(matches!(err, RepoError::Integrity(_)));
}
