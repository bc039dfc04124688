//! Subject repository contracts and SQLite implementation.

use crate::db::relations::DeleteSummary;
use crate::model::class_template::{ClassTemplateId, Subject, SubjectId};
use crate::repo::{
    delete_record, ensure_connection_ready, ensure_exists, ensure_reference, parse_optional_uuid,
    parse_uuid, write_immediate, RepoError, RepoResult, TableShape,
};
use rusqlite::{params, Connection, Row};

const TABLE: &str = "subjects";
const ENTITY: &str = "subject";

const SUBJECT_SELECT_SQL: &str = "SELECT
    id,
    class_template_id,
    name,
    description,
    created_at,
    updated_at
FROM subjects";

const SHAPES: &[TableShape] = &[(
    TABLE,
    &[
        "id",
        "class_template_id",
        "name",
        "description",
        "created_at",
        "updated_at",
    ],
)];

pub trait SubjectRepository {
    fn create_subject(&self, subject: &Subject) -> RepoResult<Subject>;
    fn update_subject(&self, subject: &Subject) -> RepoResult<()>;
    fn get_subject(&self, id: SubjectId) -> RepoResult<Option<Subject>>;
    /// Subjects of one class, or every subject when `class_id` is `None`.
    fn list_subjects(&self, class_id: Option<ClassTemplateId>) -> RepoResult<Vec<Subject>>;
    /// Deletes the subject; results keep existing with `subject_id = None`.
    fn delete_subject(&self, id: SubjectId) -> RepoResult<DeleteSummary>;
}

pub struct SqliteSubjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubjectRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, SHAPES)?;
        Ok(Self { conn })
    }
}

impl SubjectRepository for SqliteSubjectRepository<'_> {
    fn create_subject(&self, subject: &Subject) -> RepoResult<Subject> {
        subject.validate()?;
        write_immediate(self.conn, |conn| {
            ensure_reference(
                conn,
                "class_templates",
                "class_template",
                subject.class_template_id,
            )?;
            conn.execute(
                "INSERT INTO subjects (id, class_template_id, name, description)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    subject.id.to_string(),
                    subject.class_template_id.map(|id| id.to_string()),
                    subject.name.as_str(),
                    subject.description.as_str(),
                ],
            )?;
            Ok(())
        })?;
        self.get_subject(subject.id)?.ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: subject.id,
        })
    }

    fn update_subject(&self, subject: &Subject) -> RepoResult<()> {
        subject.validate()?;
        write_immediate(self.conn, |conn| {
            ensure_exists(conn, TABLE, ENTITY, subject.id)?;
            ensure_reference(
                conn,
                "class_templates",
                "class_template",
                subject.class_template_id,
            )?;
            conn.execute(
                "UPDATE subjects
                 SET class_template_id = ?2,
                     name = ?3,
                     description = ?4,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    subject.id.to_string(),
                    subject.class_template_id.map(|id| id.to_string()),
                    subject.name.as_str(),
                    subject.description.as_str(),
                ],
            )?;
            Ok(())
        })
    }

    fn get_subject(&self, id: SubjectId) -> RepoResult<Option<Subject>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUBJECT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_subject_row(row)?));
        }
        Ok(None)
    }

    fn list_subjects(&self, class_id: Option<ClassTemplateId>) -> RepoResult<Vec<Subject>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUBJECT_SELECT_SQL}
             WHERE (?1 IS NULL OR class_template_id = ?1)
             ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([class_id.map(|id| id.to_string())])?;
        let mut subjects = Vec::new();
        while let Some(row) = rows.next()? {
            subjects.push(parse_subject_row(row)?);
        }
        Ok(subjects)
    }

    fn delete_subject(&self, id: SubjectId) -> RepoResult<DeleteSummary> {
        delete_record(self.conn, TABLE, ENTITY, id)
    }
}

fn parse_subject_row(row: &Row<'_>) -> RepoResult<Subject> {
    let id_text: String = row.get("id")?;
    Ok(Subject {
        id: parse_uuid(&id_text, "subjects.id")?,
        class_template_id: parse_optional_uuid(
            row.get("class_template_id")?,
            "subjects.class_template_id",
        )?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
