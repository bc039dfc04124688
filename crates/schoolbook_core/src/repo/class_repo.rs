//! Class template repository and the class <-> teacher association.
//!
//! # Invariants
//! - Linking is idempotent; linking a missing class or teacher is `NotFound`.
//! - Unlinking an association that does not exist is a no-op.
//! - Association reads return sets; insertion order is not kept.

use crate::db::relations::DeleteSummary;
use crate::model::class_template::{ClassTemplate, ClassTemplateId};
use crate::model::teacher::TeacherId;
use crate::repo::{
    delete_record, ensure_connection_ready, ensure_exists, parse_uuid, query_id_set,
    write_immediate, RepoError, RepoResult, TableShape,
};
use log::debug;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;

const TABLE: &str = "class_templates";
const ENTITY: &str = "class_template";

const CLASS_TEMPLATE_SELECT_SQL: &str = "SELECT
    id,
    session,
    name,
    created_at,
    updated_at
FROM class_templates";

const SHAPES: &[TableShape] = &[
    (
        TABLE,
        &["id", "session", "name", "created_at", "updated_at"],
    ),
    ("class_template_teachers", &["class_template_id", "teacher_id"]),
];

pub trait ClassTemplateRepository {
    fn create_class_template(&self, class: &ClassTemplate) -> RepoResult<ClassTemplate>;
    fn update_class_template(&self, class: &ClassTemplate) -> RepoResult<()>;
    fn get_class_template(&self, id: ClassTemplateId) -> RepoResult<Option<ClassTemplate>>;
    /// Lists classes, optionally restricted to one session.
    fn list_class_templates(&self, session: Option<&str>) -> RepoResult<Vec<ClassTemplate>>;
    /// Deletes the class: terms cascade, subjects and profiles are cleared.
    fn delete_class_template(&self, id: ClassTemplateId) -> RepoResult<DeleteSummary>;
    fn link_teacher(&self, class_id: ClassTemplateId, teacher_id: TeacherId) -> RepoResult<()>;
    fn unlink_teacher(&self, class_id: ClassTemplateId, teacher_id: TeacherId) -> RepoResult<()>;
    fn teachers_of(&self, class_id: ClassTemplateId) -> RepoResult<BTreeSet<TeacherId>>;
    fn classes_of(&self, teacher_id: TeacherId) -> RepoResult<BTreeSet<ClassTemplateId>>;
}

pub struct SqliteClassTemplateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClassTemplateRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, SHAPES)?;
        Ok(Self { conn })
    }
}

impl ClassTemplateRepository for SqliteClassTemplateRepository<'_> {
    fn create_class_template(&self, class: &ClassTemplate) -> RepoResult<ClassTemplate> {
        class.validate()?;
        self.conn.execute(
            "INSERT INTO class_templates (id, session, name) VALUES (?1, ?2, ?3);",
            params![
                class.id.to_string(),
                class.session.as_str(),
                class.name.as_str()
            ],
        )?;
        self.get_class_template(class.id)?
            .ok_or(RepoError::NotFound {
                entity: ENTITY,
                id: class.id,
            })
    }

    fn update_class_template(&self, class: &ClassTemplate) -> RepoResult<()> {
        class.validate()?;
        let changed = self.conn.execute(
            "UPDATE class_templates
             SET session = ?2,
                 name = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                class.id.to_string(),
                class.session.as_str(),
                class.name.as_str()
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: ENTITY,
                id: class.id,
            });
        }
        Ok(())
    }

    fn get_class_template(&self, id: ClassTemplateId) -> RepoResult<Option<ClassTemplate>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CLASS_TEMPLATE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_class_template_row(row)?));
        }
        Ok(None)
    }

    fn list_class_templates(&self, session: Option<&str>) -> RepoResult<Vec<ClassTemplate>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CLASS_TEMPLATE_SELECT_SQL}
             WHERE (?1 IS NULL OR session = ?1)
             ORDER BY session ASC, name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([session])?;
        let mut classes = Vec::new();
        while let Some(row) = rows.next()? {
            classes.push(parse_class_template_row(row)?);
        }
        Ok(classes)
    }

    fn delete_class_template(&self, id: ClassTemplateId) -> RepoResult<DeleteSummary> {
        delete_record(self.conn, TABLE, ENTITY, id)
    }

    fn link_teacher(&self, class_id: ClassTemplateId, teacher_id: TeacherId) -> RepoResult<()> {
        let inserted = write_immediate(self.conn, |conn| {
            ensure_exists(conn, TABLE, ENTITY, class_id)?;
            ensure_exists(conn, "teachers", "teacher", teacher_id)?;
            Ok(conn.execute(
                "INSERT OR IGNORE INTO class_template_teachers (class_template_id, teacher_id)
                 VALUES (?1, ?2);",
                params![class_id.to_string(), teacher_id.to_string()],
            )?)
        })?;
        debug!(
            "event=association_link module=repo table=class_template_teachers inserted={inserted}"
        );
        Ok(())
    }

    fn unlink_teacher(&self, class_id: ClassTemplateId, teacher_id: TeacherId) -> RepoResult<()> {
        let removed = write_immediate(self.conn, |conn| {
            Ok(conn.execute(
                "DELETE FROM class_template_teachers
                 WHERE class_template_id = ?1
                   AND teacher_id = ?2;",
                params![class_id.to_string(), teacher_id.to_string()],
            )?)
        })?;
        debug!(
            "event=association_unlink module=repo table=class_template_teachers removed={removed}"
        );
        Ok(())
    }

    fn teachers_of(&self, class_id: ClassTemplateId) -> RepoResult<BTreeSet<TeacherId>> {
        ensure_exists(self.conn, TABLE, ENTITY, class_id)?;
        query_id_set(
            self.conn,
            "SELECT teacher_id
             FROM class_template_teachers
             WHERE class_template_id = ?1;",
            class_id,
            "class_template_teachers.teacher_id",
        )
    }

    fn classes_of(&self, teacher_id: TeacherId) -> RepoResult<BTreeSet<ClassTemplateId>> {
        ensure_exists(self.conn, "teachers", "teacher", teacher_id)?;
        query_id_set(
            self.conn,
            "SELECT class_template_id
             FROM class_template_teachers
             WHERE teacher_id = ?1;",
            teacher_id,
            "class_template_teachers.class_template_id",
        )
    }
}

fn parse_class_template_row(row: &Row<'_>) -> RepoResult<ClassTemplate> {
    let id_text: String = row.get("id")?;
    Ok(ClassTemplate {
        id: parse_uuid(&id_text, "class_templates.id")?,
        session: row.get("session")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
