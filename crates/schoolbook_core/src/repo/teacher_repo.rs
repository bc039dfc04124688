//! Teacher repository contracts and SQLite implementation.

use crate::db::relations::DeleteSummary;
use crate::model::account::AccountId;
use crate::model::teacher::{Teacher, TeacherId};
use crate::repo::{
    delete_record, ensure_connection_ready, ensure_exists, ensure_reference, parse_optional_uuid,
    parse_uuid, write_immediate, RepoError, RepoResult, TableShape,
};
use rusqlite::{params, Connection, Row};

const TABLE: &str = "teachers";
const ENTITY: &str = "teacher";

const TEACHER_SELECT_SQL: &str = "SELECT
    id,
    account_id,
    created_at,
    updated_at
FROM teachers";

const SHAPES: &[TableShape] = &[(TABLE, &["id", "account_id", "created_at", "updated_at"])];

pub trait TeacherRepository {
    fn create_teacher(&self, teacher: &Teacher) -> RepoResult<Teacher>;
    fn update_teacher(&self, teacher: &Teacher) -> RepoResult<()>;
    fn get_teacher(&self, id: TeacherId) -> RepoResult<Option<Teacher>>;
    /// Lists teachers, optionally only those bound to one account.
    fn list_teachers(&self, account_id: Option<AccountId>) -> RepoResult<Vec<Teacher>>;
    fn delete_teacher(&self, id: TeacherId) -> RepoResult<DeleteSummary>;
}

pub struct SqliteTeacherRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTeacherRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, SHAPES)?;
        Ok(Self { conn })
    }
}

impl TeacherRepository for SqliteTeacherRepository<'_> {
    fn create_teacher(&self, teacher: &Teacher) -> RepoResult<Teacher> {
        teacher.validate()?;
        write_immediate(self.conn, |conn| {
            ensure_reference(conn, "accounts", "account", teacher.account_id)?;
            conn.execute(
                "INSERT INTO teachers (id, account_id) VALUES (?1, ?2);",
                params![
                    teacher.id.to_string(),
                    teacher.account_id.map(|id| id.to_string()),
                ],
            )?;
            Ok(())
        })?;
        self.get_teacher(teacher.id)?.ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: teacher.id,
        })
    }

    fn update_teacher(&self, teacher: &Teacher) -> RepoResult<()> {
        teacher.validate()?;
        write_immediate(self.conn, |conn| {
            ensure_exists(conn, TABLE, ENTITY, teacher.id)?;
            ensure_reference(conn, "accounts", "account", teacher.account_id)?;
            conn.execute(
                "UPDATE teachers
                 SET account_id = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    teacher.id.to_string(),
                    teacher.account_id.map(|id| id.to_string()),
                ],
            )?;
            Ok(())
        })
    }

    fn get_teacher(&self, id: TeacherId) -> RepoResult<Option<Teacher>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEACHER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_teacher_row(row)?));
        }
        Ok(None)
    }

    fn list_teachers(&self, account_id: Option<AccountId>) -> RepoResult<Vec<Teacher>> {
        let mut teachers = Vec::new();
        match account_id {
            Some(account_id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{TEACHER_SELECT_SQL} WHERE account_id = ?1 ORDER BY created_at ASC, id ASC;"
                ))?;
                let mut rows = stmt.query([account_id.to_string()])?;
                while let Some(row) = rows.next()? {
                    teachers.push(parse_teacher_row(row)?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "{TEACHER_SELECT_SQL} ORDER BY created_at ASC, id ASC;"
                ))?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    teachers.push(parse_teacher_row(row)?);
                }
            }
        }
        Ok(teachers)
    }

    fn delete_teacher(&self, id: TeacherId) -> RepoResult<DeleteSummary> {
        delete_record(self.conn, TABLE, ENTITY, id)
    }
}

fn parse_teacher_row(row: &Row<'_>) -> RepoResult<Teacher> {
    let id_text: String = row.get("id")?;
    Ok(Teacher {
        id: parse_uuid(&id_text, "teachers.id")?,
        account_id: parse_optional_uuid(row.get("account_id")?, "teachers.account_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
