//! Student result repository contracts and SQLite implementation.

use crate::db::relations::DeleteSummary;
use crate::model::account::AccountId;
use crate::model::class_template::SubjectId;
use crate::model::student_result::{StudentResult, StudentResultId};
use crate::repo::{
    delete_record, ensure_connection_ready, ensure_exists, ensure_reference, parse_optional_uuid,
    parse_uuid, write_immediate, RepoError, RepoResult, TableShape,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TABLE: &str = "results";
const ENTITY: &str = "result";

const RESULT_SELECT_SQL: &str = "SELECT
    id,
    account_id,
    subject_id,
    test,
    exam,
    created_at,
    updated_at
FROM results";

const SHAPES: &[TableShape] = &[(
    TABLE,
    &[
        "id",
        "account_id",
        "subject_id",
        "test",
        "exam",
        "created_at",
        "updated_at",
    ],
)];

/// Filters for listing results. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultListQuery {
    pub account_id: Option<AccountId>,
    pub subject_id: Option<SubjectId>,
    /// Only results whose subject has been removed.
    pub orphaned_only: bool,
}

pub trait StudentResultRepository {
    fn create_result(&self, result: &StudentResult) -> RepoResult<StudentResult>;
    fn update_result(&self, result: &StudentResult) -> RepoResult<()>;
    fn get_result(&self, id: StudentResultId) -> RepoResult<Option<StudentResult>>;
    fn list_results(&self, query: &ResultListQuery) -> RepoResult<Vec<StudentResult>>;
    fn delete_result(&self, id: StudentResultId) -> RepoResult<DeleteSummary>;
}

pub struct SqliteStudentResultRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentResultRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, SHAPES)?;
        Ok(Self { conn })
    }
}

fn ensure_references(conn: &Connection, result: &StudentResult) -> RepoResult<()> {
    ensure_reference(conn, "accounts", "account", result.account_id)?;
    ensure_reference(conn, "subjects", "subject", result.subject_id)
}

impl StudentResultRepository for SqliteStudentResultRepository<'_> {
    fn create_result(&self, result: &StudentResult) -> RepoResult<StudentResult> {
        result.validate()?;
        write_immediate(self.conn, |conn| {
            ensure_references(conn, result)?;
            conn.execute(
                "INSERT INTO results (id, account_id, subject_id, test, exam)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    result.id.to_string(),
                    result.account_id.map(|id| id.to_string()),
                    result.subject_id.map(|id| id.to_string()),
                    result.test,
                    result.exam,
                ],
            )?;
            Ok(())
        })?;
        self.get_result(result.id)?.ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: result.id,
        })
    }

    fn update_result(&self, result: &StudentResult) -> RepoResult<()> {
        result.validate()?;
        write_immediate(self.conn, |conn| {
            ensure_exists(conn, TABLE, ENTITY, result.id)?;
            ensure_references(conn, result)?;
            conn.execute(
                "UPDATE results
                 SET account_id = ?2,
                     subject_id = ?3,
                     test = ?4,
                     exam = ?5,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    result.id.to_string(),
                    result.account_id.map(|id| id.to_string()),
                    result.subject_id.map(|id| id.to_string()),
                    result.test,
                    result.exam,
                ],
            )?;
            Ok(())
        })
    }

    fn get_result(&self, id: StudentResultId) -> RepoResult<Option<StudentResult>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RESULT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_result_row(row)?));
        }
        Ok(None)
    }

    fn list_results(&self, query: &ResultListQuery) -> RepoResult<Vec<StudentResult>> {
        let mut sql = format!("{RESULT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(account_id) = query.account_id {
            sql.push_str(" AND account_id = ?");
            bind_values.push(Value::Text(account_id.to_string()));
        }
        if let Some(subject_id) = query.subject_id {
            sql.push_str(" AND subject_id = ?");
            bind_values.push(Value::Text(subject_id.to_string()));
        }
        if query.orphaned_only {
            sql.push_str(" AND subject_id IS NULL");
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            results.push(parse_result_row(row)?);
        }
        Ok(results)
    }

    fn delete_result(&self, id: StudentResultId) -> RepoResult<DeleteSummary> {
        delete_record(self.conn, TABLE, ENTITY, id)
    }
}

fn parse_result_row(row: &Row<'_>) -> RepoResult<StudentResult> {
    let id_text: String = row.get("id")?;
    Ok(StudentResult {
        id: parse_uuid(&id_text, "results.id")?,
        account_id: parse_optional_uuid(row.get("account_id")?, "results.account_id")?,
        subject_id: parse_optional_uuid(row.get("subject_id")?, "results.subject_id")?,
        test: row.get("test")?,
        exam: row.get("exam")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
