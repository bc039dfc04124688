//! Repository layer: one contract plus SQLite implementation per record.
//!
//! # Responsibility
//! - Validate records before every write.
//! - Translate storage failures into semantic errors (`NotFound`,
//!   `Integrity`) that the presentation layer can report per field.
//! - Run checked writes and deletes inside one immediate transaction and
//!   report the effect of deletes.
//!
//! # Invariants
//! - Repositories only accept connections migrated to `latest_version()`.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Referential actions are executed by SQLite foreign keys.

use crate::db::migrations::latest_version;
use crate::db::relations::{plan_delete, DeleteSummary};
use crate::db::DbError;
use crate::model::validation::ValidationError;
use log::info;
use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod account_repo;
pub mod book_repo;
pub mod class_repo;
pub mod comment_repo;
pub mod profile_repo;
pub mod result_repo;
pub mod subject_repo;
pub mod teacher_repo;
pub mod term_repo;
pub mod ticket_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors surfaced by every schoolbook repository.
#[derive(Debug)]
pub enum RepoError {
    /// Field value violates a length, blank, enum, URL or required rule.
    Validation(ValidationError),
    /// Target or referenced record does not exist.
    NotFound { entity: &'static str, id: Uuid },
    /// Storage rejected the write: uniqueness, foreign key, check or
    /// write-once trigger. Carries SQLite's constraint message.
    Integrity(String),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Integrity(message) => write!(f, "integrity violation: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Self::Integrity(message.unwrap_or_else(|| failure.to_string()))
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// Table name plus the columns a repository reads or writes.
pub(crate) type TableShape = (&'static str, &'static [&'static str]);

pub(crate) fn ensure_connection_ready(conn: &Connection, shapes: &[TableShape]) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in shapes {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    column: &'static str,
) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

pub(crate) fn row_exists(conn: &Connection, table: &'static str, id: Uuid) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Fails with `NotFound` naming `entity` when `id` is absent from `table`.
pub(crate) fn ensure_exists(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: Uuid,
) -> RepoResult<()> {
    if row_exists(conn, table, id)? {
        Ok(())
    } else {
        Err(RepoError::NotFound { entity, id })
    }
}

/// Same as `ensure_exists`, skipping references that are not set.
pub(crate) fn ensure_reference(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: Option<Uuid>,
) -> RepoResult<()> {
    match id {
        Some(id) => ensure_exists(conn, table, entity, id),
        None => Ok(()),
    }
}

/// Runs a single-column id query and collects the result as a set.
pub(crate) fn query_id_set(
    conn: &Connection,
    sql: &str,
    param: Uuid,
    column: &'static str,
) -> RepoResult<BTreeSet<Uuid>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([param.to_string()])?;
    let mut ids = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.insert(parse_uuid(&value, column)?);
    }
    Ok(ids)
}

/// Runs `write` inside one immediate transaction.
///
/// Existence checks and the statements that depend on them see the same
/// snapshot; an error from `write` rolls everything back.
pub(crate) fn write_immediate<T>(
    conn: &Connection,
    write: impl FnOnce(&Connection) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = write(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Deletes one row and lets SQLite apply the declared referential actions.
///
/// # Errors
/// - `NotFound` when `id` does not exist; nothing is touched.
pub(crate) fn delete_record(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: Uuid,
) -> RepoResult<DeleteSummary> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    ensure_exists(&tx, table, entity, id)?;

    let summary = plan_delete(&tx, table, &id.to_string())?;
    tx.execute(
        &format!("DELETE FROM {table} WHERE id = ?1;"),
        [id.to_string()],
    )?;
    tx.commit()?;

    info!(
        "event=record_delete module=repo status=ok table={table} deleted={} cleared={}",
        summary.total_deleted(),
        summary.total_cleared()
    );
    Ok(summary)
}
