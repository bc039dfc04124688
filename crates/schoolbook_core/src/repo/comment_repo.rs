//! Comment repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `comments.comment` is write-once. `update_comment` only writes the
//!   author; a record carrying different text is rejected as `Integrity`,
//!   and the storage trigger rejects raw changes the same way.

use crate::db::relations::DeleteSummary;
use crate::model::account::AccountId;
use crate::model::comment::{Comment, CommentId};
use crate::repo::{
    delete_record, ensure_connection_ready, ensure_reference, parse_optional_uuid, parse_uuid,
    write_immediate, RepoError, RepoResult, TableShape,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TABLE: &str = "comments";
const ENTITY: &str = "comment";
const WRITE_ONCE_MESSAGE: &str = "comments.comment is write-once";

const COMMENT_SELECT_SQL: &str = "SELECT
    id,
    account_id,
    comment,
    created_at,
    updated_at
FROM comments";

const SHAPES: &[TableShape] = &[(
    TABLE,
    &["id", "account_id", "comment", "created_at", "updated_at"],
)];

pub trait CommentRepository {
    fn create_comment(&self, comment: &Comment) -> RepoResult<Comment>;
    fn update_comment(&self, comment: &Comment) -> RepoResult<()>;
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    /// Comments written by one account, or all comments.
    fn list_comments(&self, account_id: Option<AccountId>) -> RepoResult<Vec<Comment>>;
    /// Deletes the comment and drops it from every communication book.
    fn delete_comment(&self, id: CommentId) -> RepoResult<DeleteSummary>;
}

pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, SHAPES)?;
        Ok(Self { conn })
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create_comment(&self, comment: &Comment) -> RepoResult<Comment> {
        comment.validate()?;
        write_immediate(self.conn, |conn| {
            ensure_reference(conn, "accounts", "account", comment.account_id)?;
            conn.execute(
                "INSERT INTO comments (id, account_id, comment) VALUES (?1, ?2, ?3);",
                params![
                    comment.id.to_string(),
                    comment.account_id.map(|id| id.to_string()),
                    comment.comment.as_str(),
                ],
            )?;
            Ok(())
        })?;
        self.get_comment(comment.id)?.ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: comment.id,
        })
    }

    fn update_comment(&self, comment: &Comment) -> RepoResult<()> {
        comment.validate()?;
        write_immediate(self.conn, |conn| {
            let stored: Option<String> = conn
                .query_row(
                    "SELECT comment FROM comments WHERE id = ?1;",
                    [comment.id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(stored) = stored else {
                return Err(RepoError::NotFound {
                    entity: ENTITY,
                    id: comment.id,
                });
            };
            if stored != comment.comment {
                return Err(RepoError::Integrity(WRITE_ONCE_MESSAGE.to_string()));
            }

            ensure_reference(conn, "accounts", "account", comment.account_id)?;
            conn.execute(
                "UPDATE comments
                 SET account_id = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    comment.id.to_string(),
                    comment.account_id.map(|id| id.to_string()),
                ],
            )?;
            Ok(())
        })
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_comment_row(row)?));
        }
        Ok(None)
    }

    fn list_comments(&self, account_id: Option<AccountId>) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE (?1 IS NULL OR account_id = ?1)
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([account_id.map(|id| id.to_string())])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }

    fn delete_comment(&self, id: CommentId) -> RepoResult<DeleteSummary> {
        delete_record(self.conn, TABLE, ENTITY, id)
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let id_text: String = row.get("id")?;
    Ok(Comment {
        id: parse_uuid(&id_text, "comments.id")?,
        account_id: parse_optional_uuid(row.get("account_id")?, "comments.account_id")?,
        comment: row.get("comment")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
