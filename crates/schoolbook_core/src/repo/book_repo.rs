//! Communication book repository: the book row plus its two member sets.
//!
//! # Responsibility
//! - Create a book together with its students and comments atomically.
//! - Add/remove single members idempotently.
//!
//! # Invariants
//! - Removing a student account or comment elsewhere only drops the join
//!   row; the book and the other members survive.
//! - Member sets carry no order.

use crate::db::relations::DeleteSummary;
use crate::model::account::AccountId;
use crate::model::comment::{CommentId, CommunicationBook, CommunicationBookId};
use crate::repo::{
    delete_record, ensure_connection_ready, ensure_exists, parse_uuid, query_id_set,
    write_immediate, RepoError, RepoResult, TableShape,
};
use log::debug;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use uuid::Uuid;

const TABLE: &str = "communication_books";
const ENTITY: &str = "communication_book";

const SHAPES: &[TableShape] = &[
    (TABLE, &["id", "created_at", "updated_at"]),
    ("communication_book_students", &["book_id", "account_id"]),
    ("communication_book_comments", &["book_id", "comment_id"]),
];

pub trait CommunicationBookRepository {
    fn create_book(&self, book: &CommunicationBook) -> RepoResult<CommunicationBook>;
    fn get_book(&self, id: CommunicationBookId) -> RepoResult<Option<CommunicationBook>>;
    fn list_books(&self) -> RepoResult<Vec<CommunicationBook>>;
    /// Books in which `account_id` is one of the students.
    fn books_for_student(&self, account_id: AccountId) -> RepoResult<Vec<CommunicationBook>>;
    fn delete_book(&self, id: CommunicationBookId) -> RepoResult<DeleteSummary>;
    fn add_student(&self, book_id: CommunicationBookId, account_id: AccountId) -> RepoResult<()>;
    fn remove_student(&self, book_id: CommunicationBookId, account_id: AccountId)
        -> RepoResult<()>;
    fn add_comment(&self, book_id: CommunicationBookId, comment_id: CommentId) -> RepoResult<()>;
    fn remove_comment(&self, book_id: CommunicationBookId, comment_id: CommentId)
        -> RepoResult<()>;
}

pub struct SqliteCommunicationBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommunicationBookRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, SHAPES)?;
        Ok(Self { conn })
    }
}

impl CommunicationBookRepository for SqliteCommunicationBookRepository<'_> {
    fn create_book(&self, book: &CommunicationBook) -> RepoResult<CommunicationBook> {
        book.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for account_id in &book.students {
            ensure_exists(&tx, "accounts", "account", *account_id)?;
        }
        for comment_id in &book.comments {
            ensure_exists(&tx, "comments", "comment", *comment_id)?;
        }

        tx.execute(
            "INSERT INTO communication_books (id) VALUES (?1);",
            [book.id.to_string()],
        )?;
        for account_id in &book.students {
            tx.execute(
                "INSERT INTO communication_book_students (book_id, account_id) VALUES (?1, ?2);",
                params![book.id.to_string(), account_id.to_string()],
            )?;
        }
        for comment_id in &book.comments {
            tx.execute(
                "INSERT INTO communication_book_comments (book_id, comment_id) VALUES (?1, ?2);",
                params![book.id.to_string(), comment_id.to_string()],
            )?;
        }
        tx.commit()?;

        self.get_book(book.id)?.ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: book.id,
        })
    }

    fn get_book(&self, id: CommunicationBookId) -> RepoResult<Option<CommunicationBook>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, updated_at
             FROM communication_books
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => {
                let created_at: i64 = row.get("created_at")?;
                let updated_at: i64 = row.get("updated_at")?;
                Ok(Some(load_book(self.conn, id, created_at, updated_at)?))
            }
            None => Ok(None),
        }
    }

    fn list_books(&self) -> RepoResult<Vec<CommunicationBook>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, updated_at
             FROM communication_books
             ORDER BY created_at ASC, id ASC;",
        )?;
        collect_books(self.conn, &mut stmt, None)
    }

    fn books_for_student(&self, account_id: AccountId) -> RepoResult<Vec<CommunicationBook>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.id AS id, b.created_at AS created_at, b.updated_at AS updated_at
             FROM communication_books b
             INNER JOIN communication_book_students s ON s.book_id = b.id
             WHERE s.account_id = ?1
             ORDER BY b.created_at ASC, b.id ASC;",
        )?;
        collect_books(self.conn, &mut stmt, Some(account_id))
    }

    fn delete_book(&self, id: CommunicationBookId) -> RepoResult<DeleteSummary> {
        delete_record(self.conn, TABLE, ENTITY, id)
    }

    fn add_student(&self, book_id: CommunicationBookId, account_id: AccountId) -> RepoResult<()> {
        let inserted = write_immediate(self.conn, |conn| {
            ensure_exists(conn, TABLE, ENTITY, book_id)?;
            ensure_exists(conn, "accounts", "account", account_id)?;
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO communication_book_students (book_id, account_id)
                 VALUES (?1, ?2);",
                params![book_id.to_string(), account_id.to_string()],
            )?;
            touch_if_changed(conn, book_id, inserted)?;
            Ok(inserted)
        })?;
        debug!("event=association_link module=repo table=communication_book_students inserted={inserted}");
        Ok(())
    }

    fn remove_student(
        &self,
        book_id: CommunicationBookId,
        account_id: AccountId,
    ) -> RepoResult<()> {
        let removed = write_immediate(self.conn, |conn| {
            let removed = conn.execute(
                "DELETE FROM communication_book_students
                 WHERE book_id = ?1
                   AND account_id = ?2;",
                params![book_id.to_string(), account_id.to_string()],
            )?;
            touch_if_changed(conn, book_id, removed)?;
            Ok(removed)
        })?;
        debug!("event=association_unlink module=repo table=communication_book_students removed={removed}");
        Ok(())
    }

    fn add_comment(&self, book_id: CommunicationBookId, comment_id: CommentId) -> RepoResult<()> {
        let inserted = write_immediate(self.conn, |conn| {
            ensure_exists(conn, TABLE, ENTITY, book_id)?;
            ensure_exists(conn, "comments", "comment", comment_id)?;
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO communication_book_comments (book_id, comment_id)
                 VALUES (?1, ?2);",
                params![book_id.to_string(), comment_id.to_string()],
            )?;
            touch_if_changed(conn, book_id, inserted)?;
            Ok(inserted)
        })?;
        debug!("event=association_link module=repo table=communication_book_comments inserted={inserted}");
        Ok(())
    }

    fn remove_comment(
        &self,
        book_id: CommunicationBookId,
        comment_id: CommentId,
    ) -> RepoResult<()> {
        let removed = write_immediate(self.conn, |conn| {
            let removed = conn.execute(
                "DELETE FROM communication_book_comments
                 WHERE book_id = ?1
                   AND comment_id = ?2;",
                params![book_id.to_string(), comment_id.to_string()],
            )?;
            touch_if_changed(conn, book_id, removed)?;
            Ok(removed)
        })?;
        debug!("event=association_unlink module=repo table=communication_book_comments removed={removed}");
        Ok(())
    }
}

/// Bumps the book's `updated_at` when a member row was inserted or removed.
fn touch_if_changed(
    conn: &Connection,
    book_id: CommunicationBookId,
    changed: usize,
) -> RepoResult<()> {
    if changed > 0 {
        conn.execute(
            "UPDATE communication_books
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [book_id.to_string()],
        )?;
    }
    Ok(())
}

fn load_book(
    conn: &Connection,
    id: CommunicationBookId,
    created_at: i64,
    updated_at: i64,
) -> RepoResult<CommunicationBook> {
    let students = query_id_set(
        conn,
        "SELECT account_id FROM communication_book_students WHERE book_id = ?1;",
        id,
        "communication_book_students.account_id",
    )?;
    let comments = query_id_set(
        conn,
        "SELECT comment_id FROM communication_book_comments WHERE book_id = ?1;",
        id,
        "communication_book_comments.comment_id",
    )?;
    Ok(CommunicationBook {
        id,
        students,
        comments,
        created_at,
        updated_at,
    })
}

fn collect_books(
    conn: &Connection,
    stmt: &mut rusqlite::Statement<'_>,
    param: Option<Uuid>,
) -> RepoResult<Vec<CommunicationBook>> {
    let mut headers = Vec::new();
    {
        let mut rows = match param {
            Some(value) => stmt.query([value.to_string()])?,
            None => stmt.query([])?,
        };
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            headers.push((
                parse_uuid(&id_text, "communication_books.id")?,
                row.get::<_, i64>("created_at")?,
                row.get::<_, i64>("updated_at")?,
            ));
        }
    }

    headers
        .into_iter()
        .map(|(id, created_at, updated_at)| load_book(conn, id, created_at, updated_at))
        .collect()
}
