//! Term repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `terms.term` stores one-letter codes; unknown codes are `InvalidData`
//!   on read and `Integrity` on raw writes (CHECK constraint).

use crate::db::relations::DeleteSummary;
use crate::model::class_template::{ClassTemplateId, Term, TermId, TermKind};
use crate::repo::{
    delete_record, ensure_connection_ready, ensure_exists, parse_uuid, write_immediate, RepoError,
    RepoResult, TableShape,
};
use rusqlite::{params, Connection, Row};

const TABLE: &str = "terms";
const ENTITY: &str = "term";

const TERM_SELECT_SQL: &str = "SELECT
    id,
    term,
    class_template_id,
    created_at,
    updated_at
FROM terms";

const SHAPES: &[TableShape] = &[(
    TABLE,
    &["id", "term", "class_template_id", "created_at", "updated_at"],
)];

pub trait TermRepository {
    fn create_term(&self, term: &Term) -> RepoResult<Term>;
    fn update_term(&self, term: &Term) -> RepoResult<()>;
    fn get_term(&self, id: TermId) -> RepoResult<Option<Term>>;
    fn list_terms(&self, class_id: ClassTemplateId) -> RepoResult<Vec<Term>>;
    fn delete_term(&self, id: TermId) -> RepoResult<DeleteSummary>;
}

pub struct SqliteTermRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTermRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, SHAPES)?;
        Ok(Self { conn })
    }
}

impl TermRepository for SqliteTermRepository<'_> {
    fn create_term(&self, term: &Term) -> RepoResult<Term> {
        write_immediate(self.conn, |conn| {
            ensure_exists(
                conn,
                "class_templates",
                "class_template",
                term.class_template_id,
            )?;
            conn.execute(
                "INSERT INTO terms (id, term, class_template_id) VALUES (?1, ?2, ?3);",
                params![
                    term.id.to_string(),
                    term.term.code(),
                    term.class_template_id.to_string(),
                ],
            )?;
            Ok(())
        })?;
        self.get_term(term.id)?.ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: term.id,
        })
    }

    fn update_term(&self, term: &Term) -> RepoResult<()> {
        write_immediate(self.conn, |conn| {
            ensure_exists(conn, TABLE, ENTITY, term.id)?;
            ensure_exists(
                conn,
                "class_templates",
                "class_template",
                term.class_template_id,
            )?;
            conn.execute(
                "UPDATE terms
                 SET term = ?2,
                     class_template_id = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    term.id.to_string(),
                    term.term.code(),
                    term.class_template_id.to_string(),
                ],
            )?;
            Ok(())
        })
    }

    fn get_term(&self, id: TermId) -> RepoResult<Option<Term>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TERM_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_term_row(row)?));
        }
        Ok(None)
    }

    fn list_terms(&self, class_id: ClassTemplateId) -> RepoResult<Vec<Term>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TERM_SELECT_SQL}
             WHERE class_template_id = ?1
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([class_id.to_string()])?;
        let mut terms = Vec::new();
        while let Some(row) = rows.next()? {
            terms.push(parse_term_row(row)?);
        }
        Ok(terms)
    }

    fn delete_term(&self, id: TermId) -> RepoResult<DeleteSummary> {
        delete_record(self.conn, TABLE, ENTITY, id)
    }
}

fn parse_term_row(row: &Row<'_>) -> RepoResult<Term> {
    let id_text: String = row.get("id")?;
    let code: String = row.get("term")?;
    let term = TermKind::from_code(&code).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid term code `{code}` in terms.term"))
    })?;
    let class_text: String = row.get("class_template_id")?;

    Ok(Term {
        id: parse_uuid(&id_text, "terms.id")?,
        term,
        class_template_id: parse_uuid(&class_text, "terms.class_template_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
