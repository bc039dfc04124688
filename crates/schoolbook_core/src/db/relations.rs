//! Foreign-key registry for the schoolbook schema.
//!
//! # Responsibility
//! - Declare every foreign key with its referential action.
//! - Compute what a delete will touch before SQLite applies the actions.
//!
//! # Invariants
//! - `RELATIONS` mirrors the `REFERENCES ... ON DELETE` clauses of the
//!   migrations exactly; `tests/schema_relations.rs` checks both directions.
//! - Every referenced column is `id`.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// What happens to a dependent row when the referenced row is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    /// Dependent keeps its identity; the reference becomes `NULL`.
    Clear,
    /// Dependent row is deleted as well.
    Cascade,
}

impl ReferentialAction {
    /// Spelling used by `PRAGMA foreign_key_list`.
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::Clear => "SET NULL",
            Self::Cascade => "CASCADE",
        }
    }
}

/// One foreign key: `table.column -> references.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub table: &'static str,
    pub column: &'static str,
    pub references: &'static str,
    pub action: ReferentialAction,
}

const fn clear(
    table: &'static str,
    column: &'static str,
    references: &'static str,
) -> Relation {
    Relation {
        table,
        column,
        references,
        action: ReferentialAction::Clear,
    }
}

const fn cascade(
    table: &'static str,
    column: &'static str,
    references: &'static str,
) -> Relation {
    Relation {
        table,
        column,
        references,
        action: ReferentialAction::Cascade,
    }
}

/// All tables owned by the schoolbook schema, in creation order.
pub const TABLES: &[&str] = &[
    "accounts",
    "teachers",
    "class_templates",
    "class_template_teachers",
    "subjects",
    "terms",
    "results",
    "comments",
    "tickets",
    "communication_books",
    "communication_book_students",
    "communication_book_comments",
    "profiles",
];

pub const RELATIONS: &[Relation] = &[
    clear("teachers", "account_id", "accounts"),
    cascade("class_template_teachers", "class_template_id", "class_templates"),
    cascade("class_template_teachers", "teacher_id", "teachers"),
    clear("subjects", "class_template_id", "class_templates"),
    cascade("terms", "class_template_id", "class_templates"),
    cascade("results", "account_id", "accounts"),
    clear("results", "subject_id", "subjects"),
    clear("comments", "account_id", "accounts"),
    clear("tickets", "used_by", "accounts"),
    cascade("communication_book_students", "book_id", "communication_books"),
    cascade("communication_book_students", "account_id", "accounts"),
    cascade("communication_book_comments", "book_id", "communication_books"),
    cascade("communication_book_comments", "comment_id", "comments"),
    cascade("profiles", "account_id", "accounts"),
    clear("profiles", "class_template_id", "class_templates"),
];

/// Relations whose referenced table is `table`.
pub fn relations_referencing(table: &str) -> impl Iterator<Item = &'static Relation> + '_ {
    RELATIONS
        .iter()
        .filter(move |relation| relation.references == table)
}

/// Per-table effect of one delete, including the root row itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    /// Rows removed, keyed by table.
    pub deleted: BTreeMap<&'static str, usize>,
    /// References set to `NULL`, keyed by dependent table.
    pub cleared: BTreeMap<&'static str, usize>,
}

impl DeleteSummary {
    /// Rows removed from `table`.
    pub fn deleted_in(&self, table: &str) -> usize {
        self.deleted.get(table).copied().unwrap_or(0)
    }

    /// References cleared in `table`.
    pub fn cleared_in(&self, table: &str) -> usize {
        self.cleared.get(table).copied().unwrap_or(0)
    }

    /// Rows removed across all tables.
    pub fn total_deleted(&self) -> usize {
        self.deleted.values().sum()
    }

    /// References cleared across all tables.
    pub fn total_cleared(&self) -> usize {
        self.cleared.values().sum()
    }
}

/// Computes the transitive effect of deleting `id` from `table`.
///
/// Must run inside the same transaction as the delete itself so the counts
/// describe exactly what SQLite removes.
pub fn plan_delete(
    conn: &Connection,
    table: &'static str,
    id: &str,
) -> rusqlite::Result<DeleteSummary> {
    let mut summary = DeleteSummary::default();
    let mut visited: BTreeMap<&'static str, BTreeSet<String>> = BTreeMap::new();
    collect(
        conn,
        table,
        vec![id.to_string()],
        &mut summary,
        &mut visited,
    )?;
    Ok(summary)
}

fn collect(
    conn: &Connection,
    table: &'static str,
    ids: Vec<String>,
    summary: &mut DeleteSummary,
    visited: &mut BTreeMap<&'static str, BTreeSet<String>>,
) -> rusqlite::Result<()> {
    let seen = visited.entry(table).or_default();
    let fresh: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
    if fresh.is_empty() {
        return Ok(());
    }
    *summary.deleted.entry(table).or_insert(0) += fresh.len();

    for relation in relations_referencing(table) {
        match relation.action {
            ReferentialAction::Clear => {
                let count = count_referencing(conn, relation, &fresh)?;
                if count > 0 {
                    *summary.cleared.entry(relation.table).or_insert(0) += count;
                }
            }
            ReferentialAction::Cascade if is_referenced(relation.table) => {
                let dependents = select_referencing_ids(conn, relation, &fresh)?;
                collect(conn, relation.table, dependents, summary, visited)?;
            }
            ReferentialAction::Cascade => {
                // Join tables: nothing references them, a count is enough.
                let count = count_referencing(conn, relation, &fresh)?;
                if count > 0 {
                    *summary.deleted.entry(relation.table).or_insert(0) += count;
                }
            }
        }
    }

    Ok(())
}

fn is_referenced(table: &str) -> bool {
    relations_referencing(table).next().is_some()
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn count_referencing(
    conn: &Connection,
    relation: &Relation,
    ids: &[String],
) -> rusqlite::Result<usize> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} IN ({});",
        relation.table,
        relation.column,
        placeholders(ids.len())
    );
    let values = ids.iter().cloned().map(Value::Text);
    let count: i64 = conn.query_row(&sql, params_from_iter(values), |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or(0))
}

fn select_referencing_ids(
    conn: &Connection,
    relation: &Relation,
    ids: &[String],
) -> rusqlite::Result<Vec<String>> {
    let sql = format!(
        "SELECT id FROM {} WHERE {} IN ({});",
        relation.table,
        relation.column,
        placeholders(ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let values = ids.iter().cloned().map(Value::Text);
    let mut rows = stmt.query(params_from_iter(values))?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(row.get(0)?);
    }
    Ok(result)
}
