use schoolbook_core::db::open_db_in_memory;
use schoolbook_core::{RELATIONS, TABLES};
use rusqlite::Connection;
use std::collections::BTreeSet;

type ForeignKey = (String, String, String, String);

fn declared_foreign_keys(conn: &Connection) -> BTreeSet<ForeignKey> {
    let mut keys = BTreeSet::new();
    for table in TABLES {
        let mut stmt = conn
            .prepare(&format!("PRAGMA foreign_key_list({table});"))
            .unwrap();
        let mut rows = stmt.query([]).unwrap();
        while let Some(row) = rows.next().unwrap() {
            let references: String = row.get("table").unwrap();
            let column: String = row.get("from").unwrap();
            let target: String = row.get("to").unwrap();
            let on_delete: String = row.get("on_delete").unwrap();
            assert_eq!(target, "id", "{table}.{column} must reference id");
            keys.insert((table.to_string(), column, references, on_delete));
        }
    }
    keys
}

#[test]
fn registry_matches_schema_in_both_directions() {
    let conn = open_db_in_memory().unwrap();
    let from_schema = declared_foreign_keys(&conn);
    let from_registry: BTreeSet<ForeignKey> = RELATIONS
        .iter()
        .map(|relation| {
            (
                relation.table.to_string(),
                relation.column.to_string(),
                relation.references.to_string(),
                relation.action.sql_name().to_string(),
            )
        })
        .collect();

    let missing_in_registry: Vec<_> = from_schema.difference(&from_registry).collect();
    let missing_in_schema: Vec<_> = from_registry.difference(&from_schema).collect();
    assert!(missing_in_registry.is_empty(), "{missing_in_registry:?}");
    assert!(missing_in_schema.is_empty(), "{missing_in_schema:?}");
}

#[test]
fn every_schema_table_is_registered() {
    let conn = open_db_in_memory().unwrap();
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%';")
        .unwrap();
    let tables: BTreeSet<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(Result::unwrap)
        .collect();
    let registered: BTreeSet<String> = TABLES.iter().map(|table| table.to_string()).collect();
    assert_eq!(tables, registered);
}
