//! Account mirror repository and the account directory capability.
//!
//! # Responsibility
//! - Let the identity collaborator register, rename and remove accounts.
//! - Expose read-only lookups (`AccountDirectory`) to the rest of core.
//!
//! # Invariants
//! - Removing an account applies every account-referencing action:
//!   results, profiles and book memberships cascade; teachers, comments and
//!   tickets are cleared.

use crate::db::relations::DeleteSummary;
use crate::model::account::{Account, AccountId};
use crate::repo::{
    delete_record, ensure_connection_ready, parse_uuid, RepoError, RepoResult, TableShape,
};
use rusqlite::{params, Connection, Row};

const TABLE: &str = "accounts";
const ENTITY: &str = "account";

const ACCOUNT_SELECT_SQL: &str = "SELECT
    id,
    display_name,
    created_at,
    updated_at
FROM accounts";

const SHAPES: &[TableShape] = &[(
    TABLE,
    &["id", "display_name", "created_at", "updated_at"],
)];

/// Read-only view of accounts for code that only needs identity.
pub trait AccountDirectory {
    fn find_account(&self, id: AccountId) -> RepoResult<Option<Account>>;

    /// Display name of `id`, or `None` when the account is unknown.
    fn display_name(&self, id: AccountId) -> RepoResult<Option<String>> {
        Ok(self.find_account(id)?.map(|account| account.display_name))
    }
}

/// Write contract used by the identity collaborator.
pub trait AccountRepository: AccountDirectory {
    fn create_account(&self, account: &Account) -> RepoResult<Account>;
    fn update_account(&self, account: &Account) -> RepoResult<()>;
    fn list_accounts(&self) -> RepoResult<Vec<Account>>;
    fn delete_account(&self, id: AccountId) -> RepoResult<DeleteSummary>;
}

pub struct SqliteAccountRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, SHAPES)?;
        Ok(Self { conn })
    }
}

impl AccountDirectory for SqliteAccountRepository<'_> {
    fn find_account(&self, id: AccountId) -> RepoResult<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_account_row(row)?));
        }
        Ok(None)
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn create_account(&self, account: &Account) -> RepoResult<Account> {
        account.validate()?;
        self.conn.execute(
            "INSERT INTO accounts (id, display_name) VALUES (?1, ?2);",
            params![account.id.to_string(), account.display_name.as_str()],
        )?;
        load_required_account(self.conn, account.id)
    }

    fn update_account(&self, account: &Account) -> RepoResult<()> {
        account.validate()?;
        let changed = self.conn.execute(
            "UPDATE accounts
             SET display_name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![account.id.to_string(), account.display_name.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: ENTITY,
                id: account.id,
            });
        }
        Ok(())
    }

    fn list_accounts(&self) -> RepoResult<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACCOUNT_SELECT_SQL} ORDER BY display_name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut accounts = Vec::new();
        while let Some(row) = rows.next()? {
            accounts.push(parse_account_row(row)?);
        }
        Ok(accounts)
    }

    fn delete_account(&self, id: AccountId) -> RepoResult<DeleteSummary> {
        delete_record(self.conn, TABLE, ENTITY, id)
    }
}

fn load_required_account(conn: &Connection, id: AccountId) -> RepoResult<Account> {
    SqliteAccountRepository { conn }
        .find_account(id)?
        .ok_or(RepoError::NotFound { entity: ENTITY, id })
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    let id_text: String = row.get("id")?;
    Ok(Account {
        id: parse_uuid(&id_text, "accounts.id")?,
        display_name: row.get("display_name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
