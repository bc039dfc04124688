//! Ticket repository contracts and SQLite implementation.

use crate::db::relations::DeleteSummary;
use crate::model::account::AccountId;
use crate::model::ticket::{Ticket, TicketId};
use crate::repo::{
    delete_record, ensure_connection_ready, ensure_exists, ensure_reference, parse_optional_uuid,
    parse_uuid, write_immediate, RepoError, RepoResult, TableShape,
};
use rusqlite::{params, Connection, Row};

const TABLE: &str = "tickets";
const ENTITY: &str = "ticket";

const TICKET_SELECT_SQL: &str = "SELECT
    id,
    used_by,
    ticket,
    created_at,
    updated_at
FROM tickets";

const SHAPES: &[TableShape] = &[(
    TABLE,
    &["id", "used_by", "ticket", "created_at", "updated_at"],
)];

pub trait TicketRepository {
    fn create_ticket(&self, ticket: &Ticket) -> RepoResult<Ticket>;
    fn update_ticket(&self, ticket: &Ticket) -> RepoResult<()>;
    fn get_ticket(&self, id: TicketId) -> RepoResult<Option<Ticket>>;
    /// Tickets used by one account, or all tickets.
    fn list_tickets(&self, used_by: Option<AccountId>) -> RepoResult<Vec<Ticket>>;
    fn delete_ticket(&self, id: TicketId) -> RepoResult<DeleteSummary>;
}

pub struct SqliteTicketRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTicketRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, SHAPES)?;
        Ok(Self { conn })
    }
}

impl TicketRepository for SqliteTicketRepository<'_> {
    fn create_ticket(&self, ticket: &Ticket) -> RepoResult<Ticket> {
        ticket.validate()?;
        write_immediate(self.conn, |conn| {
            ensure_reference(conn, "accounts", "account", ticket.used_by)?;
            conn.execute(
                "INSERT INTO tickets (id, used_by, ticket) VALUES (?1, ?2, ?3);",
                params![
                    ticket.id.to_string(),
                    ticket.used_by.map(|id| id.to_string()),
                    ticket.ticket.as_str(),
                ],
            )?;
            Ok(())
        })?;
        self.get_ticket(ticket.id)?.ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: ticket.id,
        })
    }

    fn update_ticket(&self, ticket: &Ticket) -> RepoResult<()> {
        ticket.validate()?;
        write_immediate(self.conn, |conn| {
            ensure_exists(conn, TABLE, ENTITY, ticket.id)?;
            ensure_reference(conn, "accounts", "account", ticket.used_by)?;
            conn.execute(
                "UPDATE tickets
                 SET used_by = ?2,
                     ticket = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    ticket.id.to_string(),
                    ticket.used_by.map(|id| id.to_string()),
                    ticket.ticket.as_str(),
                ],
            )?;
            Ok(())
        })
    }

    fn get_ticket(&self, id: TicketId) -> RepoResult<Option<Ticket>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TICKET_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_ticket_row(row)?));
        }
        Ok(None)
    }

    fn list_tickets(&self, used_by: Option<AccountId>) -> RepoResult<Vec<Ticket>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TICKET_SELECT_SQL}
             WHERE (?1 IS NULL OR used_by = ?1)
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([used_by.map(|id| id.to_string())])?;
        let mut tickets = Vec::new();
        while let Some(row) = rows.next()? {
            tickets.push(parse_ticket_row(row)?);
        }
        Ok(tickets)
    }

    fn delete_ticket(&self, id: TicketId) -> RepoResult<DeleteSummary> {
        delete_record(self.conn, TABLE, ENTITY, id)
    }
}

fn parse_ticket_row(row: &Row<'_>) -> RepoResult<Ticket> {
    let id_text: String = row.get("id")?;
    Ok(Ticket {
        id: parse_uuid(&id_text, "tickets.id")?,
        used_by: parse_optional_uuid(row.get("used_by")?, "tickets.used_by")?,
        ticket: row.get("ticket")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
