//! Short access codes handed to accounts.

use crate::model::account::AccountId;
use crate::model::validation::{check_text, require, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TicketId = Uuid;

const ENTITY: &str = "ticket";
pub const TICKET_CODE_MAX: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    /// Cleared when the account is removed.
    pub used_by: Option<AccountId>,
    pub ticket: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Ticket {
    pub fn new(used_by: AccountId, ticket: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            used_by: Some(used_by),
            ticket: ticket.into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require(ENTITY, "used_by", self.used_by.as_ref())?;
        check_text(ENTITY, "ticket", &self.ticket, TICKET_CODE_MAX)
    }
}
