//! Teacher record.

use crate::model::account::AccountId;
use crate::model::validation::{require, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TeacherId = Uuid;

const ENTITY: &str = "teacher";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    /// Cleared when the account is removed.
    pub account_id: Option<AccountId>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Teacher {
    pub fn new(account_id: AccountId) -> Self {
        Self::with_id(Uuid::new_v4(), account_id)
    }

    pub fn with_id(id: TeacherId, account_id: AccountId) -> Self {
        Self {
            id,
            account_id: Some(account_id),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// # Errors
    /// - `account_id` is `None`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(ENTITY, "account_id", self.account_id.as_ref())
    }
}
