//! Account mirror of the identity collaborator's users.
//!
//! The schoolbook never owns credentials; it keeps an id and a display name
//! so that foreign keys and referential actions can be enforced locally.

use crate::model::validation::{check_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AccountId = Uuid;

const ENTITY: &str = "account";
pub const DISPLAY_NAME_MAX: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub display_name: String,
    /// Epoch ms, storage-maintained.
    pub created_at: i64,
    /// Epoch ms, storage-maintained.
    pub updated_at: i64,
}

impl Account {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), display_name)
    }

    /// Uses the identity provider's id for this account.
    pub fn with_id(id: AccountId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_text(ENTITY, "display_name", &self.display_name, DISPLAY_NAME_MAX)
    }
}
