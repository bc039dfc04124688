//! Per-subject scores of one student.
//!
//! Both scores default to `None`; there is no textual placeholder stored in
//! the integer columns.

use crate::model::account::AccountId;
use crate::model::class_template::SubjectId;
use crate::model::validation::{require, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type StudentResultId = Uuid;

const ENTITY: &str = "result";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentResult {
    pub id: StudentResultId,
    /// Student; the result is deleted with the account.
    pub account_id: Option<AccountId>,
    /// Cleared when the subject is removed.
    pub subject_id: Option<SubjectId>,
    pub test: Option<i32>,
    pub exam: Option<i32>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl StudentResult {
    pub fn new(account_id: AccountId, subject_id: SubjectId) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: Some(account_id),
            subject_id: Some(subject_id),
            test: None,
            exam: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn with_scores(mut self, test: Option<i32>, exam: Option<i32>) -> Self {
        self.test = test;
        self.exam = exam;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require(ENTITY, "account_id", self.account_id.as_ref())?;
        require(ENTITY, "subject_id", self.subject_id.as_ref())
    }
}
