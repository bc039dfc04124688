//! Comments and the communication book that shares them with students.
//!
//! # Invariants
//! - Comment text is write-once; storage rejects any change after insert.
//! - A communication book is two unordered sets: student accounts and
//!   comments. Removing either side only drops the association.

use crate::model::account::AccountId;
use crate::model::validation::{check_text, require, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub type CommentId = Uuid;
pub type CommunicationBookId = Uuid;

pub const COMMENT_MAX: usize = 500;
pub const DEFAULT_COMMENT: &str = "No Comment";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    /// Author; cleared when the account is removed.
    pub account_id: Option<AccountId>,
    pub comment: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Comment {
    pub fn new(account_id: AccountId, comment: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: Some(account_id),
            comment: comment.into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Comment carrying the `No Comment` placeholder text.
    pub fn placeholder(account_id: AccountId) -> Self {
        Self::new(account_id, DEFAULT_COMMENT)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("comment", "account_id", self.account_id.as_ref())?;
        check_text("comment", "comment", &self.comment, COMMENT_MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationBook {
    pub id: CommunicationBookId,
    pub students: BTreeSet<AccountId>,
    pub comments: BTreeSet<CommentId>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CommunicationBook {
    pub fn new(
        students: impl IntoIterator<Item = AccountId>,
        comments: impl IntoIterator<Item = CommentId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            students: students.into_iter().collect(),
            comments: comments.into_iter().collect(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Both sets must be non-empty when the book is written as a whole.
    /// Later unlinks may leave either set empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(
            "communication_book",
            "students",
            self.students.first(),
        )?;
        require(
            "communication_book",
            "comments",
            self.comments.first(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Comment, CommunicationBook, DEFAULT_COMMENT};
    use crate::model::validation::ValidationErrorKind;
    use uuid::Uuid;

    #[test]
    fn placeholder_comment_uses_default_text() {
        let comment = Comment::placeholder(Uuid::new_v4());
        assert_eq!(comment.comment, DEFAULT_COMMENT);
        assert!(comment.validate().is_ok());
    }

    #[test]
    fn book_without_students_is_rejected() {
        let book = CommunicationBook::new([], [Uuid::new_v4()]);
        let err = book.validate().unwrap_err();
        assert_eq!(err.field, "students");
        assert_eq!(err.kind, ValidationErrorKind::Required);
    }

    #[test]
    fn book_deduplicates_members() {
        let student = Uuid::new_v4();
        let book = CommunicationBook::new([student, student], [Uuid::new_v4()]);
        assert_eq!(book.students.len(), 1);
    }
}
