//! Schema and integrity layer for school administration records.
//!
//! Owns the persisted shape of teachers, classes, subjects, terms, results,
//! comments, tickets, communication books and profiles, and the rules that
//! keep them consistent when related records are removed.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::relations::{DeleteSummary, ReferentialAction, Relation, RELATIONS, TABLES};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::account::{Account, AccountId};
pub use model::class_template::{
    ClassTemplate, ClassTemplateId, Subject, SubjectId, Term, TermId, TermKind,
};
pub use model::comment::{Comment, CommentId, CommunicationBook, CommunicationBookId};
pub use model::profile::{Gender, Profile, ProfileId};
pub use model::student_result::{StudentResult, StudentResultId};
pub use model::teacher::{Teacher, TeacherId};
pub use model::ticket::{Ticket, TicketId};
pub use model::validation::{ValidationError, ValidationErrorKind};
pub use repo::{RepoError, RepoResult};
pub use service::label_service::LabelService;

/// Health check for hosts wiring the library in.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
