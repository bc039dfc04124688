//! Class templates and the records scoped to them: subjects and terms.
//!
//! # Invariants
//! - Removing a class clears `Subject::class_template_id`.
//! - Removing a class deletes its terms.
//! - `TermKind` only admits FIRST, SECOND, THIRD and the ERROR sentinel.

use crate::model::validation::{check_text, invalid_choice, require, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type ClassTemplateId = Uuid;
pub type SubjectId = Uuid;
pub type TermId = Uuid;

pub const SESSION_MAX: usize = 10;
pub const CLASS_NAME_MAX: usize = 150;
pub const SUBJECT_NAME_MAX: usize = 100;
pub const SUBJECT_DESCRIPTION_MAX: usize = 400;

/// A named cohort for one session, e.g. `Grade 5A` in `2024`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTemplate {
    pub id: ClassTemplateId,
    /// Academic year or term label.
    pub session: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ClassTemplate {
    pub fn new(session: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), session, name)
    }

    pub fn with_id(id: ClassTemplateId, session: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            session: session.into(),
            name: name.into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_text("class_template", "session", &self.session, SESSION_MAX)?;
        check_text("class_template", "name", &self.name, CLASS_NAME_MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    /// Required on write; `None` once the class has been removed.
    pub class_template_id: Option<ClassTemplateId>,
    pub name: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Subject {
    pub fn new(
        class_template_id: ClassTemplateId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            class_template_id: Some(class_template_id),
            name: name.into(),
            description: description.into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("subject", "class_template_id", self.class_template_id.as_ref())?;
        check_text("subject", "name", &self.name, SUBJECT_NAME_MAX)?;
        check_text(
            "subject",
            "description",
            &self.description,
            SUBJECT_DESCRIPTION_MAX,
        )
    }
}

/// Academic period marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TermKind {
    First,
    Second,
    Third,
    /// Unset sentinel.
    #[default]
    Error,
}

const TERM_CHOICES: &[&str] = &["FIRST", "SECOND", "THIRD", "ERROR"];

impl TermKind {
    pub const ALL: [TermKind; 4] = [Self::First, Self::Second, Self::Third, Self::Error];

    /// One-letter storage code.
    pub fn code(self) -> &'static str {
        match self {
            Self::First => "F",
            Self::Second => "S",
            Self::Third => "T",
            Self::Error => "E",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::First => "FIRST",
            Self::Second => "SECOND",
            Self::Third => "THIRD",
            Self::Error => "ERROR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "F" => Some(Self::First),
            "S" => Some(Self::Second),
            "T" => Some(Self::Third),
            "E" => Some(Self::Error),
            _ => None,
        }
    }
}

impl Display for TermKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TermKind {
    type Err = ValidationError;

    /// Accepts the label (`FIRST`) or the storage code (`F`), case-insensitive.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == normalized || kind.code() == normalized)
            .ok_or_else(|| invalid_choice("term", "term", value, TERM_CHOICES))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub term: TermKind,
    /// Owning class; the term is deleted together with it.
    pub class_template_id: ClassTemplateId,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Term {
    pub fn new(class_template_id: ClassTemplateId, term: TermKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            term,
            class_template_id,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Term with the unset `ERROR` marker.
    pub fn unset(class_template_id: ClassTemplateId) -> Self {
        Self::new(class_template_id, TermKind::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassTemplate, Subject, TermKind};
    use crate::model::validation::ValidationErrorKind;
    use uuid::Uuid;

    #[test]
    fn term_kind_parses_labels_and_codes() {
        assert_eq!("first".parse::<TermKind>().unwrap(), TermKind::First);
        assert_eq!("S".parse::<TermKind>().unwrap(), TermKind::Second);
        assert_eq!(" third ".parse::<TermKind>().unwrap(), TermKind::Third);
        assert_eq!(TermKind::default(), TermKind::Error);
    }

    #[test]
    fn term_kind_rejects_unknown_values() {
        let err = "FOURTH".parse::<TermKind>().unwrap_err();
        assert_eq!(err.entity, "term");
        assert_eq!(err.field, "term");
        assert!(matches!(
            err.kind,
            ValidationErrorKind::InvalidChoice { ref value, .. } if value == "FOURTH"
        ));
    }

    #[test]
    fn class_template_session_is_limited_to_ten_characters() {
        let err = ClassTemplate::new("2024/2025-1", "Grade 5A")
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "session");
        assert_eq!(
            err.kind,
            ValidationErrorKind::TooLong {
                max: 10,
                actual: 11
            }
        );
    }

    #[test]
    fn subject_requires_class_on_write() {
        let mut subject = Subject::new(Uuid::new_v4(), "Math", "Algebra");
        assert!(subject.validate().is_ok());

        subject.class_template_id = None;
        let err = subject.validate().unwrap_err();
        assert_eq!(err.field, "class_template_id");
        assert_eq!(err.kind, ValidationErrorKind::Required);
    }
}
