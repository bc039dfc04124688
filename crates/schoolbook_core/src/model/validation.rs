//! Field-level validation shared by all school records.
//!
//! # Invariants
//! - Lengths are measured in characters, matching SQLite `length()`.
//! - A value that is only whitespace counts as blank.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?|ftps?)://[^\s/?#@]+(:[0-9]{1,5})?([/?#]\S*)?$")
        .expect("valid url regex")
});

/// Which constraint a field value violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Field must be set on create and update.
    Required,
    /// Text field must contain non-whitespace characters.
    Blank,
    /// Text exceeds the column limit.
    TooLong { max: usize, actual: usize },
    /// Value is outside the declared enumeration.
    InvalidChoice {
        value: String,
        expected: &'static [&'static str],
    },
    /// Value is not an absolute http(s)/ftp(s) URL.
    InvalidUrl { value: String },
}

/// Field value rejected before reaching storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub entity: &'static str,
    pub field: &'static str,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(entity: &'static str, field: &'static str, kind: ValidationErrorKind) -> Self {
        Self {
            entity,
            field,
            kind,
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}: ", self.entity, self.field)?;
        match &self.kind {
            ValidationErrorKind::Required => write!(f, "value is required"),
            ValidationErrorKind::Blank => write!(f, "value must not be blank"),
            ValidationErrorKind::TooLong { max, actual } => {
                write!(f, "at most {max} characters allowed, got {actual}")
            }
            ValidationErrorKind::InvalidChoice { value, expected } => write!(
                f,
                "`{value}` is not a valid choice; expected one of {}",
                expected.join("|")
            ),
            ValidationErrorKind::InvalidUrl { value } => write!(f, "`{value}` is not a valid URL"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require<T>(
    entity: &'static str,
    field: &'static str,
    value: Option<&T>,
) -> Result<(), ValidationError> {
    match value {
        Some(_) => Ok(()),
        None => Err(ValidationError::new(
            entity,
            field,
            ValidationErrorKind::Required,
        )),
    }
}

/// Non-blank text bounded by `max` characters.
pub(crate) fn check_text(
    entity: &'static str,
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(
            entity,
            field,
            ValidationErrorKind::Blank,
        ));
    }
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::new(
            entity,
            field,
            ValidationErrorKind::TooLong { max, actual },
        ));
    }
    Ok(())
}

/// Optional column that is still mandatory on every write.
pub(crate) fn check_required_text(
    entity: &'static str,
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(text) => check_text(entity, field, text, max),
        None => Err(ValidationError::new(
            entity,
            field,
            ValidationErrorKind::Required,
        )),
    }
}

pub(crate) fn check_url(
    entity: &'static str,
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    check_text(entity, field, value, max)?;
    if !URL_RE.is_match(value.trim()) {
        return Err(ValidationError::new(
            entity,
            field,
            ValidationErrorKind::InvalidUrl {
                value: value.to_string(),
            },
        ));
    }
    Ok(())
}

pub(crate) fn invalid_choice(
    entity: &'static str,
    field: &'static str,
    value: &str,
    expected: &'static [&'static str],
) -> ValidationError {
    ValidationError::new(
        entity,
        field,
        ValidationErrorKind::InvalidChoice {
            value: value.to_string(),
            expected,
        },
    )
}
