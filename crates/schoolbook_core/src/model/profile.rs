//! Student profile: personal data and guardian contact.
//!
//! # Invariants
//! - Exactly one profile per account (unique index on `account_id`).
//! - The profile is deleted with its account.
//! - `dob`, `gender`, `class_template_id` and guardian fields are required
//!   on write but may read back as `None` (class removed, legacy rows).

use crate::model::account::AccountId;
use crate::model::class_template::ClassTemplateId;
use crate::model::validation::{
    check_required_text, check_url, invalid_choice, require, ValidationError,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type ProfileId = Uuid;

const ENTITY: &str = "profile";
pub const IMAGE_URL_MAX: usize = 500;
pub const GUARDIAN_NAME_MAX: usize = 150;
pub const GUARDIAN_PHONE_MAX: usize = 15;
pub const GUARDIAN_ADDRESS_MAX: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Female,
    Male,
    Neither,
}

const GENDER_CHOICES: &[&str] = &["FEMALE", "MALE", "NEITHER"];

impl Gender {
    pub const ALL: [Gender; 3] = [Self::Female, Self::Male, Self::Neither];

    pub fn code(self) -> &'static str {
        match self {
            Self::Female => "F",
            Self::Male => "M",
            Self::Neither => "N",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Female => "FEMALE",
            Self::Male => "MALE",
            Self::Neither => "NEITHER",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "F" => Some(Self::Female),
            "M" => Some(Self::Male),
            "N" => Some(Self::Neither),
            _ => None,
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|gender| gender.label() == normalized || gender.code() == normalized)
            .ok_or_else(|| invalid_choice(ENTITY, "gender", value, GENDER_CHOICES))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub account_id: AccountId,
    pub dob: Option<NaiveDate>,
    /// Absolute URL of the profile picture.
    pub image: String,
    pub gender: Option<Gender>,
    /// Cleared when the class is removed.
    pub class_template_id: Option<ClassTemplateId>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub guardian_address: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Profile {
    /// Creates a profile with only the mandatory columns set.
    ///
    /// Callers fill the remaining fields before persisting; `validate()`
    /// reports the first one still missing.
    pub fn new(account_id: AccountId, image: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            dob: None,
            image: image.into(),
            gender: None,
            class_template_id: None,
            guardian_name: None,
            guardian_phone: None,
            guardian_address: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require(ENTITY, "dob", self.dob.as_ref())?;
        check_url(ENTITY, "image", &self.image, IMAGE_URL_MAX)?;
        require(ENTITY, "gender", self.gender.as_ref())?;
        require(ENTITY, "class_template_id", self.class_template_id.as_ref())?;
        check_required_text(
            ENTITY,
            "guardian_name",
            self.guardian_name.as_deref(),
            GUARDIAN_NAME_MAX,
        )?;
        check_required_text(
            ENTITY,
            "guardian_phone",
            self.guardian_phone.as_deref(),
            GUARDIAN_PHONE_MAX,
        )?;
        check_required_text(
            ENTITY,
            "guardian_address",
            self.guardian_address.as_deref(),
            GUARDIAN_ADDRESS_MAX,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Gender, Profile};
    use crate::model::validation::ValidationErrorKind;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn complete_profile() -> Profile {
        let mut profile = Profile::new(Uuid::new_v4(), "https://img.example.com/p.png");
        profile.dob = NaiveDate::from_ymd_opt(2014, 3, 9);
        profile.gender = Some(Gender::Female);
        profile.class_template_id = Some(Uuid::new_v4());
        profile.guardian_name = Some("Ada Obi".to_string());
        profile.guardian_phone = Some("+2348012345678".to_string());
        profile.guardian_address = Some("12 Marina Road".to_string());
        profile
    }

    #[test]
    fn gender_parses_and_rejects() {
        assert_eq!("male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("N".parse::<Gender>().unwrap(), Gender::Neither);
        let err = "X".parse::<Gender>().unwrap_err();
        assert_eq!(err.field, "gender");
    }

    #[test]
    fn complete_profile_validates() {
        assert!(complete_profile().validate().is_ok());
    }

    #[test]
    fn missing_guardian_phone_is_reported() {
        let mut profile = complete_profile();
        profile.guardian_phone = None;
        let err = profile.validate().unwrap_err();
        assert_eq!(err.field, "guardian_phone");
        assert_eq!(err.kind, ValidationErrorKind::Required);
    }

    #[test]
    fn long_guardian_phone_is_rejected() {
        let mut profile = complete_profile();
        profile.guardian_phone = Some("+44 20 7946 0958 ext 12".to_string());
        let err = profile.validate().unwrap_err();
        assert!(matches!(err.kind, ValidationErrorKind::TooLong { max: 15, .. }));
    }

    #[test]
    fn relative_image_path_is_rejected() {
        let mut profile = complete_profile();
        profile.image = "uploads/p.png".to_string();
        let err = profile.validate().unwrap_err();
        assert!(matches!(err.kind, ValidationErrorKind::InvalidUrl { .. }));
    }
}
