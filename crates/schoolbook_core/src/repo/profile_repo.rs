//! Profile repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A second profile for the same account is rejected as `Integrity`.
//! - `gender` is stored as its one-letter code.

use crate::db::relations::DeleteSummary;
use crate::model::account::AccountId;
use crate::model::profile::{Gender, Profile, ProfileId};
use crate::repo::{
    delete_record, ensure_connection_ready, ensure_exists, ensure_reference, parse_optional_uuid,
    parse_uuid, write_immediate, RepoError, RepoResult, TableShape,
};
use rusqlite::{params, Connection, Row};

const TABLE: &str = "profiles";
const ENTITY: &str = "profile";

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    account_id,
    dob,
    image,
    gender,
    class_template_id,
    guardian_name,
    guardian_phone,
    guardian_address,
    created_at,
    updated_at
FROM profiles";

const SHAPES: &[TableShape] = &[(
    TABLE,
    &[
        "id",
        "account_id",
        "dob",
        "image",
        "gender",
        "class_template_id",
        "guardian_name",
        "guardian_phone",
        "guardian_address",
        "created_at",
        "updated_at",
    ],
)];

pub trait ProfileRepository {
    fn create_profile(&self, profile: &Profile) -> RepoResult<Profile>;
    fn update_profile(&self, profile: &Profile) -> RepoResult<()>;
    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>>;
    fn get_profile_for_account(&self, account_id: AccountId) -> RepoResult<Option<Profile>>;
    fn list_profiles(&self) -> RepoResult<Vec<Profile>>;
    fn delete_profile(&self, id: ProfileId) -> RepoResult<DeleteSummary>;
}

pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, SHAPES)?;
        Ok(Self { conn })
    }

    fn query_one(&self, column: &str, value: String) -> RepoResult<Option<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE {column} = ?1;"))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_profile_row(row)?));
        }
        Ok(None)
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn create_profile(&self, profile: &Profile) -> RepoResult<Profile> {
        profile.validate()?;
        write_immediate(self.conn, |conn| {
            check_references(conn, profile)?;
            conn.execute(
                "INSERT INTO profiles (
                    id,
                    account_id,
                    dob,
                    image,
                    gender,
                    class_template_id,
                    guardian_name,
                    guardian_phone,
                    guardian_address
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    profile.id.to_string(),
                    profile.account_id.to_string(),
                    profile.dob,
                    profile.image.as_str(),
                    profile.gender.map(Gender::code),
                    profile.class_template_id.map(|id| id.to_string()),
                    profile.guardian_name.as_deref(),
                    profile.guardian_phone.as_deref(),
                    profile.guardian_address.as_deref(),
                ],
            )?;
            Ok(())
        })?;
        self.get_profile(profile.id)?.ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: profile.id,
        })
    }

    fn update_profile(&self, profile: &Profile) -> RepoResult<()> {
        profile.validate()?;
        write_immediate(self.conn, |conn| {
            ensure_exists(conn, TABLE, ENTITY, profile.id)?;
            check_references(conn, profile)?;
            conn.execute(
                "UPDATE profiles
                 SET account_id = ?2,
                     dob = ?3,
                     image = ?4,
                     gender = ?5,
                     class_template_id = ?6,
                     guardian_name = ?7,
                     guardian_phone = ?8,
                     guardian_address = ?9,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    profile.id.to_string(),
                    profile.account_id.to_string(),
                    profile.dob,
                    profile.image.as_str(),
                    profile.gender.map(Gender::code),
                    profile.class_template_id.map(|id| id.to_string()),
                    profile.guardian_name.as_deref(),
                    profile.guardian_phone.as_deref(),
                    profile.guardian_address.as_deref(),
                ],
            )?;
            Ok(())
        })
    }

    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>> {
        self.query_one("id", id.to_string())
    }

    fn get_profile_for_account(&self, account_id: AccountId) -> RepoResult<Option<Profile>> {
        self.query_one("account_id", account_id.to_string())
    }

    fn list_profiles(&self) -> RepoResult<Vec<Profile>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROFILE_SELECT_SQL} ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next()? {
            profiles.push(parse_profile_row(row)?);
        }
        Ok(profiles)
    }

    fn delete_profile(&self, id: ProfileId) -> RepoResult<DeleteSummary> {
        delete_record(self.conn, TABLE, ENTITY, id)
    }
}

fn check_references(conn: &Connection, profile: &Profile) -> RepoResult<()> {
    ensure_exists(conn, "accounts", "account", profile.account_id)?;
    ensure_reference(
        conn,
        "class_templates",
        "class_template",
        profile.class_template_id,
    )
}

fn parse_gender(value: Option<String>) -> RepoResult<Option<Gender>> {
    value
        .map(|code| {
            Gender::from_code(&code)
                .ok_or_else(|| RepoError::InvalidData(format!("invalid profiles.gender `{code}`")))
        })
        .transpose()
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let id_text: String = row.get("id")?;
    let account_text: String = row.get("account_id")?;
    Ok(Profile {
        id: parse_uuid(&id_text, "profiles.id")?,
        account_id: parse_uuid(&account_text, "profiles.account_id")?,
        dob: row.get("dob")?,
        image: row.get("image")?,
        gender: parse_gender(row.get("gender")?)?,
        class_template_id: parse_optional_uuid(
            row.get("class_template_id")?,
            "profiles.class_template_id",
        )?,
        guardian_name: row.get("guardian_name")?,
        guardian_phone: row.get("guardian_phone")?,
        guardian_address: row.get("guardian_address")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
