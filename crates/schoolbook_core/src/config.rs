//! Runtime configuration for hosts embedding the schoolbook core.
//!
//! Load order: TOML file (when given and present) → environment → defaults.

use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "SCHOOLBOOK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "SCHOOLBOOK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SCHOOLBOOK_LOG_DIR";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; an in-memory database is used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// File logging is disabled when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    InvalidValue {
        key: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config file: {err}"),
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl CoreConfig {
    /// Loads `path` (if it exists), then applies process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides read through `lookup`; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = read(ENV_DB_PATH) {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            self.logging.dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.logging.level).map_err(|err| ConfigError::InvalidValue {
            key: "logging.level",
            message: err.to_string(),
        })?;
        if let Some(dir) = &self.logging.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: "logging.dir",
                    message: format!("path must be absolute, got `{}`", dir.display()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_LOG_LEVEL};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn defaults_use_memory_database_and_no_file_logging() {
        let config = CoreConfig::default();
        assert_eq!(config.database.path, None);
        assert_eq!(config.logging.level, default_log_level());
        assert_eq!(config.logging.dir, None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = CoreConfig::from_toml_str(
            r#"
[database]
path = "/var/lib/schoolbook/school.db"
"#,
        )
        .unwrap();
        assert_eq!(
            config.database.path,
            Some(PathBuf::from("/var/lib/schoolbook/school.db"))
        );
        assert_eq!(config.logging.level, default_log_level());
    }

    #[test]
    fn unknown_level_is_rejected() {
        let err = CoreConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "logging.level",
                ..
            }
        ));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = CoreConfig::from_toml_str("[logging]\ndir = \"logs\"\n").unwrap_err();
        assert!(err.to_string().contains("logging.dir"));
    }

    #[test]
    fn overrides_replace_file_values_and_skip_blanks() {
        let mut config = CoreConfig::from_toml_str("[logging]\nlevel = \"warn\"\n").unwrap();
        let env = HashMap::from([
            (ENV_DB_PATH, "/tmp/override.db".to_string()),
            (ENV_LOG_LEVEL, "  ".to_string()),
        ]);
        config.apply_overrides(|key| env.get(key).cloned());

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/override.db")));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"error\"").unwrap();

        let config = CoreConfig::load(Some(file.path())).unwrap();
        if std::env::var(ENV_LOG_LEVEL).is_err() {
            assert_eq!(config.logging.level, "error");
        }
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = CoreConfig::from_toml_str("[database\npath = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
