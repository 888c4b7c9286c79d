use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::CliError;

/// Config file read when neither `--config` nor `SCHEMAWARD_CONFIG` is given.
pub const DEFAULT_CONFIG_FILE: &str = "schemaward.toml";
pub const CONFIG_ENV: &str = "SCHEMAWARD_CONFIG";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: Option<String>,
    /// Where the access settings are persisted.
    pub settings_path: PathBuf,
    /// Host-owned tables: flagged in listings and never dropped.
    pub protected_tables: Vec<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            settings_path: PathBuf::from("schemaward-settings.toml"),
            protected_tables: Vec::new(),
            max_connections: 5,
            acquire_timeout_secs: 10,
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load from `explicit`, else `SCHEMAWARD_CONFIG`, else `schemaward.toml`
    /// when present, then apply `DATABASE_URL`.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = explicit.map(Path::to_path_buf).or(from_env);

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(std::env::var(DATABASE_URL_ENV).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            CliError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, database_url: Option<String>) {
        if let Some(url) = database_url.filter(|url| !url.trim().is_empty()) {
            self.database_url = Some(url);
        }
    }

    fn validate(&self) -> Result<(), CliError> {
        if self.max_connections == 0 {
            return Err(CliError::Config("max_connections must be at least 1".to_string()));
        }
        if self.acquire_timeout_secs == 0 {
            return Err(CliError::Config(
                "acquire_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn require_database_url(&self) -> Result<&str, CliError> {
        self.database_url.as_deref().ok_or_else(|| {
            CliError::Config(format!(
                "no database_url configured; set it in {DEFAULT_CONFIG_FILE} or {DATABASE_URL_ENV}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = AppConfig::from_toml(
            "database_url = \"mysql://app@localhost/app\"\nprotected_tables = [\"wp_users\"]\n",
        )
        .unwrap();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.protected_tables, vec!["wp_users"]);
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let err = AppConfig::from_toml("max_connections = 0").unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn environment_url_overrides_file() {
        let mut config = AppConfig::from_toml("database_url = \"mysql://file/db\"").unwrap();
        config.apply_env(Some("mysql://env/db".to_string()));
        assert_eq!(config.database_url.as_deref(), Some("mysql://env/db"));

        config.apply_env(Some("  ".to_string()));
        assert_eq!(config.database_url.as_deref(), Some("mysql://env/db"));
    }

    #[test]
    fn reads_config_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemaward.toml");
        std::fs::write(&path, "log_format = \"json\"\nsettings_path = \"/var/lib/sw.toml\"\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.settings_path, PathBuf::from("/var/lib/sw.toml"));
        assert!(config.require_database_url().is_err());
    }
}
