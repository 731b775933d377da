//! Layered configuration for the sidecar.
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. `attendanced.toml` in the working directory, or the file named by
//!    `ATTENDANCE_CONFIG`
//! 3. `ATTENDANCE_*` environment variables, `__` separating sections
//!    (`ATTENDANCE_STORAGE__DATA_DIR` -> `storage.data_dir`)

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "attendanced.toml";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Csv,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the attendance table.
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("database"),
            backend: StorageBackend::Csv,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UploadConfig {
    pub max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let file = std::env::var_os("ATTENDANCE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }

        figment.merge(Env::prefixed("ATTENDANCE_").split("__").ignore(&["config", "log"]))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upload.max_bytes".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage.data_dir".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_files() {
        Jail::expect_with(|_jail| {
            let config = AppConfig::load().expect("defaults");
            assert_eq!(config.storage.backend, StorageBackend::Csv);
            assert_eq!(config.storage.data_dir, PathBuf::from("database"));
            assert_eq!(config.upload.max_bytes, DEFAULT_MAX_UPLOAD_BYTES);
            Ok(())
        });
    }

    #[test]
    fn toml_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
[storage]
data_dir = "/srv/attendance"
backend = "sqlite"

[upload]
max_bytes = 1024
"#,
            )?;
            jail.set_env("ATTENDANCE_UPLOAD__MAX_BYTES", "2048");

            let config = AppConfig::load().expect("load");
            assert_eq!(config.storage.data_dir, PathBuf::from("/srv/attendance"));
            assert_eq!(config.storage.backend, StorageBackend::Sqlite);
            assert_eq!(config.upload.max_bytes, 2048);
            Ok(())
        });
    }

    #[test]
    fn zero_upload_limit_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("ATTENDANCE_UPLOAD__MAX_BYTES", "0");
            let err = AppConfig::load().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }));
            Ok(())
        });
    }
}
