use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the persisted verification state
    pub state: String,
}

/// Keys under which the three progress records are persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_progress_key")]
    pub progress_key: String,
    #[serde(default = "default_form_data_key")]
    pub form_data_key: String,
    #[serde(default = "default_passport_key")]
    pub passport_key: String,
}

fn default_progress_key() -> String {
    "verification_progress".to_string()
}

fn default_form_data_key() -> String {
    "verification_form_data".to_string()
}

fn default_passport_key() -> String {
    "verification_passport_status".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            progress_key: default_progress_key(),
            form_data_key: default_form_data_key(),
            passport_key: default_passport_key(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to a file under the state directory instead of stderr
    #[serde(default)]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".kyc-progress/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the tool works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/kyc-progress/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("kyc-progress").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("KYC_PROGRESS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to the project-local config file
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::local_config_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config as TOML at `config_path`, creating parent directories
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                state: ".kyc-progress".to_string(), // Relative to cwd
            },
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_storage_keys() {
        let config = Config::default();
        assert_eq!(config.storage.progress_key, "verification_progress");
        assert_eq!(config.storage.form_data_key, "verification_form_data");
        assert_eq!(config.storage.passport_key, "verification_passport_status");
    }

    #[test]
    fn test_relative_state_path_is_absolutized() {
        let config = Config::default();
        assert!(config.state_path().is_absolute());
        assert!(config.logs_path().ends_with("logs"));
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[storage]\nprogress_key = \"kyc_step\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.storage.progress_key, "kyc_step");
        // Unset keys keep their defaults
        assert_eq!(config.storage.form_data_key, "verification_form_data");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_save_to_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.storage.passport_key = "kyc_passport".to_string();
        config.logging.to_file = true;
        config.save_to(&path).unwrap();

        assert!(path.exists());
        let loaded = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.storage.passport_key, "kyc_passport");
        assert!(loaded.logging.to_file);
        assert_eq!(loaded.paths.state, config.paths.state);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.storage, config.storage);
        assert_eq!(parsed.paths.state, config.paths.state);
    }
}
