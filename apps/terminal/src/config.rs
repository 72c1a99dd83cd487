//! # Terminal Configuration
//!
//! Process-level configuration: which branch this terminal serves and where
//! its Data Store lives. Business settings (tax, currency, ...) are not here;
//! they are read from the store at session start.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_BRANCH_ID=downtown                                           │
//! │     TALLY_STORE_BACKEND=memory                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tally-pos/config.toml (Linux)                            │
//! │     ~/Library/Application Support/com.tally.pos/config.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [terminal]
//! branch_id = "downtown"
//! device_name = "Register 1"
//!
//! [store]
//! backend = "sqlite"          # sqlite | memory
//! database_path = "/var/lib/tally/tally.db"
//! max_connections = 5
//!
//! [logging]
//! filter = "info,tally=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Backend
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Documents in a local SQLite file.
    #[default]
    Sqlite,
    /// Volatile in-process tree, for demos and tests.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "file" => Ok(StoreBackend::Sqlite),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::Invalid(format!(
                "Unknown store backend: '{}'. Valid options: sqlite, memory",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Branch whose products, invoices and counter this terminal uses.
    pub branch_id: String,

    #[serde(default = "default_device_name")]
    pub device_name: String,
}

fn default_device_name() -> String {
    "POS Terminal".to_string()
}

impl Default for TerminalSettings {
    fn default() -> Self {
        TerminalSettings {
            branch_id: "main".to_string(),
            device_name: default_device_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Defaults to `tally.db` in the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            backend: StoreBackend::default(),
            database_path: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info,tally=debug,sqlx=warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// App Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub terminal: TerminalSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file
    /// 3. `TALLY_*` environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigDir)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(self)?)?;

        info!(?path, "Terminal config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.terminal.branch_id.trim().is_empty() {
            return Err(ConfigError::Invalid("terminal.branch_id must not be empty".into()));
        }
        if tally_store::path::segments(&self.terminal.branch_id)
            .map(|s| s.len() != 1)
            .unwrap_or(true)
        {
            return Err(ConfigError::Invalid(format!(
                "terminal.branch_id '{}' is not a valid key",
                self.terminal.branch_id
            )));
        }
        if self.store.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "store.max_connections must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Resolved SQLite file location.
    pub fn database_path(&self) -> PathBuf {
        self.store.database_path.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("com", "tally", "pos")
                .map(|dirs| dirs.data_dir().join("tally.db"))
                .unwrap_or_else(|| PathBuf::from("tally.db"))
        })
    }

    pub fn branch_id(&self) -> &str {
        &self.terminal.branch_id
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(branch) = lookup("TALLY_BRANCH_ID") {
            debug!(branch = %branch, "Overriding branch from environment");
            self.terminal.branch_id = branch;
        }

        if let Some(name) = lookup("TALLY_DEVICE_NAME") {
            self.terminal.device_name = name;
        }

        if let Some(backend) = lookup("TALLY_STORE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => self.store.backend = parsed,
                Err(_) => warn!(backend = %backend, "Unknown store backend in environment"),
            }
        }

        if let Some(path) = lookup("TALLY_DATABASE_PATH") {
            self.store.database_path = Some(PathBuf::from(path));
        }

        if let Some(max) = lookup("TALLY_MAX_CONNECTIONS") {
            if let Ok(n) = max.parse::<u32>() {
                self.store.max_connections = n;
            }
        }

        if let Some(filter) = lookup("TALLY_LOG") {
            self.logging.filter = filter;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "pos")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.branch_id(), "main");
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("SQLite".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TALLY_BRANCH_ID", "downtown"),
            ("TALLY_STORE_BACKEND", "memory"),
            ("TALLY_MAX_CONNECTIONS", "2"),
            ("TALLY_DATABASE_PATH", "/tmp/t.db"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.branch_id(), "downtown");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.max_connections, 2);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/t.db"));
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.terminal.branch_id = "  ".to_string();
        assert!(config.validate().is_err());

        config.terminal.branch_id = "a/b".to_string();
        assert!(config.validate().is_err());

        config.terminal.branch_id = "main".to_string();
        config.store.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let text = r#"
            [terminal]
            branch_id = "north"

            [store]
            backend = "memory"
        "#;
        let config: AppConfig = toml::from_str(text).unwrap();
        assert_eq!(config.branch_id(), "north");
        assert_eq!(config.terminal.device_name, "POS Terminal");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.logging.filter, "info,tally=debug,sqlx=warn");

        let out = toml::to_string_pretty(&config).unwrap();
        assert!(out.contains("[terminal]"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("tally-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        let mut config = AppConfig::default();
        config.terminal.branch_id = "east".to_string();
        config.save(Some(path.clone())).unwrap();

        let loaded = AppConfig::load(Some(path)).unwrap();
        // TALLY_BRANCH_ID may be set in the environment running the tests.
        if std::env::var("TALLY_BRANCH_ID").is_err() {
            assert_eq!(loaded.branch_id(), "east");
        }
        let _ = std::fs::remove_dir_all(dir);
    }
}
