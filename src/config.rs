//! Application configuration file handling
//!
//! TOML configuration for the account core: which backend environment to
//! register against, which network is active, where the terms document
//! lives, and how to log. Stored under the platform config directory by
//! default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default network; a banner is shown when any other network is active.
const DEFAULT_NETWORK: &str = "mainnet";

/// Default location of the terms-of-service document opened by the
/// terms gate's read-more branch.
const DEFAULT_TERMS_URL: &str = "https://tessera.network/terms-of-service/";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Registration backend configuration
    #[serde(default)]
    pub registration: RegistrationConfig,

    /// Terms-of-service configuration
    #[serde(default)]
    pub terms: TermsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Registration backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Backend environment to register against (production or staging)
    #[serde(default = "default_servers")]
    pub servers: String,

    /// Active network name. Balances and registrations on a non-default
    /// network are flagged in the UI.
    #[serde(default = "default_network")]
    pub network: String,
}

impl RegistrationConfig {
    /// Whether the active network is the default one. The UI shows an
    /// active-network banner whenever this is false.
    pub fn is_default_network(&self) -> bool {
        self.network == DEFAULT_NETWORK
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            network: default_network(),
        }
    }
}

/// Terms-of-service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermsConfig {
    /// URL of the terms document opened from the terms dialog
    #[serde(default = "default_terms_url")]
    pub url: String,
}

impl Default for TermsConfig {
    fn default() -> Self {
        Self {
            url: default_terms_url(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

fn default_servers() -> String {
    "production".to_string()
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

fn default_terms_url() -> String {
    DEFAULT_TERMS_URL.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        format!(
            r#"# Tessera Configuration

[registration]
# Backend environment: "production" or "staging"
servers = "production"

# Active network. Anything other than "{network}" shows an
# active-network banner in the client.
network = "{network}"

[terms]
# Terms-of-service document opened from the account creation dialog
url = "{terms_url}"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/tessera/tessera.log"
"#,
            network = DEFAULT_NETWORK,
            terms_url = DEFAULT_TERMS_URL,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Default config file path under the platform config directory
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tessera")
        .join("config.toml")
}
