//! Configuration file management.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use souhaits_core::ServiceConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "SOUHAITS_DATA_DIR";

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Public site settings.
    #[serde(default)]
    pub site: SiteConfig,
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Garbage collection settings.
    #[serde(default)]
    pub gc: GcConfig,
    /// Outgoing mail settings.
    #[serde(default)]
    pub mail: MailConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Root URL used in links sent by mail.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sender address of site notifications.
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    /// Sender display name.
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

/// Garbage collection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcConfig {
    /// Hours between two sweeps.
    #[serde(default = "default_gc_interval")]
    pub interval_hours: u64,
}

/// Mail configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailConfig {
    /// Mailbox file messages are appended to. Empty = $data_dir/mailbox.
    #[serde(default)]
    pub mailbox_file: String,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions

fn default_base_url() -> String {
    ServiceConfig::default().base_url
}

fn default_admin_email() -> String {
    ServiceConfig::default().admin_email
}

fn default_admin_name() -> String {
    ServiceConfig::default().admin_name
}

fn default_gc_interval() -> u64 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            admin_email: default_admin_email(),
            admin_name: default_admin_name(),
        }
    }
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_gc_interval(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: DaemonConfig = toml::from_str(content)?;
        if config.gc.interval_hours == 0 {
            anyhow::bail!("gc.interval_hours must be at least 1");
        }
        Ok(config)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Path of the SQLite database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("souhaits.db")
    }

    pub fn mailbox_path(&self) -> PathBuf {
        if self.mail.mailbox_file.is_empty() {
            self.data_dir().join("mailbox")
        } else {
            PathBuf::from(&self.mail.mailbox_file)
        }
    }

    pub fn gc_interval(&self) -> Duration {
        Duration::from_secs(self.gc.interval_hours.max(1) * 60 * 60)
    }

    /// Settings handed to the service library.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            base_url: self.site.base_url.trim_end_matches('/').to_string(),
            admin_email: self.site.admin_email.clone(),
            admin_name: self.site.admin_name.clone(),
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/Souhaits")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".souhaits")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/souhaits"))
}
