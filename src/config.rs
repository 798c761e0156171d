use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub mail: MailConfig,

    pub features: FeatureConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:accountd.db".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8181,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

/// SMTP relay settings for transactional mail.
///
/// The notifier is constructed from this value explicitly rather than reading
/// ambient process state, so tests can swap in a recording implementation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Master switch for outbound mail (welcome emails in particular).
    pub enabled: bool,

    pub smtp_host: String,

    pub smtp_port: u16,

    pub smtp_login: String,

    pub smtp_password: String,

    pub sender_email: String,

    /// Public base URL embedded in recovery/confirmation links.
    pub site_url: String,

    /// Relay connect/send timeout. Relay unavailability is a loggable
    /// failure, never a crash.
    pub timeout_seconds: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: 465,
            smtp_login: String::new(),
            smtp_password: String::new(),
            sender_email: "noreply@example.com".to_string(),
            site_url: "http://localhost:8181".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub enable_account_deletion: bool,

    pub enable_account_export: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enable_account_deletion: true,
            enable_account_export: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB.
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations).
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("accountd").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".accountd").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.mail.enabled && self.mail.site_url.is_empty() {
            anyhow::bail!("Mail site_url cannot be empty when mail is enabled");
        }

        Ok(())
    }
}
