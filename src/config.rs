/// Configuration management for the manila file service
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub email: Option<EmailConfig>,
    pub logging: LoggingConfig,
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for blob payloads and derived thumbnails
    pub root: PathBuf,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Cache configuration (session tokens for the identity layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub redis_url: String,
    /// Key prefix for all cache entries
    pub key_prefix: String,
    /// Default TTL for cache entries in seconds
    pub default_ttl: u64,
    /// Session token TTL in seconds (24 hours)
    pub session_ttl: u64,
}

/// Email configuration for the welcome notifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/tmp/files_manager"),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "manila:".to_string(),
            default_ttl: 300,
            session_ttl: 86400,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let root: PathBuf = env::var("FOLDER_PATH")
            .unwrap_or_else(|_| "/tmp/files_manager".to_string())
            .into();

        let db_path: PathBuf = env::var("MANILA_DB_PATH")
            .unwrap_or_else(|_| "./data/manila.sqlite".to_string())
            .into();
        let max_connections = env::var("MANILA_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| Error::validation("Invalid MANILA_DB_MAX_CONNECTIONS"))?;

        let cache_enabled = env::var("CACHE_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let key_prefix = env::var("CACHE_KEY_PREFIX").unwrap_or_else(|_| "manila:".to_string());
        let default_ttl = env::var("CACHE_DEFAULT_TTL")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);
        let session_ttl = env::var("CACHE_SESSION_TTL")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);

        let email = if let Ok(smtp_url) = env::var("MANILA_EMAIL_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("MANILA_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| "noreply@localhost".to_string()),
            })
        } else {
            None
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            storage: StorageConfig { root },
            database: DatabaseConfig {
                path: db_path,
                max_connections,
            },
            cache: CacheConfig {
                enabled: cache_enabled,
                redis_url,
                key_prefix,
                default_ttl,
                session_ttl,
            },
            email,
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.root.as_os_str().is_empty() {
            return Err(Error::validation("Storage root cannot be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(Error::validation(
                "Database pool needs at least one connection",
            ));
        }
        Ok(())
    }
}
