//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default directory holding snapshot files and taxa.json.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default snapshot reload interval in seconds (1 hour).
pub const DEFAULT_SNAPSHOT_RELOAD_SECS: u64 = 3600;

/// Default GBIF API base URL.
pub const DEFAULT_GBIF_API_URL: &str = "https://api.gbif.org/v1";

/// Default iNaturalist API base URL.
pub const DEFAULT_INAT_API_URL: &str = "https://api.inaturalist.org/v1";

/// Default IUCN Red List API base URL.
pub const DEFAULT_REDLIST_API_URL: &str = "https://api.iucnredlist.org/api/v4";

/// Default literature search (Crossref) API base URL.
pub const DEFAULT_LITERATURE_API_URL: &str = "https://api.crossref.org";

/// Default per-request timeout for provider HTTP calls in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub providers: ProviderConfig,
    pub cors: CorsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Snapshot data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory containing taxa.json, snapshot files, and occurrence tables
    pub dir: PathBuf,
    /// Snapshot staleness interval; a fresh copy is loaded after this elapses
    pub reload_interval_secs: u64,
}

/// External provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub gbif_url: String,
    pub inat_url: String,
    pub redlist_url: String,
    /// Bearer credential for the Red List API; requests that need it fail
    /// with a configuration error when absent
    pub redlist_token: Option<String>,
    pub literature_url: String,
    pub request_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("OCC_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: std::env::var("OCC_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: std::env::var("OCC_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            },
            data: DataConfig {
                dir: std::env::var("OCC_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
                reload_interval_secs: std::env::var("OCC_SNAPSHOT_RELOAD_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SNAPSHOT_RELOAD_SECS),
            },
            providers: ProviderConfig {
                gbif_url: std::env::var("GBIF_API_URL")
                    .unwrap_or_else(|_| DEFAULT_GBIF_API_URL.to_string()),
                inat_url: std::env::var("INAT_API_URL")
                    .unwrap_or_else(|_| DEFAULT_INAT_API_URL.to_string()),
                redlist_url: std::env::var("REDLIST_API_URL")
                    .unwrap_or_else(|_| DEFAULT_REDLIST_API_URL.to_string()),
                redlist_token: std::env::var("REDLIST_API_TOKEN").ok().filter(|s| !s.is_empty()),
                literature_url: std::env::var("LITERATURE_API_URL")
                    .unwrap_or_else(|_| DEFAULT_LITERATURE_API_URL.to_string()),
                request_timeout_secs: std::env::var("PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                allow_credentials: std::env::var("CORS_ALLOW_CREDENTIALS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.data.reload_interval_secs == 0 {
            anyhow::bail!("Snapshot reload interval must be greater than 0");
        }

        if self.providers.request_timeout_secs == 0 {
            anyhow::bail!("Provider request timeout must be greater than 0");
        }

        for (name, url) in [
            ("GBIF_API_URL", &self.providers.gbif_url),
            ("INAT_API_URL", &self.providers.inat_url),
            ("REDLIST_API_URL", &self.providers.redlist_url),
            ("LITERATURE_API_URL", &self.providers.literature_url),
        ] {
            if url.is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
        }

        if self.providers.redlist_token.is_none() {
            tracing::warn!(
                "REDLIST_API_TOKEN is not set - species detail requests will fail"
            );
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            data: DataConfig {
                dir: PathBuf::from(DEFAULT_DATA_DIR),
                reload_interval_secs: DEFAULT_SNAPSHOT_RELOAD_SECS,
            },
            providers: ProviderConfig {
                gbif_url: DEFAULT_GBIF_API_URL.to_string(),
                inat_url: DEFAULT_INAT_API_URL.to_string(),
                redlist_url: DEFAULT_REDLIST_API_URL.to_string(),
                redlist_token: None,
                literature_url: DEFAULT_LITERATURE_API_URL.to_string(),
                request_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_reload_interval_rejected() {
        let mut config = Config::default();
        config.data.reload_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_provider_url_rejected() {
        let mut config = Config::default();
        config.providers.gbif_url = String::new();
        assert!(config.validate().is_err());
    }
}
