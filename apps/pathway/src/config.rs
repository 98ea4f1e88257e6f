//! # Configuration
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `pathway.toml` in the working directory, or the file named by `--config`
//! 3. Environment variables
//! 4. CLI flags (applied by the CLI module)
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! api_key = "secret"
//! rate_limit = 100          # requests per second, 0 disables
//! cors_origins = ["http://localhost:3000"]
//!
//! [storage]
//! backend = "redb"          # memory | redb | dir
//! path = "pathway.redb"
//! ```
//!
//! ## Environment Variables
//!
//! - `PATHWAY_API_KEY`: bearer key required on every route except `/health`
//! - `PATHWAY_RATE_LIMIT`: requests per second
//! - `PATHWAY_CORS_ORIGINS`: comma-separated origins, or `*` for all

use pathway_core::{BackendKind, PathwayError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "pathway.toml";

/// Default rate limit: 100 requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Whole application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Authentication is disabled when absent or empty.
    pub api_key: Option<String>,
    pub rate_limit: u32,
    /// `None` restricts CORS to localhost.
    pub cors_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            api_key: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// The API key, if authentication is enabled.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: String,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Redb.as_str().to_string(),
            path: PathBuf::from("pathway.redb"),
        }
    }
}

impl StorageConfig {
    pub fn backend_kind(&self) -> Result<BackendKind, PathwayError> {
        BackendKind::parse(&self.backend)
    }
}

impl Config {
    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, PathwayError> {
        toml::from_str(text)
            .map_err(|e| PathwayError::DeserializationError(format!("config: {}", e)))
    }

    /// Read the config file, then apply environment overrides.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, PathwayError> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        };

        let config = match file {
            Some(file) => {
                tracing::debug!("Reading config from {}", file.display());
                let text = std::fs::read_to_string(&file).map_err(|e| {
                    PathwayError::IoError(format!("config '{}': {}", file.display(), e))
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };

        Ok(config.with_overrides(|name| std::env::var(name).ok()))
    }

    /// Apply `PATHWAY_*` overrides read through `lookup`.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("PATHWAY_API_KEY") {
            self.server.api_key = Some(key);
        }
        if let Some(raw) = lookup("PATHWAY_RATE_LIMIT") {
            match raw.trim().parse() {
                Ok(rps) => self.server.rate_limit = rps,
                Err(_) => tracing::warn!("Ignoring invalid PATHWAY_RATE_LIMIT '{}'", raw),
            }
        }
        if let Some(raw) = lookup("PATHWAY_CORS_ORIGINS") {
            let origins: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            self.server.cors_origins = Some(origins);
        }
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
