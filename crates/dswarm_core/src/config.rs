//! Configuration for the d:swarm backup tools
//!
//! Settings come from a TOML file, then environment variables, then the
//! `-key=value` parameters of the command being run (applied by the CLI).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pools::WorkerKind;
use crate::{CoreError, Result};

/// Timeout used for connecting and for whole requests, in milliseconds.
///
/// Large content imports keep the backend busy for a long time, so this is
/// effectively "no timeout".
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 20_000_000;

/// Bodies longer than this are sent with chunked transfer encoding.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

pub const DEFAULT_DATA_MODEL_URI_TEMPLATE: &str = "http://data.slub-dresden.de/datamodel/{id}/data";

pub const BACKEND_API_ENV: &str = "DSWARM_BACKEND_API";
pub const GRAPH_EXTENSION_API_ENV: &str = "DSWARM_GRAPH_EXTENSION_API";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupConfig {
    /// d:swarm backend API base URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_api: Option<String>,

    /// d:swarm graph extension API base URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_extension_api: Option<String>,

    /// Template for data model URIs; `{id}` is replaced by the data model identifier
    #[serde(default = "default_data_model_uri_template")]
    pub data_model_uri_template: String,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub pools: PoolConfig,
}

fn default_data_model_uri_template() -> String {
    DEFAULT_DATA_MODEL_URI_TEMPLATE.to_string()
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            backend_api: None,
            graph_extension_api: None,
            data_model_uri_template: default_data_model_uri_template(),
            http: HttpConfig::default(),
            pools: PoolConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_ms: u64,
    pub chunk_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Concurrency budget of each pool kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub reader: usize,
    pub writer: usize,
    pub exporter: usize,
    pub importer: usize,
}

impl PoolConfig {
    pub fn capacity(&self, kind: WorkerKind) -> usize {
        match kind {
            WorkerKind::Reader => self.reader,
            WorkerKind::Writer => self.writer,
            WorkerKind::Exporter => self.exporter,
            WorkerKind::Importer => self.importer,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            reader: 4,
            writer: 4,
            exporter: 16,
            importer: 4,
        }
    }
}

impl BackupConfig {
    /// Override API URIs from `DSWARM_BACKEND_API` / `DSWARM_GRAPH_EXTENSION_API`.
    pub fn apply_env(&mut self) {
        if let Ok(uri) = std::env::var(BACKEND_API_ENV) {
            if !uri.trim().is_empty() {
                self.backend_api = Some(uri);
            }
        }
        if let Ok(uri) = std::env::var(GRAPH_EXTENSION_API_ENV) {
            if !uri.trim().is_empty() {
                self.graph_extension_api = Some(uri);
            }
        }
    }
}

/// Load configuration from a TOML file
pub async fn load_config(path: &Path) -> Result<BackupConfig> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        CoreError::configuration(
            path.display().to_string(),
            "file",
            "readable TOML file",
            e,
        )
    })?;

    toml::from_str(&content).map_err(|e| {
        CoreError::configuration(
            path.display().to_string(),
            "content",
            "valid TOML configuration",
            e,
        )
    })
}

/// Save configuration to a TOML file
pub async fn save_config(config: &BackupConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            CoreError::configuration(
                parent.display().to_string(),
                "directory",
                "writable directory",
                e,
            )
        })?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| {
        CoreError::configuration(
            path.display().to_string(),
            "serialization",
            "serializable config structure",
            e,
        )
    })?;

    tokio::fs::write(path, content).await.map_err(|e| {
        CoreError::configuration(
            path.display().to_string(),
            "file",
            "writable file location",
            e,
        )
    })
}

/// Standard config file locations
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("dswarm-tools.toml")];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("dswarm-tools").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".dswarm-tools").join("config.toml"));
    }

    paths
}

/// Load configuration from the first standard location that exists
pub async fn load_config_from_standard_locations() -> Result<BackupConfig> {
    for path in config_paths() {
        if path.exists() {
            tracing::debug!("loading config from {}", path.display());
            return load_config(&path).await;
        }
    }

    Ok(BackupConfig::default())
}
