// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Intake Service Configuration
//
// Defines the configuration schema for the intake API process:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP bind address, port and CORS origins
// - Application record storage (in-memory or PostgreSQL)
// - Object store used to sign document upload URLs
// - Draft checkpoint directory for the CLI form runner
// - Logging and metrics settings
//
// Configuration is validated once at startup and fails closed: a missing
// bucket, region, credential or connection string stops the process instead
// of surfacing later as a 500 on the first request.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::object_store::MAX_UPLOAD_URL_TTL;
use crate::domain::repository::{PostgresConfig, StorageBackend};

pub const API_VERSION: &str = "sewas.city/v1";
pub const KIND: &str = "IntakeConfig";
pub const CONFIG_PATH_ENV: &str = "SEWAS_CONFIG_PATH";

/// Top-level Kubernetes-style configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfigManifest {
    /// API version (must be "sewas.city/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "IntakeConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: IntakeConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Deployment name (e.g. "sewas-intake-prod")
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub object_store: ObjectStoreConfig,

    #[serde(default)]
    pub draft: DraftConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
            cors_allowed_origins: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepositoryKind {
    InMemory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_repository_kind")]
    pub backend: RepositoryKind,

    /// Connection string (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_repository_kind(),
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStoreKind {
    /// S3-compatible object store (production)
    S3,
    /// Deterministic fake URLs for local development and tests
    Mock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    #[serde(default = "default_object_store_kind")]
    pub backend: ObjectStoreKind,

    #[serde(default)]
    pub bucket: String,

    #[serde(default)]
    pub region: String,

    /// Custom endpoint for S3-compatible stores (MinIO, SeaweedFS S3 gateway)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Access key id (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    /// Secret access key (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    /// Validity of issued upload URLs, capped at one hour
    #[serde(default = "default_upload_url_ttl")]
    pub upload_url_ttl_seconds: u64,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_object_store_kind(),
            bucket: String::new(),
            region: String::new(),
            endpoint: None,
            access_key_id: Some("env:AWS_ACCESS_KEY_ID".to_string()),
            secret_access_key: Some("env:AWS_SECRET_ACCESS_KEY".to_string()),
            upload_url_ttl_seconds: default_upload_url_ttl(),
        }
    }
}

impl ObjectStoreConfig {
    pub fn upload_url_ttl(&self) -> Duration {
        Duration::from_secs(self.upload_url_ttl_seconds).min(MAX_UPLOAD_URL_TTL)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftConfig {
    /// Directory holding the draft checkpoint file.
    /// Default: `<platform data dir>/sewas`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

impl DraftConfig {
    pub fn resolve_directory(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("sewas"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prometheus exporter port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    3000
}

fn default_repository_kind() -> RepositoryKind {
    RepositoryKind::InMemory
}

fn default_max_connections() -> u32 {
    5
}

fn default_object_store_kind() -> ObjectStoreKind {
    ObjectStoreKind::S3
}

fn default_upload_url_ttl() -> u64 {
    MAX_UPLOAD_URL_TTL.as_secs()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for IntakeConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "sewas-intake".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: IntakeConfigSpec::default(),
        }
    }
}

/// Resolves "env:VAR_NAME" references; plain values are returned as-is.
/// Empty results count as absent.
pub fn resolve_secret(value: Option<&str>) -> Option<String> {
    resolve_secret_with(value, |name| std::env::var(name).ok())
}

fn resolve_secret_with(value: Option<&str>, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    let value = value?.trim();
    let resolved = match value.strip_prefix("env:") {
        Some(name) => lookup(name.trim())?,
        None => value.to_string(),
    };
    (!resolved.trim().is_empty()).then_some(resolved)
}

impl IntakeConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. SEWAS_CONFIG_PATH environment variable
    /// 2. ./sewas-config.yaml (working directory)
    /// 3. ~/.sewas/config.yaml (user home)
    /// 4. /etc/sewas/config.yaml (system, Unix) or C:\ProgramData\Sewas\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./sewas-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".sewas").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/sewas/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Sewas\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration.
    /// Container deployments configure the service entirely through these.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|name| std::env::var(name).ok());
    }

    pub fn apply_env_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("SEWAS_PORT") {
            match val.trim().parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: SEWAS_PORT={}", port);
                    self.spec.server.port = port;
                }
                Err(_) => {
                    tracing::warn!("Invalid value for SEWAS_PORT: '{}'. Ignoring.", val);
                }
            }
        }

        if lookup("DATABASE_URL").is_some_and(|v| !v.trim().is_empty()) {
            tracing::info!("Environment override: DATABASE_URL set, using postgres backend");
            self.spec.storage.backend = RepositoryKind::Postgres;
            self.spec.storage.database_url = Some("env:DATABASE_URL".to_string());
        }

        if let Some(bucket) = lookup("S3_BUCKET") {
            tracing::info!("Environment override: S3_BUCKET={}", bucket);
            self.spec.object_store.bucket = bucket;
        }

        if let Some(region) = lookup("AWS_REGION") {
            tracing::info!("Environment override: AWS_REGION={}", region);
            self.spec.object_store.region = region;
        }

        if let Some(endpoint) = lookup("S3_ENDPOINT") {
            tracing::info!("Environment override: S3_ENDPOINT={}", endpoint);
            self.spec.object_store.endpoint = Some(endpoint);
        }

        // Credentials stay as env references so they never land in rendered config
        if lookup("AWS_ACCESS_KEY_ID").is_some() {
            tracing::info!("Environment override: AWS_ACCESS_KEY_ID set");
            self.spec.object_store.access_key_id = Some("env:AWS_ACCESS_KEY_ID".to_string());
        }

        if lookup("AWS_SECRET_ACCESS_KEY").is_some() {
            tracing::info!("Environment override: AWS_SECRET_ACCESS_KEY set");
            self.spec.object_store.secret_access_key = Some("env:AWS_SECRET_ACCESS_KEY".to_string());
        }
    }

    /// Storage backend with secrets resolved
    pub fn storage_backend(&self) -> anyhow::Result<StorageBackend> {
        match self.spec.storage.backend {
            RepositoryKind::InMemory => Ok(StorageBackend::InMemory),
            RepositoryKind::Postgres => {
                let connection_string = resolve_secret(self.spec.storage.database_url.as_deref())
                    .ok_or_else(|| {
                        anyhow::anyhow!("spec.storage.database_url is required for the postgres backend")
                    })?;
                Ok(StorageBackend::PostgreSQL(PostgresConfig {
                    connection_string,
                    max_connections: self.spec.storage.max_connections,
                }))
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.server.bind_address.trim().is_empty() {
            anyhow::bail!("spec.server.bind_address cannot be empty");
        }

        self.storage_backend()?;
        if self.spec.storage.max_connections == 0 {
            anyhow::bail!("spec.storage.max_connections must be at least 1");
        }

        let store = &self.spec.object_store;
        if store.upload_url_ttl_seconds == 0 || store.upload_url_ttl_seconds > MAX_UPLOAD_URL_TTL.as_secs() {
            anyhow::bail!(
                "spec.object_store.upload_url_ttl_seconds must be between 1 and {}",
                MAX_UPLOAD_URL_TTL.as_secs()
            );
        }

        if store.backend == ObjectStoreKind::S3 {
            if store.bucket.trim().is_empty() {
                anyhow::bail!("spec.object_store.bucket is required (or set S3_BUCKET)");
            }
            if store.region.trim().is_empty() {
                anyhow::bail!("spec.object_store.region is required (or set AWS_REGION)");
            }
            if resolve_secret(store.access_key_id.as_deref()).is_none() {
                anyhow::bail!("Object store access key id is missing (spec.object_store.access_key_id)");
            }
            if resolve_secret(store.secret_access_key.as_deref()).is_none() {
                anyhow::bail!("Object store secret access key is missing (spec.object_store.secret_access_key)");
            }
        }

        Ok(())
    }
}
