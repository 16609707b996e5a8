use crate::error::{Result, UserStoreError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// The only CQL protocol version the driver speaks.
pub const SUPPORTED_PROTOCOL_VERSION: u8 = 4;

/// Server section of the configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request deadline in milliseconds (0 disables it)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Storage section of the configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Storage engine type: "cassandra" or "memory"
    #[serde(default = "default_engine")]
    pub engine: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
        }
    }
}

fn default_engine() -> String {
    "cassandra".to_string()
}

/// Cassandra section of the configuration file
#[derive(Clone, Deserialize)]
pub struct CassandraConfig {
    /// Contact points as host:port
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_keyspace")]
    pub keyspace: String,
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u32,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u8,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Upper bound for a single health probe
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for CassandraConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            username: String::new(),
            password: String::new(),
            keyspace: default_keyspace(),
            replication_factor: default_replication_factor(),
            protocol_version: default_protocol_version(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

// Hand-written so the password never shows up in logs.
impl std::fmt::Debug for CassandraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CassandraConfig")
            .field("hosts", &self.hosts)
            .field("username", &self.username)
            .field("password", &"***")
            .field("keyspace", &self.keyspace)
            .field("replication_factor", &self.replication_factor)
            .field("protocol_version", &self.protocol_version)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .finish()
    }
}

impl CassandraConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hosts.is_empty() {
            return Err(UserStoreError::Config(
                "cassandra.hosts must list at least one contact point".to_string(),
            ));
        }
        if self.protocol_version != SUPPORTED_PROTOCOL_VERSION {
            return Err(UserStoreError::Config(format!(
                "unsupported CQL protocol version {} (supported: {})",
                self.protocol_version, SUPPORTED_PROTOCOL_VERSION
            )));
        }
        if !is_valid_identifier(&self.keyspace) {
            return Err(UserStoreError::Config(format!(
                "invalid keyspace name '{}'",
                self.keyspace
            )));
        }
        if self.replication_factor == 0 {
            return Err(UserStoreError::Config(
                "cassandra.replication_factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// CQL unquoted identifier: letter first, then letters, digits, underscores.
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    name.len() <= 48 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn default_hosts() -> Vec<String> {
    vec!["127.0.0.1:9042".to_string()]
}

fn default_keyspace() -> String {
    "masterdata".to_string()
}

fn default_replication_factor() -> u32 {
    1
}

fn default_protocol_version() -> u8 {
    SUPPORTED_PROTOCOL_VERSION
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_probe_timeout_secs() -> u64 {
    5
}

/// Logging section of the configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format: text or json
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cassandra: CassandraConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| UserStoreError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }
}
