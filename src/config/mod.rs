//! Runtime configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) yields a
//! working hub bound to localhost. Command-line flags override file values
//! after loading.

use crate::agent::services::{DiscoveryLimits, RegisterAgentRequest};
use crate::rpc::Method;
use crate::stream::services::DEFAULT_QUEUE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Agent Card served at the discovery document path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalAgentConfig {
    /// Agent identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Implementation version.
    pub version: String,
    /// Capability tags.
    pub capabilities: Vec<String>,
    /// Advertised RPC methods. Empty advertises every served method.
    pub methods: Vec<String>,
    /// Public RPC endpoint.
    pub endpoint: String,
    /// A2A protocol version.
    pub protocol_version: String,
}

impl Default for LocalAgentConfig {
    fn default() -> Self {
        Self {
            id: "switchboard".to_owned(),
            name: "Switchboard".to_owned(),
            description: "Agent-to-agent registry, task ledger and event stream".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            capabilities: vec![
                "discovery".to_owned(),
                "tasks".to_owned(),
                "channels".to_owned(),
                "streaming".to_owned(),
            ],
            methods: Vec::new(),
            endpoint: "http://127.0.0.1:8080/rpc".to_owned(),
            protocol_version: "0.3".to_owned(),
        }
    }
}

impl LocalAgentConfig {
    /// Converts the configured card into a registration request.
    #[must_use]
    pub fn to_request(&self) -> RegisterAgentRequest {
        let methods = if self.methods.is_empty() {
            Method::ALL
                .iter()
                .map(|method| method.name().to_owned())
                .collect()
        } else {
            self.methods.clone()
        };
        RegisterAgentRequest::new(&*self.id, &*self.endpoint, &*self.protocol_version)
            .with_name(&*self.name)
            .with_description(&*self.description)
            .with_version(&*self.version)
            .with_capabilities(self.capabilities.iter().cloned())
            .with_methods(methods)
    }
}

/// Hub configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HubConfig {
    /// Socket address the HTTP server binds.
    pub bind_address: SocketAddr,
    /// Outbound events buffered per streaming connection.
    pub queue_capacity: usize,
    /// Seconds between keepalive events.
    pub keepalive_interval_secs: u64,
    /// Discovery page size when the request does not give one.
    pub default_page_limit: usize,
    /// Upper bound on any discovery page size.
    pub max_page_limit: usize,
    /// Log output format.
    pub log_format: LogFormat,
    /// Card served as the discovery document.
    pub local_agent: LocalAgentConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        let limits = DiscoveryLimits::default();
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            keepalive_interval_secs: 15,
            default_page_limit: limits.default_limit,
            max_page_limit: limits.max_limit,
            log_format: LogFormat::default(),
            local_agent: LocalAgentConfig::default(),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

impl HubConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// [`ConfigError::Invalid`] when a value is out of range.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// as [`HubConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be at least 1"));
        }
        if self.keepalive_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "keepalive_interval_secs must be at least 1",
            ));
        }
        if self.default_page_limit == 0 {
            return Err(ConfigError::Invalid(
                "default_page_limit must be at least 1",
            ));
        }
        if self.default_page_limit > self.max_page_limit {
            return Err(ConfigError::Invalid(
                "default_page_limit must not exceed max_page_limit",
            ));
        }
        Ok(())
    }

    /// Returns the keepalive period.
    #[must_use]
    pub const fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    /// Returns the discovery page bounds.
    #[must_use]
    pub const fn discovery_limits(&self) -> DiscoveryLimits {
        DiscoveryLimits {
            default_limit: self.default_page_limit,
            max_limit: self.max_page_limit,
        }
    }
}

#[cfg(test)]
mod tests;
