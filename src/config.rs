//! Configuration for yakv
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{KvError, Result};

/// Main configuration for a yakv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Transaction Log Configuration
    // -------------------------------------------------------------------------
    /// Path of the transaction log. Created on first start, never truncated.
    pub log_path: PathBuf,

    /// Capacity of the writer's bounded queue. Producers block once it is full.
    pub queue_capacity: usize,

    /// Whether writers wait for their own record to be appended
    pub durability: Durability,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen host
    pub host: String,

    /// HTTP listen port
    pub port: u16,

    /// Largest accepted request body (bytes)
    pub max_body_bytes: usize,
}

/// Durability contract between a mutating caller and the transaction log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Durability {
    /// Enqueue and return. Failed appends only reach the failure sink.
    #[default]
    Async,

    /// Block until the caller's own record is appended and return its result.
    Acknowledged,
}

impl fmt::Display for Durability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Durability::Async => f.write_str("async"),
            Durability::Acknowledged => f.write_str("acknowledged"),
        }
    }
}

impl FromStr for Durability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "async" => Ok(Durability::Async),
            "acknowledged" | "ack" => Ok(Durability::Acknowledged),
            other => Err(format!(
                "unknown durability mode '{}' (expected 'async' or 'acknowledged')",
                other
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("transaction.log"),
            queue_capacity: 16,
            durability: Durability::Async,
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_body_bytes: 1024 * 1024, // 1 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` the HTTP server binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject settings the engine cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.log_path.as_os_str().is_empty() {
            return Err(KvError::Config("log path must not be empty".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(KvError::Config(
                "max body size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the transaction log path
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// Set the writer queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the durability mode
    pub fn durability(mut self, durability: Durability) -> Self {
        self.config.durability = durability;
        self
    }

    /// Set the HTTP listen host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the HTTP listen port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the request body limit (in bytes)
    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.config.max_body_bytes = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
