//! Configuration management for dhtvault

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default chunk size: 4 KiB
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Default per-node storage limit: 512 MB
///
/// Needs to be raised to hold larger amounts of data in a small group
/// of nodes.
pub const DEFAULT_STORAGE_LIMIT: u64 = 512 * 1024 * 1024;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Node and network configuration
    pub node: NodeConfig,

    /// Chunk configuration
    pub chunk: ChunkConfig,
}

/// Node and network configuration
///
/// Everything the store client needs to join (or found) a network.
/// The archiver itself never reads these; they are handed to whatever
/// constructs the store handle at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Port this node binds to
    pub port: u16,

    /// `host:port` of a known node to join through; `None` makes this
    /// node bootstrap a new network
    pub bootstrap: Option<String>,

    /// Send broadcast peer discovery requests over the local network
    pub peer_discovery: bool,

    /// Answer local peer discovery requests
    pub peer_publish: bool,

    /// Maximum bytes of values this node keeps
    pub storage_limit: u64,
}

/// Chunk configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Chunk window size in bytes
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            node: NodeConfig::default(),
            chunk: ChunkConfig::default(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            port: 4222,
            bootstrap: None,
            peer_discovery: true,
            peer_publish: true,
            storage_limit: DEFAULT_STORAGE_LIMIT,
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        ChunkConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from a file, with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load a config file if one exists, otherwise fall back to defaults
    ///
    /// Environment overrides and validation apply either way.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load(path);
        }

        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("DHTVAULT_PORT") {
            if let Ok(port) = port.trim().parse::<u16>() {
                self.node.port = port;
            }
        }

        if let Ok(bootstrap) = std::env::var("DHTVAULT_BOOTSTRAP") {
            let bootstrap = bootstrap.trim().to_string();
            if !bootstrap.is_empty() {
                self.node.bootstrap = Some(bootstrap);
            }
        }

        if let Ok(limit) = std::env::var("DHTVAULT_STORAGE_LIMIT") {
            if let Ok(limit) = limit.trim().parse::<u64>() {
                self.node.storage_limit = limit;
            }
        }

        if let Ok(size) = std::env::var("DHTVAULT_CHUNK_SIZE") {
            if let Ok(size) = size.trim().parse::<usize>() {
                self.chunk.chunk_size = size;
            }
        }
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.node.port == 0 {
            return Err(Error::InvalidConfig(
                "Node port must be greater than 0".to_string(),
            ));
        }

        if let Some(bootstrap) = &self.node.bootstrap {
            if !bootstrap.contains(':') {
                return Err(Error::InvalidConfig(format!(
                    "Bootstrap address '{}' must be host:port",
                    bootstrap
                )));
            }
        }

        if self.chunk.chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "Chunk size must be greater than 0".to_string(),
            ));
        }

        if self.chunk.chunk_size as u64 > self.node.storage_limit {
            return Err(Error::InvalidConfig(
                "Chunk size exceeds the node storage limit".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.node.port = 5000;
        config.node.bootstrap = Some("10.0.0.1:4222".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.node.port, 5000);
        assert_eq!(loaded.node.bootstrap.as_deref(), Some("10.0.0.1:4222"));
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let mut config = Config::default();
        config.chunk.chunk_size = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bootstrap_without_port_is_rejected() {
        let mut config = Config::default();
        config.node.bootstrap = Some("10.0.0.1".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(dir.path().join("missing.json")).unwrap();
        assert_eq!(config.chunk.chunk_size, DEFAULT_CHUNK_SIZE);
    }
}
