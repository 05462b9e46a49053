//! Error types for dhtvault

use crate::chunk::ChunkId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in dhtvault operations
#[derive(Debug, Error)]
pub enum Error {
    /// File open/read/write/delete failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The given path does not carry the reserved manifest extension
    #[error("not a manifest file (expected a '.dvm' file): {}", .0.display())]
    BadManifestPath(PathBuf),

    /// A manifest line could not be parsed as a chunk identifier
    #[error("malformed manifest line {line}: {reason}")]
    ManifestFormat { line: usize, reason: String },

    /// A manifest-referenced chunk is absent from the store
    #[error("chunk {0} not found in the store")]
    ChunkNotFound(ChunkId),

    /// Store backend failure (transport, not "value absent")
    #[error("store error: {0}")]
    Store(String),

    /// Configuration file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration was read but contains invalid values
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;
