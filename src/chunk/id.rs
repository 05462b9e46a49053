//! Content addressing for chunks
//!
//! A chunk identifier is the BLAKE3 hash of the chunk's bytes. Equal
//! bytes always produce an equal identifier, which is what makes the
//! store deduplicate identical chunks for free. The hash must stay
//! cryptographically collision-resistant: identifiers double as store
//! lookup keys, and a collision would silently substitute content.

use std::fmt;

/// Content-based chunk identifier (BLAKE3 hash, 32 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId([u8; 32]);

impl ChunkId {
    /// Compute the identifier of a byte sequence
    pub fn from_data(data: &[u8]) -> Self {
        ChunkId(blake3::hash(data).into())
    }

    /// Create an identifier from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        ChunkId(bytes)
    }

    /// Encode as lowercase hex (the manifest line format)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string; the input must be exactly 64 hex digits
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(ChunkId(arr))
    }

    /// Get the raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
