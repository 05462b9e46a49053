//! Store backend module
//!
//! The distributed key-value store is an external collaborator; this
//! crate only submits chunks to it and queries it. The [`ChunkStore`]
//! trait captures the two primitives the archiver needs, so a network
//! client and the in-memory backend are interchangeable. A single
//! handle is constructed at process start and shared by every
//! operation.

mod memory;

pub use memory::MemoryStore;

use crate::chunk::ChunkId;
use crate::error::Result;
use tokio::sync::oneshot;

/// Content-addressable key-value store, as seen by the archiver
pub trait ChunkStore: Send + Sync {
    /// Submit a value under a key, fire-and-forget
    ///
    /// Returns immediately with a receiver that resolves once the
    /// store has finished (or given up on) replicating the value. The
    /// confirmation may arrive at any later time, or never; a dropped
    /// sender reads as failure. Callers must not block the submit loop
    /// on it.
    fn put(&self, id: &ChunkId, data: Vec<u8>) -> oneshot::Receiver<bool>;

    /// Look up every value stored under a key, blocking until the
    /// store has answered
    ///
    /// An empty result means "not found", which a distributed store
    /// cannot distinguish from "not yet replicated". Errors are
    /// reserved for transport failures.
    fn get(&self, id: &ChunkId) -> Result<Vec<Vec<u8>>>;
}
