//! Chunk management module
//!
//! Handles splitting files into fixed-size chunks and deriving the
//! content address each chunk is stored under.

mod chunker;
mod id;

pub use chunker::{Chunk, ChunkStream, Chunker};
pub use id::ChunkId;
