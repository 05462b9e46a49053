//! File chunking
//!
//! Splits a byte source into fixed-size windows. Every chunk has the
//! configured size except the last, which holds whatever remains.
//! Empty input yields zero chunks, and input of exactly `k` windows
//! yields exactly `k` chunks, never a trailing empty one.

use crate::chunk::ChunkId;
use crate::error::{Error, Result};
use std::io::Read;

/// A chunk of data together with its content address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Content-based ID
    pub id: ChunkId,
    /// Byte offset within the original file
    pub offset: u64,
    /// Raw data
    pub data: Vec<u8>,
}

impl Chunk {
    /// Create a new chunk from data
    pub fn new(data: Vec<u8>, offset: u64) -> Self {
        let id = ChunkId::from_data(&data);
        Chunk { id, offset, data }
    }
}

/// Chunker for splitting byte sources into fixed-size chunks
///
/// `chunk_size` must be greater than zero; the configuration layer
/// enforces this before a chunker is ever built.
pub struct Chunker {
    chunk_size: usize,
}

impl Chunker {
    /// Create a chunker with the given window size in bytes
    pub fn new(chunk_size: usize) -> Self {
        Chunker { chunk_size }
    }

    /// Get the configured chunk size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split in-memory data into chunks
    pub fn chunk_data(&self, data: &[u8]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut offset = 0u64;

        for window in data.chunks(self.chunk_size) {
            chunks.push(Chunk::new(window.to_vec(), offset));
            offset += window.len() as u64;
        }

        chunks
    }

    /// Lazily split a reader into chunks
    ///
    /// The returned stream pulls one window at a time, so only a single
    /// chunk is held in memory while a file is being archived.
    pub fn split<R: Read>(&self, reader: R) -> ChunkStream<R> {
        ChunkStream {
            reader,
            chunk_size: self.chunk_size,
            offset: 0,
            done: false,
        }
    }

    /// Read a full source into a chunk list
    pub fn chunk_reader<R: Read>(&self, reader: R) -> Result<Vec<Chunk>> {
        self.split(reader).collect()
    }
}

/// Lazy sequence of chunks pulled from a reader
pub struct ChunkStream<R> {
    reader: R,
    chunk_size: usize,
    offset: u64,
    done: bool,
}

impl<R: Read> ChunkStream<R> {
    /// Pull the next chunk, or `None` once the source is exhausted
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        if self.done {
            return Ok(None);
        }

        let mut buffer = vec![0u8; self.chunk_size];
        let mut filled = 0;

        // Read until the window is full or EOF
        while filled < self.chunk_size {
            match self.reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) => {
                    self.done = true;
                    return Err(Error::Io(e));
                }
            }
        }

        if filled == 0 {
            self.done = true;
            return Ok(None);
        }

        // A short window means EOF was reached
        if filled < self.chunk_size {
            self.done = true;
        }

        buffer.truncate(filled);
        let chunk = Chunk::new(buffer, self.offset);
        self.offset += filled as u64;
        Ok(Some(chunk))
    }
}

impl<R: Read> Iterator for ChunkStream<R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}
