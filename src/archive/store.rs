//! Store pipeline
//!
//! Splits a file into chunks, submits each chunk to the store, and
//! appends its identifier to the manifest immediately, without
//! waiting for the put to complete. The manifest therefore commits
//! optimistically: it can reference a chunk whose replication later
//! fails. Completions are watched on background tasks and logged;
//! a failed put is never escalated and never retried.
//!
//! Callers that do want replication guarantees can hold on to the
//! returned [`StoreReceipt`] and await [`StoreReceipt::wait_confirmed`],
//! which distinguishes "all chunks submitted" from "all chunks
//! confirmed".

use crate::chunk::Chunker;
use crate::error::Result;
use crate::manifest::{self, ManifestWriter};
use crate::store::ChunkStore;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Outcome of a finished store operation
///
/// Holding the receipt is optional: dropping it keeps the original
/// fire-and-forget behavior, with put completions logged as they come
/// in.
#[derive(Debug)]
pub struct StoreReceipt {
    /// Number of chunks submitted to the store
    pub chunk_count: usize,
    /// Where the manifest was written
    pub manifest_path: PathBuf,
    outcomes: mpsc::UnboundedReceiver<bool>,
}

/// Put confirmation tally collected by [`StoreReceipt::wait_confirmed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutStats {
    /// Chunks submitted to the store
    pub submitted: usize,
    /// Chunks whose put completed successfully
    pub confirmed: usize,
    /// Chunks whose put completed with failure (or never completed)
    pub failed: usize,
}

impl StoreReceipt {
    /// Wait for every outstanding put to report a result
    ///
    /// Only after this returns with `failed == 0` is the manifest known
    /// to reference fully stored chunks.
    pub async fn wait_confirmed(mut self) -> PutStats {
        let mut confirmed = 0;
        let mut failed = 0;

        while let Some(ok) = self.outcomes.recv().await {
            if ok {
                confirmed += 1;
            } else {
                failed += 1;
            }
        }

        PutStats {
            submitted: self.chunk_count,
            confirmed,
            failed,
        }
    }
}

/// Store a file into the chunk store and write its manifest
///
/// The manifest lands next to the source file under the reserved
/// extension, one identifier per chunk in file order. Runs on the
/// current tokio runtime; put completions are observed on spawned
/// tasks.
pub async fn store_file(
    store: &dyn ChunkStore,
    source: &Path,
    chunk_size: usize,
) -> Result<StoreReceipt> {
    let file = File::open(source)?;
    let manifest_path = manifest::manifest_path(source);
    let mut writer = ManifestWriter::create(&manifest_path)?;

    let chunker = Chunker::new(chunk_size);
    let (outcome_tx, outcomes) = mpsc::unbounded_channel();

    for chunk in chunker.split(BufReader::new(file)) {
        let chunk = chunk?;
        let confirmation = store.put(&chunk.id, chunk.data);

        let id = chunk.id;
        let outcome_tx = outcome_tx.clone();
        tokio::spawn(async move {
            // A dropped sender means the store gave up on this put
            let ok = confirmation.await.unwrap_or(false);
            if ok {
                debug!(chunk = %id, "put confirmed");
            } else {
                warn!(chunk = %id, "put failed, manifest still references this chunk");
            }
            let _ = outcome_tx.send(ok);
        });

        writer.append(&chunk.id)?;
    }

    let chunk_count = writer.count();
    writer.finish()?;
    drop(outcome_tx);

    info!(
        chunks = chunk_count,
        manifest = %manifest_path.display(),
        "file stored"
    );

    Ok(StoreReceipt {
        chunk_count,
        manifest_path,
        outcomes,
    })
}
