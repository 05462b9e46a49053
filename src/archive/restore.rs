//! Restore pipeline
//!
//! Reads a manifest and reassembles the original file, fetching one
//! chunk at a time in manifest order. Each lookup blocks until the
//! store answers; chunk `i + 1` is not fetched before chunk `i` has
//! been written. A chunk the store cannot resolve is fatal: the
//! partially written output is deleted and the unresolved identifier
//! is surfaced to the caller.

use crate::error::{Error, Result};
use crate::manifest::{self, ManifestReader};
use crate::store::ChunkStore;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Restore a file from its manifest
///
/// The manifest extension is validated before anything is opened or
/// created. The restored file lands next to the manifest under the
/// `_restored` naming convention; returns the number of bytes written.
///
/// The store may hold several values under one identifier; the first
/// one is used. No integrity check happens beyond lookup success, so a
/// manifest with reordered lines restores a file with reordered chunks.
pub fn restore_file(store: &dyn ChunkStore, manifest_path: &Path) -> Result<u64> {
    let ids = ManifestReader::open(manifest_path)?.read_all()?;
    let target = manifest::restore_target(manifest_path)?;

    let mut output = BufWriter::new(File::create(&target)?);
    let mut written = 0u64;

    for id in &ids {
        let values = match store.get(id) {
            Ok(values) => values,
            Err(e) => {
                discard_partial(&mut output, &target);
                return Err(e);
            }
        };

        let Some(blob) = values.first() else {
            warn!(chunk = %id, "chunk could not be resolved, aborting restore");
            discard_partial(&mut output, &target);
            return Err(Error::ChunkNotFound(*id));
        };

        output.write_all(blob)?;
        written += blob.len() as u64;
        debug!(chunk = %id, bytes = blob.len(), "chunk restored");
    }

    output.flush()?;
    info!(
        bytes = written,
        target = %target.display(),
        "file restored"
    );

    Ok(written)
}

/// Best-effort removal of a partial restore output
///
/// Deletion failure is reported but does not change the overall failed
/// outcome.
fn discard_partial(output: &mut BufWriter<File>, target: &Path) {
    let _ = output.flush();
    if let Err(e) = fs::remove_file(target) {
        warn!(
            target = %target.display(),
            error = %e,
            "could not delete partial restore output, consider deleting it manually"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::store::store_file;
    use crate::chunk::ChunkId;
    use crate::manifest::ManifestWriter;
    use crate::store::MemoryStore;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const CHUNK_SIZE: usize = 64;

    fn write_source(dir: &TempDir, name: &str, len: usize) -> PathBuf {
        let path = dir.path().join(name);
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, data).unwrap();
        path
    }

    async fn store_and_confirm(
        store: &MemoryStore,
        source: &Path,
    ) -> PathBuf {
        let receipt = store_file(store, source, CHUNK_SIZE).await.unwrap();
        let manifest_path = receipt.manifest_path.clone();
        let stats = receipt.wait_confirmed().await;
        assert_eq!(stats.failed, 0);
        manifest_path
    }

    #[tokio::test]
    async fn test_roundtrip_reproduces_source() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(1024 * 1024);
        let source = write_source(&dir, "data.bin", CHUNK_SIZE * 3 + 17);

        let manifest_path = store_and_confirm(&store, &source).await;
        let written = restore_file(&store, &manifest_path).unwrap();

        let restored = dir.path().join("data_restored.bin");
        assert_eq!(written, (CHUNK_SIZE * 3 + 17) as u64);
        assert_eq!(fs::read(&restored).unwrap(), fs::read(&source).unwrap());
    }

    #[tokio::test]
    async fn test_roundtrip_empty_file() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(1024);
        let source = write_source(&dir, "empty.bin", 0);

        let manifest_path = store_and_confirm(&store, &source).await;
        let written = restore_file(&store, &manifest_path).unwrap();

        assert_eq!(written, 0);
        let restored = dir.path().join("empty_restored.bin");
        assert!(fs::read(&restored).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_chunk_aborts_and_deletes_output() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(1024 * 1024);
        let source = write_source(&dir, "data.bin", CHUNK_SIZE * 3);

        let manifest_path = store_and_confirm(&store, &source).await;

        // Drop the middle chunk from the store
        let data = fs::read(&source).unwrap();
        let missing = ChunkId::from_data(&data[CHUNK_SIZE..CHUNK_SIZE * 2]);
        assert!(store.remove(&missing));

        let err = restore_file(&store, &manifest_path).unwrap_err();
        match err {
            Error::ChunkNotFound(id) => assert_eq!(id, missing),
            other => panic!("expected ChunkNotFound, got {other:?}"),
        }

        // The partial output must be gone
        assert!(!dir.path().join("data_restored.bin").exists());
    }

    #[tokio::test]
    async fn test_swapped_manifest_lines_swap_chunks() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(1024 * 1024);
        let source = write_source(&dir, "data.bin", CHUNK_SIZE * 2);
        let data = fs::read(&source).unwrap();

        let manifest_path = store_and_confirm(&store, &source).await;

        // Swap the two lines; restore must succeed with swapped content
        let ids = ManifestReader::open(&manifest_path)
            .unwrap()
            .read_all()
            .unwrap();
        let mut writer = ManifestWriter::create(&manifest_path).unwrap();
        writer.append(&ids[1]).unwrap();
        writer.append(&ids[0]).unwrap();
        writer.finish().unwrap();

        restore_file(&store, &manifest_path).unwrap();

        let mut expected = data[CHUNK_SIZE..].to_vec();
        expected.extend_from_slice(&data[..CHUNK_SIZE]);
        let restored = fs::read(dir.path().join("data_restored.bin")).unwrap();
        assert_eq!(restored, expected);
    }

    #[test]
    fn test_store_error_aborts_and_deletes_output() {
        struct FailingStore;

        impl ChunkStore for FailingStore {
            fn put(&self, _id: &ChunkId, _data: Vec<u8>) -> tokio::sync::oneshot::Receiver<bool> {
                let (confirm, rx) = tokio::sync::oneshot::channel();
                let _ = confirm.send(false);
                rx
            }

            fn get(&self, _id: &ChunkId) -> crate::error::Result<Vec<Vec<u8>>> {
                Err(Error::Store("connection lost".to_string()))
            }
        }

        let dir = TempDir::new().unwrap();
        let manifest_path = dir.path().join("doomed.dvm");
        let mut writer = ManifestWriter::create(&manifest_path).unwrap();
        writer.append(&ChunkId::from_data(b"chunk")).unwrap();
        writer.finish().unwrap();

        let err = restore_file(&FailingStore, &manifest_path).unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert!(!dir.path().join("doomed_restored").exists());
    }

    #[test]
    fn test_wrong_extension_touches_no_file() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(1024);
        let bogus = dir.path().join("file.txt");

        let err = restore_file(&store, &bogus).unwrap_err();
        assert!(matches!(err, Error::BadManifestPath(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_first_value_wins_on_multi_value_keys() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(1024);

        let first = b"first value".to_vec();
        let id = ChunkId::from_data(&first);
        store.put(&id, first.clone()).await.unwrap();
        // A second, conflicting value under the same key
        store.put(&id, b"second value".to_vec()).await.unwrap();

        let manifest_path = dir.path().join("multi.dvm");
        let mut writer = ManifestWriter::create(&manifest_path).unwrap();
        writer.append(&id).unwrap();
        writer.finish().unwrap();

        restore_file(&store, &manifest_path).unwrap();
        let restored = fs::read(dir.path().join("multi_restored")).unwrap();
        assert_eq!(restored, first);
    }
}
