//! Manifest encoding and decoding
//!
//! A manifest is a plain-text file with one hex-encoded chunk identifier
//! per line, in the order the chunks appeared in the source file. That
//! order is the only record of the original byte order; reordering or
//! dropping a line corrupts reconstruction. There is no header, no
//! checksum and no count field.
//!
//! The manifest lives next to the source file under the reserved
//! `.dvm` extension. Restoration writes to a `_restored` sibling so the
//! original file is never overwritten.

use crate::chunk::ChunkId;
use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Reserved extension for manifest files
pub const MANIFEST_EXTENSION: &str = "dvm";

/// Derive the manifest path for a source file by appending the
/// reserved extension
pub fn manifest_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_os_string();
    name.push(".");
    name.push(MANIFEST_EXTENSION);
    PathBuf::from(name)
}

/// Derive the restore target for a manifest path
///
/// Strips the manifest extension and inserts `_restored` before the
/// original file's extension: `report.pdf.dvm` restores to
/// `report_restored.pdf`. Fails if the path does not carry the
/// manifest extension.
pub fn restore_target(manifest: &Path) -> Result<PathBuf> {
    check_extension(manifest)?;

    let original = manifest.with_extension("");
    let stem = original
        .file_stem()
        .and_then(OsStr::to_str)
        .ok_or_else(|| Error::BadManifestPath(manifest.to_path_buf()))?;

    let target_name = match original.extension().and_then(OsStr::to_str) {
        Some(ext) => format!("{stem}_restored.{ext}"),
        None => format!("{stem}_restored"),
    };

    Ok(original.with_file_name(target_name))
}

fn check_extension(path: &Path) -> Result<()> {
    if path.extension().and_then(OsStr::to_str) != Some(MANIFEST_EXTENSION) {
        return Err(Error::BadManifestPath(path.to_path_buf()));
    }
    Ok(())
}

/// Writer appending chunk identifiers to a manifest file
///
/// Lines are buffered while the store loop runs; `finish` flushes them.
/// No durability beyond that flush is promised.
pub struct ManifestWriter {
    inner: BufWriter<File>,
    count: usize,
}

impl ManifestWriter {
    /// Create (or truncate) the manifest at `path`
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(ManifestWriter {
            inner: BufWriter::new(file),
            count: 0,
        })
    }

    /// Append one identifier as a new line
    pub fn append(&mut self, id: &ChunkId) -> Result<()> {
        writeln!(self.inner, "{id}")?;
        self.count += 1;
        Ok(())
    }

    /// Number of identifiers written so far
    pub fn count(&self) -> usize {
        self.count
    }

    /// Flush all buffered lines to disk
    pub fn finish(mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Reader parsing a manifest back into an ordered identifier list
#[derive(Debug)]
pub struct ManifestReader {
    inner: BufReader<File>,
}

impl ManifestReader {
    /// Open a manifest for reading
    ///
    /// The extension is validated before any file is touched, so a
    /// wrong path fails without filesystem side effects.
    pub fn open(path: &Path) -> Result<Self> {
        check_extension(path)?;
        let file = File::open(path)?;
        Ok(ManifestReader {
            inner: BufReader::new(file),
        })
    }

    /// Parse all identifiers in file order
    ///
    /// Parsing is strict: any line that is not a valid hex identifier
    /// aborts the whole read, rather than letting corrupt bytes reach
    /// the store as a lookup key.
    pub fn read_all(self) -> Result<Vec<ChunkId>> {
        let mut ids = Vec::new();

        for (index, line) in self.inner.lines().enumerate() {
            let line = line?;
            let id = ChunkId::from_hex(line.trim()).map_err(|e| Error::ManifestFormat {
                line: index + 1,
                reason: e.to_string(),
            })?;
            ids.push(id);
        }

        Ok(ids)
    }
}
