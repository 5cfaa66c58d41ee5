//! Archive tree model and extraction entry points

pub mod extract;
pub mod reader;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::{Error, Result};
use extract::{ExtractionSummary, TreeExtractor};
use reader::ArchiveSession;

/// One node of an archive's internal tree.
///
/// Entries are value objects produced by directory listings; they are valid
/// only for the session that yielded them.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Path within the archive (relative to the archive root)
    pub path: PathBuf,
    /// Final path segment
    pub name: String,
    /// Entry kind plus file payload metadata
    pub kind: EntryKind,
    /// Modification time (Unix timestamp), when the archive records one
    pub mtime: Option<i64>,
    /// Unix permission bits, when the archive records them
    pub mode: Option<u32>,
}

/// Kind of an archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Directory, listed explicitly or implied by a descendant path
    Directory,
    /// File; `index` is the session-private handle for its content stream
    File {
        /// Uncompressed size in bytes
        size: u64,
        /// Position in the archive's central directory
        index: usize,
    },
}

impl ArchiveEntry {
    /// Whether this entry is a directory
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    /// Whether this entry is a file
    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File { .. })
    }

    /// Uncompressed size for files, `None` for directories
    pub fn size(&self) -> Option<u64> {
        match self.kind {
            EntryKind::File { size, .. } => Some(size),
            EntryKind::Directory => None,
        }
    }
}

/// Extract an archive's whole tree into `destination`.
///
/// Opens the archive, creates the destination root if it is absent, and
/// mirrors every root entry. Extraction is all-or-nothing from the caller's
/// perspective: the first failure aborts the run, though files written
/// before the failure point remain on disk.
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
) -> Result<ExtractionSummary> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    info!(source = ?source, destination = ?destination, "Starting extraction");

    // Open first: a missing or corrupt archive must fail before anything
    // is touched under the destination
    let mut session = ArchiveSession::open(source)?;
    prepare_destination(destination)?;

    let roots = session.root_entries();
    let mut extractor = TreeExtractor::new(&mut session);
    for root in &roots {
        extractor.extract(root, destination)?;
    }

    let summary = extractor.summary();
    info!(
        dirs = summary.dirs_created,
        files = summary.files_extracted,
        bytes = summary.bytes_copied,
        "Extraction complete"
    );
    Ok(summary)
}

/// Make sure the destination root exists and is a directory
fn prepare_destination(destination: &Path) -> Result<()> {
    match fs::metadata(destination) {
        Ok(existing) if existing.is_dir() => Ok(()),
        Ok(_) => Err(Error::DirectoryCreate {
            path: destination.to_path_buf(),
            reason: "destination points to a file".to_string(),
        }),
        Err(_) => fs::create_dir_all(destination).map_err(|error| Error::DirectoryCreate {
            path: destination.to_path_buf(),
            reason: error.to_string(),
        }),
    }
}
