//! Depth-first tree extraction onto the real filesystem

use std::fs::{self, File};
use std::io;
use std::path::Path;

use filetime::FileTime;
use tracing::debug;

use super::reader::ArchiveSession;
use super::{ArchiveEntry, EntryKind};
use crate::report::{AttributeReporter, FileAttribute, LogReporter};
use crate::{Error, Result};

/// Recursion ceiling against malformed archives claiming absurd nesting
pub const MAX_DEPTH: usize = 64;

/// Counters for one extraction run
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionSummary {
    /// Directories created on disk
    pub dirs_created: u64,
    /// Files written on disk
    pub files_extracted: u64,
    /// File content bytes written
    pub bytes_copied: u64,
}

/// Mirrors an archive subtree onto disk.
///
/// Borrows the session exclusively for one run. Attribute-copy failures are
/// routed to the injected [`AttributeReporter`] instead of failing the run;
/// everything else aborts on first error.
pub struct TreeExtractor<'a> {
    session: &'a mut ArchiveSession,
    reporter: Box<dyn AttributeReporter>,
    summary: ExtractionSummary,
}

impl<'a> TreeExtractor<'a> {
    /// Create an extractor logging skipped attributes via `tracing`
    pub fn new(session: &'a mut ArchiveSession) -> Self {
        Self::with_reporter(session, Box::new(LogReporter))
    }

    /// Create an extractor with a custom attribute reporter
    pub fn with_reporter(
        session: &'a mut ArchiveSession,
        reporter: Box<dyn AttributeReporter>,
    ) -> Self {
        Self {
            session,
            reporter,
            summary: ExtractionSummary::default(),
        }
    }

    /// Counters accumulated so far
    pub fn summary(&self) -> ExtractionSummary {
        self.summary
    }

    /// Mirror `entry`'s children into `destination`, depth-first, pre-order.
    ///
    /// Directories are materialized before their descendants; files replace
    /// any existing file at the same path, so a re-run converges to the same
    /// tree. The first failing child aborts the whole call.
    pub fn extract(&mut self, entry: &ArchiveEntry, destination: &Path) -> Result<()> {
        self.mirror(entry, destination, 0)
    }

    fn mirror(&mut self, entry: &ArchiveEntry, destination: &Path, depth: usize) -> Result<()> {
        if depth >= MAX_DEPTH {
            return Err(Error::Read {
                path: entry.path.clone(),
                reason: format!("directory nesting exceeds {} levels", MAX_DEPTH),
            });
        }

        for child in self.session.list_children(entry)? {
            let target = destination.join(&child.name);

            match child.kind {
                EntryKind::Directory => {
                    self.ensure_directory(&target)?;
                    self.mirror(&child, &target, depth + 1)?;
                    // applied after the subtree: child writes would clobber
                    // the directory mtime, and a restrictive mode could
                    // block child creation
                    self.apply_attributes(&child, &target);
                }
                EntryKind::File { .. } => {
                    debug!(entry = ?child.path, target = ?target, "Copying file");
                    let written = self.copy_file(&child, &target)?;
                    self.summary.files_extracted += 1;
                    self.summary.bytes_copied += written;
                    self.apply_attributes(&child, &target);
                }
            }
        }

        Ok(())
    }

    fn ensure_directory(&mut self, target: &Path) -> Result<()> {
        match fs::symlink_metadata(target) {
            Ok(existing) if existing.is_dir() => Ok(()),
            Ok(_) => Err(Error::DirectoryCreate {
                path: target.to_path_buf(),
                reason: "destination exists and is not a directory".to_string(),
            }),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(target = ?target, "Creating directory");
                fs::create_dir(target).map_err(|error| Error::DirectoryCreate {
                    path: target.to_path_buf(),
                    reason: error.to_string(),
                })?;
                self.summary.dirs_created += 1;
                Ok(())
            }
            Err(error) => Err(Error::DirectoryCreate {
                path: target.to_path_buf(),
                reason: error.to_string(),
            }),
        }
    }

    fn copy_file(&mut self, entry: &ArchiveEntry, target: &Path) -> Result<u64> {
        let mut content = self.session.open_content(entry)?;
        // File::create truncates, so a re-run replaces whatever a previous
        // run or the user left at this path
        let mut output = File::create(target).map_err(|error| Error::Copy {
            path: target.to_path_buf(),
            reason: error.to_string(),
        })?;
        io::copy(&mut content, &mut output).map_err(|error| Error::Copy {
            path: target.to_path_buf(),
            reason: error.to_string(),
        })
    }

    fn apply_attributes(&mut self, entry: &ArchiveEntry, target: &Path) {
        #[cfg(unix)]
        if let Some(mode) = entry.mode {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(mode & 0o777);
            if let Err(error) = fs::set_permissions(target, permissions) {
                self.reporter
                    .attribute_skipped(target, FileAttribute::Permissions, &error);
            }
        }

        if let Some(mtime) = entry.mtime {
            let mtime = FileTime::from_unix_time(mtime, 0);
            if let Err(error) = filetime::set_file_mtime(target, mtime) {
                self.reporter
                    .attribute_skipped(target, FileAttribute::Modified, &error);
            }
        }
    }
}
