//! Reporting hooks for best-effort attribute copies

use std::fmt;
use std::io;
use std::path::Path;

use tracing::warn;

/// File attribute preserved on a best-effort basis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAttribute {
    /// Modification time
    Modified,
    /// Unix permission bits
    Permissions,
}

impl fmt::Display for FileAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modified => write!(f, "modification time"),
            Self::Permissions => write!(f, "permissions"),
        }
    }
}

/// Capability for observing attribute copies that had to be skipped.
///
/// An attribute the filesystem or archive cannot represent is omitted, never
/// an extraction failure; implementations decide what to do with the report.
pub trait AttributeReporter {
    /// Called once per skipped attribute
    fn attribute_skipped(&mut self, path: &Path, attribute: FileAttribute, error: &io::Error);
}

/// Default reporter that routes skipped attributes to the log
pub struct LogReporter;

impl AttributeReporter for LogReporter {
    fn attribute_skipped(&mut self, path: &Path, attribute: FileAttribute, error: &io::Error) {
        warn!(path = ?path, attribute = %attribute, error = %error, "Skipping attribute copy");
    }
}
