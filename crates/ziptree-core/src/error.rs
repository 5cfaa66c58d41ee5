//! Error types for ziptree-core

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for the ziptree library
#[derive(Error, Debug)]
pub enum Error {
    /// Archive cannot be opened or parsed
    #[error("cannot open archive {path:?}: {reason}")]
    Open { path: PathBuf, reason: String },

    /// A specific entry's metadata or content cannot be read
    #[error("cannot read archive entry {path:?}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// A destination directory cannot be created, or the destination path
    /// holds something that is not a directory
    #[error("cannot create directory {path:?}: {reason}")]
    DirectoryCreate { path: PathBuf, reason: String },

    /// File content copy failed
    #[error("cannot copy file to {path:?}: {reason}")]
    Copy { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
