//! Error types for fb2fix operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while repairing an archive.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("FB2 file not found in {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("No such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Unreadable path: {0}")]
    Glob(#[from] glob::GlobError),
}

impl Error {
    /// Process exit status reported for this error by the command-line tool.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::DocumentNotFound(_) => 2,
            _ => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
