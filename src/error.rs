//! Error types for txfs.
//!
//! All operations return `Result<T>` which aliases `Result<T, TxnError>`.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from transactional file operations.
#[derive(Debug, Error)]
pub enum TxnError {
    /// Capturing the pre-transaction state of a path failed.
    ///
    /// Nothing was tracked for the path, so rollback has nothing to undo.
    #[error("Failed to snapshot {}: {source}", .path.display())]
    Snapshot { path: PathBuf, source: io::Error },

    /// Opening or writing a tracked file failed.
    ///
    /// The path stays tracked and is still undone by rollback.
    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    /// Directory helper failed.
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    /// Invalid path handed to a scope.
    #[error("Invalid path '{0}': {1}")]
    InvalidPath(String, String),

    /// One or more undo steps failed during a rollback sweep.
    #[error("Rollback failed for {} path(s): {}", .0.len(), join_failures(.0))]
    RollbackFailed(Vec<UndoFailure>),

    /// Malformed plan file.
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// File system operation failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// TOML parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml_edit::TomlError),

    /// Unexpected error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single path that could not be restored during rollback.
#[derive(Debug)]
pub struct UndoFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

impl fmt::Display for UndoFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

fn join_failures(failures: &[UndoFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for txfs operations.
pub type Result<T> = std::result::Result<T, TxnError>;
