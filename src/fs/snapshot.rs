//! Pre-transaction state of a single path, and the tracked file that owns it.

use crate::error::{Result, TxnError};
use crate::fs::options::WriteOptions;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

/// What a path looked like before the transaction first touched it.
///
/// Captured once, before any write, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSnapshot {
    /// The path did not exist.
    Absent,
    /// The path existed with these bytes.
    Present(Vec<u8>),
}

impl FileSnapshot {
    /// Captures the current state of `path`.
    ///
    /// The existence check does not follow symlinks, so a dangling link is
    /// reported as an error instead of being treated as absent.
    pub fn capture(path: &Path) -> io::Result<Self> {
        match fs::symlink_metadata(path) {
            Ok(_) => Ok(FileSnapshot::Present(fs::read(path)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FileSnapshot::Absent),
            Err(e) => Err(e),
        }
    }

    pub fn existed(&self) -> bool {
        matches!(self, FileSnapshot::Present(_))
    }

    /// Original bytes, if the path existed.
    pub fn content(&self) -> Option<&[u8]> {
        match self {
            FileSnapshot::Absent => None,
            FileSnapshot::Present(content) => Some(content.as_slice()),
        }
    }

    /// Puts `path` back into the captured state.
    ///
    /// Removing an already-missing path is a no-op. A deleted pre-existing
    /// file is recreated with its original content.
    pub fn restore(&self, path: &Path) -> io::Result<()> {
        match self {
            FileSnapshot::Absent => match fs::remove_file(path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                result => result,
            },
            FileSnapshot::Present(content) => fs::write(path, content),
        }
    }
}

/// A path opened inside a transaction, paired with its snapshot.
///
/// Whether the file is new or pre-existing is decided in [`TrackedFile::load`]
/// and never changes.
#[derive(Debug, Clone)]
pub struct TrackedFile {
    path: PathBuf,
    snapshot: FileSnapshot,
}

impl TrackedFile {
    /// Resolves `relative` under `root` and snapshots it.
    ///
    /// Fails without tracking anything if the existence check or read fails.
    pub fn load(root: &Path, relative: &Path) -> Result<Self> {
        let path = resolve(root, relative)?;

        log::debug!("Capturing snapshot: {}", path.display());
        let snapshot = FileSnapshot::capture(&path).map_err(|source| {
            log::error!("Failed to snapshot {}: {}", path.display(), source);
            TxnError::Snapshot {
                path: path.clone(),
                source,
            }
        })?;

        Ok(Self { path, snapshot })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &FileSnapshot {
        &self.snapshot
    }

    /// Returns `true` if the path did not exist before the transaction.
    pub fn is_new(&self) -> bool {
        !self.snapshot.existed()
    }

    /// Opens the path for writing.
    pub fn open(&self, options: &WriteOptions) -> Result<File> {
        options.open(&self.path).map_err(|source| TxnError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Reverts the path to its snapshot.
    pub fn undo(&self) -> io::Result<()> {
        if self.is_new() {
            log::debug!("Removing new file: {}", self.path.display());
        } else {
            log::debug!("Restoring original: {}", self.path.display());
        }
        self.snapshot.restore(&self.path)
    }
}

/// Joins `relative` onto `root`, dropping `.` segments and repeated separators.
///
/// `..` is rejected: it could leave the root or alias another tracked path.
pub(crate) fn resolve(root: &Path, relative: &Path) -> Result<PathBuf> {
    if relative.has_root() {
        return Err(TxnError::InvalidPath(
            relative.display().to_string(),
            "must be relative to the scope root".to_string(),
        ));
    }

    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(TxnError::InvalidPath(
            relative.display().to_string(),
            "cannot contain '..'".to_string(),
        ));
    }

    if relative.as_os_str().is_empty() {
        return Err(TxnError::InvalidPath(
            String::new(),
            "cannot be empty".to_string(),
        ));
    }

    Ok(root
        .join(relative)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}
