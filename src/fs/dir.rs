//! Directory creation helper.
//!
//! Directories created here are not tracked: rollback never removes them.

use crate::error::{Result, TxnError};
use crate::fs::snapshot::resolve;
use std::fs;
use std::path::{Path, PathBuf};

/// A directory at `root` joined with a relative path.
#[derive(Debug, Clone)]
pub struct ScopedDir {
    path: PathBuf,
}

impl ScopedDir {
    pub fn new(root: &Path, relative: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            path: resolve(root, relative.as_ref())?,
        })
    }

    /// The root directory itself.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { path: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the directory. Fails if it already exists or its parent is missing.
    pub fn create(&self) -> Result<()> {
        fs::create_dir(&self.path).map_err(|source| self.error(source))?;
        log::debug!("Created directory: {}", self.path.display());
        Ok(())
    }

    /// Creates the directory and any missing parents. Succeeds if already present.
    pub fn create_all(&self) -> Result<()> {
        fs::create_dir_all(&self.path).map_err(|source| self.error(source))?;
        log::debug!("Ensured directory: {}", self.path.display());
        Ok(())
    }

    fn error(&self, source: std::io::Error) -> TxnError {
        TxnError::CreateDir {
            path: self.path.clone(),
            source,
        }
    }
}
