//! Files tracked under a single root directory.

use crate::error::{Result, TxnError, UndoFailure};
use crate::fs::dir::ScopedDir;
use crate::fs::options::WriteOptions;
use crate::fs::snapshot::{TrackedFile, resolve};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A root directory and every file opened under it, in first-open order.
///
/// Each distinct path is tracked once. Reopening a path writes to it again
/// but keeps the snapshot taken on the first open, so rollback always
/// returns it to its pre-transaction state.
#[derive(Debug)]
pub struct FileScope {
    root: PathBuf,
    files: Vec<TrackedFile>,
    index: HashMap<PathBuf, usize>,
}

impl FileScope {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tracked files in the order they were first opened.
    pub fn files(&self) -> &[TrackedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Opens `relative` for writing and hands the file to `writer`.
    ///
    /// The path is snapshotted and recorded before the file is opened, so a
    /// failing writer still leaves the path restorable by [`rollback`].
    /// The file is closed before this returns, on success or error.
    ///
    /// [`rollback`]: FileScope::rollback
    pub fn open<F, R>(
        &mut self,
        relative: impl AsRef<Path>,
        options: WriteOptions,
        writer: F,
    ) -> Result<R>
    where
        F: FnOnce(&mut File) -> io::Result<R>,
    {
        let tracked = self.track(relative.as_ref())?;
        let mut file = tracked.open(&options)?;

        log::debug!(
            "Writing {} ({})",
            tracked.path().display(),
            options.mode()
        );

        writer(&mut file).map_err(|source| {
            log::error!("Failed to write {}: {}", tracked.path().display(), source);
            TxnError::Write {
                path: tracked.path().to_path_buf(),
                source,
            }
        })
    }

    /// Replaces the content of `relative` with `contents`.
    pub fn write(&mut self, relative: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
        self.open(relative, WriteOptions::default(), |f| {
            f.write_all(contents.as_ref())
        })
    }

    /// Creates `relative` as an empty file, truncating it if present.
    pub fn create_file(&mut self, relative: impl AsRef<Path>) -> Result<()> {
        self.open(relative, WriteOptions::default(), |_| Ok(()))
    }

    /// Creates a directory under the root. Not undone by rollback.
    pub fn create_dir(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = ScopedDir::new(&self.root, relative)?;
        dir.create()?;
        Ok(dir.path().to_path_buf())
    }

    /// Undoes every tracked file, continuing past failures.
    pub fn rollback(&self) -> Result<()> {
        let mut failures = Vec::new();
        self.undo_into(&mut failures);

        if failures.is_empty() {
            log::info!("Rolled back {} file(s) under {}", self.len(), self.root.display());
            Ok(())
        } else {
            Err(TxnError::RollbackFailed(failures))
        }
    }

    /// Undoes every tracked file in first-open order, recording failures.
    pub(crate) fn undo_into(&self, failures: &mut Vec<UndoFailure>) {
        for tracked in &self.files {
            if let Err(error) = tracked.undo() {
                log::warn!("Failed to undo {}: {}", tracked.path().display(), error);
                failures.push(UndoFailure {
                    path: tracked.path().to_path_buf(),
                    error,
                });
            }
        }
    }

    fn track(&mut self, relative: &Path) -> Result<&TrackedFile> {
        let path = resolve(&self.root, relative)?;

        let idx = match self.index.get(&path) {
            Some(&idx) => {
                log::debug!("Already tracked, keeping first snapshot: {}", path.display());
                idx
            }
            None => {
                let tracked = TrackedFile::load(&self.root, relative)?;
                self.files.push(tracked);
                let idx = self.files.len() - 1;
                self.index.insert(path, idx);
                idx
            }
        };

        Ok(&self.files[idx])
    }
}
