//! Multi-root file transactions with explicit rollback.
//!
//! A [`Transaction`] owns any number of [`FileScope`]s, each tracking the
//! files written under one root directory.
//!
//! ## Execution Guarantees
//!
//! - **Snapshot before write**: each path is captured on first touch
//! - **Implicit commit**: dropping the transaction keeps every write
//! - **Explicit rollback**: nothing is undone unless `rollback()` is called
//! - **Full sweep**: rollback visits every scope and file even if some fail
//!
//! ## Example
//!
//! ```no_run
//! # fn example() -> txfs::error::Result<()> {
//! use std::io::Write;
//! use txfs::fs::WriteOptions;
//!
//! txfs::start_transaction(|txn| {
//!     let site = txn.create_file_scope("/srv/site");
//!     site.write("index.html", "<h1>hi</h1>")?;
//!     site.open("access.log", WriteOptions::append(), |f| f.write_all(b"deploy\n"))?;
//!
//!     let conf = txn.create_file_scope("/etc/site");
//!     if let Err(e) = conf.write("site.conf", "listen 80") {
//!         txn.rollback()?;
//!         return Err(e);
//!     }
//!     Ok(())
//! })
//! # }
//! ```

use crate::error::{Result, TxnError};
use crate::fs::FileScope;
use std::path::PathBuf;

/// Top-level unit grouping file scopes.
///
/// Commit is implicit: stop using the transaction and let it drop.
#[must_use = "Transaction is committed on drop; call rollback() to undo"]
#[derive(Debug, Default)]
pub struct Transaction {
    scopes: Vec<FileScope>,
    rolled_back: bool,
}

/// Counts of tracked files by how they will be undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionStats {
    pub scopes: usize,
    pub files_created: usize,
    pub files_overwritten: usize,
    pub total: usize,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope rooted at `root` and returns it.
    ///
    /// Scopes are rolled back in creation order. Use [`scope_mut`] to get
    /// back to an earlier scope.
    ///
    /// [`scope_mut`]: Transaction::scope_mut
    pub fn create_file_scope(&mut self, root: impl Into<PathBuf>) -> &mut FileScope {
        let scope = FileScope::new(root);
        log::debug!("Created file scope: {}", scope.root().display());
        self.scopes.push(scope);
        let idx = self.scopes.len() - 1;
        &mut self.scopes[idx]
    }

    pub fn scope_mut(&mut self, index: usize) -> Option<&mut FileScope> {
        self.scopes.get_mut(index)
    }

    pub fn scopes(&self) -> &[FileScope] {
        &self.scopes
    }

    /// Total tracked files across all scopes.
    pub fn file_count(&self) -> usize {
        self.scopes.iter().map(FileScope::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }

    /// Returns true once `rollback()` has been called.
    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back
    }

    /// Undoes every tracked file in every scope.
    ///
    /// Scopes go in creation order, files in first-open order. A failed undo
    /// does not stop the sweep; all failures are returned together.
    /// Calling this again repeats the sweep.
    pub fn rollback(&mut self) -> Result<()> {
        log::warn!(
            "Rolling back {} file(s) across {} scope(s)...",
            self.file_count(),
            self.scopes.len()
        );

        let mut failures = Vec::new();
        for scope in &self.scopes {
            scope.undo_into(&mut failures);
        }
        self.rolled_back = true;

        if failures.is_empty() {
            log::info!("Rollback completed successfully");
            Ok(())
        } else {
            log::warn!("Rollback finished with {} failure(s)", failures.len());
            Err(TxnError::RollbackFailed(failures))
        }
    }

    /// Returns tracked file statistics.
    pub fn stats(&self) -> TransactionStats {
        let mut files_created = 0;
        let mut files_overwritten = 0;

        for file in self.scopes.iter().flat_map(|s| s.files()) {
            if file.is_new() {
                files_created += 1;
            } else {
                files_overwritten += 1;
            }
        }

        TransactionStats {
            scopes: self.scopes.len(),
            files_created,
            files_overwritten,
            total: files_created + files_overwritten,
        }
    }

    /// Returns a human-readable line per tracked file.
    pub fn preview(&self) -> Vec<String> {
        self.scopes
            .iter()
            .flat_map(|s| s.files())
            .map(|file| {
                if file.is_new() {
                    format!("Create: {}", file.path().display())
                } else {
                    format!("Overwrite: {}", file.path().display())
                }
            })
            .collect()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.rolled_back && !self.is_empty() {
            log::debug!("Transaction dropped; keeping {} file(s)", self.file_count());
        }
    }
}

/// Runs `f` against a fresh transaction and returns its result.
///
/// Returning commits. Call [`Transaction::rollback`] inside `f` to abort;
/// an error from `f` alone does not undo anything.
pub fn start_transaction<F, T>(f: F) -> T
where
    F: FnOnce(&mut Transaction) -> T,
{
    let mut txn = Transaction::new();
    f(&mut txn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_transaction() {
        let txn = Transaction::new();
        assert!(txn.is_empty());
        assert_eq!(txn.file_count(), 0);
        assert!(txn.scopes().is_empty());
        assert!(!txn.is_rolled_back());
    }

    #[test]
    fn test_create_file_scope_records_root() {
        let temp = TempDir::new().unwrap();
        let mut txn = Transaction::new();

        let scope = txn.create_file_scope(temp.path());
        assert_eq!(scope.root(), temp.path());
        assert_eq!(txn.scopes().len(), 1);
    }

    #[test]
    fn test_rollback_spans_scopes() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        fs::write(b.path().join("kept.txt"), "original").unwrap();

        let mut txn = Transaction::new();
        txn.create_file_scope(a.path()).write("new.txt", "x").unwrap();
        txn.create_file_scope(b.path())
            .write("kept.txt", "changed")
            .unwrap();

        txn.rollback().unwrap();

        assert!(txn.is_rolled_back());
        assert!(!a.path().join("new.txt").exists());
        assert_eq!(
            fs::read_to_string(b.path().join("kept.txt")).unwrap(),
            "original"
        );
    }

    #[test]
    fn test_scope_mut_returns_earlier_scope() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();

        let mut txn = Transaction::new();
        txn.create_file_scope(a.path());
        txn.create_file_scope(b.path());

        txn.scope_mut(0).unwrap().write("late.txt", "x").unwrap();
        assert!(txn.scope_mut(2).is_none());

        txn.rollback().unwrap();
        assert!(!a.path().join("late.txt").exists());
    }

    #[test]
    fn test_files_opened_after_rollback_are_undone_next_time() {
        let temp = TempDir::new().unwrap();
        let mut txn = Transaction::new();

        txn.create_file_scope(temp.path()).write("one.txt", "1").unwrap();
        txn.rollback().unwrap();

        txn.scope_mut(0).unwrap().write("two.txt", "2").unwrap();
        txn.rollback().unwrap();

        assert!(!temp.path().join("one.txt").exists());
        assert!(!temp.path().join("two.txt").exists());
    }

    #[test]
    fn test_stats_and_preview() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("old.txt"), "o").unwrap();

        let mut txn = Transaction::new();
        let scope = txn.create_file_scope(temp.path());
        scope.write("old.txt", "n").unwrap();
        scope.write("fresh.txt", "n").unwrap();

        let stats = txn.stats();
        assert_eq!(stats.scopes, 1);
        assert_eq!(stats.files_created, 1);
        assert_eq!(stats.files_overwritten, 1);
        assert_eq!(stats.total, 2);

        let preview = txn.preview();
        assert_eq!(preview.len(), 2);
        assert!(preview[0].starts_with("Overwrite: "));
        assert!(preview[1].starts_with("Create: "));
    }

    #[test]
    fn test_start_transaction_commits_on_return() {
        let temp = TempDir::new().unwrap();

        let count = start_transaction(|txn| {
            txn.create_file_scope(temp.path())
                .write("a.txt", "hello")
                .unwrap();
            txn.file_count()
        });

        assert_eq!(count, 1);
        assert_eq!(
            fs::read_to_string(temp.path().join("a.txt")).unwrap(),
            "hello"
        );
    }

    #[test]
    fn test_error_in_session_does_not_roll_back() {
        let temp = TempDir::new().unwrap();

        let result: Result<()> = start_transaction(|txn| {
            let scope = txn.create_file_scope(temp.path());
            scope.write("a.txt", "written")?;
            scope.write("missing/dir/b.txt", "fails")?;
            Ok(())
        });

        assert!(matches!(result, Err(TxnError::Write { .. })));
        assert!(temp.path().join("a.txt").exists());
    }
}
