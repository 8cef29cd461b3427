//! `txfs apply`: run a plan inside one transaction.
//!
//! On failure the whole transaction is rolled back unless `--keep-partial`
//! is given. `--rehearse` applies everything and then rolls back.

use crate::error::{Result, TxnError};
use crate::fs::{ScopedDir, WriteOptions};
use crate::plan::{Plan, ScopePlan};
use crate::transaction::{Transaction, start_transaction};

use clap::Parser;
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Arguments for the `apply` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ApplyArgs {
    /// Path to the TOML plan
    pub plan: PathBuf,

    /// Show what would change without writing anything
    #[arg(long, short = 'n', conflicts_with_all = ["rehearse", "keep_partial"])]
    pub dry_run: bool,

    /// Apply the plan, then roll every write back
    #[arg(long)]
    pub rehearse: bool,

    /// Keep writes made before a failure instead of rolling back
    #[arg(long)]
    pub keep_partial: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Committed,
    Rehearsed,
    Partial,
}

pub fn execute(args: ApplyArgs) -> Result<()> {
    let plan = Plan::load(&args.plan)?;
    let base = args
        .plan
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    log::info!(
        "Loaded plan {}: {} scope(s), {} file(s)",
        args.plan.display(),
        plan.scopes.len(),
        plan.file_count()
    );

    if args.dry_run {
        print_plan(&plan, &base);
        return Ok(());
    }

    start_transaction(|txn| {
        if let Err(e) = apply_plan(txn, &plan) {
            if args.keep_partial {
                log::warn!("Apply failed, keeping partial writes: {}", e);
                print_summary(txn, &base, Outcome::Partial);
                return Err(e);
            }

            log::error!("Apply failed: {}", e);
            return Err(abort(txn, e));
        }

        for line in txn.preview() {
            log::info!("{}", line);
        }

        if args.rehearse {
            txn.rollback()?;
            print_summary(txn, &base, Outcome::Rehearsed);
        } else {
            print_summary(txn, &base, Outcome::Committed);
        }
        Ok(())
    })
}

/// Rolls back after `cause` and returns the error to report.
///
/// If the rollback itself fails, both failures are folded into one error.
fn abort(txn: &mut Transaction, cause: TxnError) -> TxnError {
    match txn.rollback() {
        Ok(()) => {
            println!("\n{}", "All changes rolled back.".yellow());
            cause
        }
        Err(rollback) => {
            TxnError::Other(anyhow::anyhow!("{}; rollback also failed: {}", cause, rollback))
        }
    }
}

/// Writes every scope of `plan` through `txn`, stopping at the first error.
pub fn apply_plan(txn: &mut Transaction, plan: &Plan) -> Result<()> {
    for scope_plan in &plan.scopes {
        apply_scope(txn, scope_plan)?;
    }
    Ok(())
}

fn apply_scope(txn: &mut Transaction, plan: &ScopePlan) -> Result<()> {
    // Scope roots are created on demand and never rolled back
    ScopedDir::at(&plan.root).create_all()?;
    let scope = txn.create_file_scope(&plan.root);

    for dir in &plan.dirs {
        ScopedDir::new(scope.root(), dir)?.create_all()?;
    }

    for file in &plan.files {
        scope.open(&file.path, WriteOptions::new(file.mode), |f| {
            f.write_all(file.content.as_bytes())
        })?;
    }

    Ok(())
}

fn display_path(path: &Path, base: &Path) -> String {
    let relative = pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf());
    relative.to_string_lossy().replace('\\', "/")
}

fn print_plan(plan: &Plan, base: &Path) {
    if plan.file_count() == 0 {
        println!("\n{}", "No changes planned".yellow());
        return;
    }

    println!("\n{}", "DRY RUN - No changes will be made".yellow().bold());

    for scope in &plan.scopes {
        println!("\n{}", display_path(&scope.root, base).bold());
        for dir in &scope.dirs {
            println!("   {} {}/", "d".cyan(), dir.to_string_lossy().dimmed());
        }
        for file in &scope.files {
            let target = scope.root.join(&file.path);
            let name = file.path.to_string_lossy().replace('\\', "/");
            if target.exists() {
                println!("   {} {} ({})", "~".yellow(), name, file.mode);
            } else {
                println!("   {} {} ({})", "+".green(), name, file.mode);
            }
        }
    }

    println!();
    let num = plan.file_count();
    println!(
        "{} {} would be written. Run without {} to apply.",
        num.to_string().cyan().bold(),
        if num == 1 { "file" } else { "files" },
        "--dry-run".cyan()
    );
}

fn print_summary(txn: &Transaction, base: &Path, outcome: Outcome) {
    let stats = txn.stats();
    if stats.total == 0 {
        println!("\n{}", "No files written".yellow());
        return;
    }

    match outcome {
        Outcome::Committed => println!("\n{}", "Changes applied:".green().bold()),
        Outcome::Rehearsed => println!("\n{}", "Rehearsal (rolled back):".yellow().bold()),
        Outcome::Partial => println!("\n{}", "Partially applied:".red().bold()),
    }

    for scope in txn.scopes().iter().filter(|s| !s.is_empty()) {
        println!("\n{}", display_path(scope.root(), base).bold());
        for file in scope.files() {
            let name = display_path(file.path(), scope.root());
            if file.is_new() {
                println!("   {} {}", "+".green(), name.dimmed());
            } else {
                println!("   {} {}", "~".yellow(), name.dimmed());
            }
        }
    }

    println!();
    println!(
        "{} {} created, {} overwritten across {} scope{}",
        "✓".green().bold(),
        stats.files_created,
        stats.files_overwritten,
        stats.scopes,
        if stats.scopes == 1 { "" } else { "s" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn plan_in(temp: &TempDir, text: &str) -> Plan {
        Plan::parse(text, temp.path()).unwrap()
    }

    #[test]
    fn test_apply_plan_creates_roots_and_dirs() {
        let temp = TempDir::new().unwrap();
        let plan = plan_in(
            &temp,
            r#"
[[scope]]
root = "out"
mkdir = ["a/b"]

[[scope.file]]
path = "a/b/c.txt"
content = "deep"
"#,
        );

        let mut txn = Transaction::new();
        apply_plan(&mut txn, &plan).unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("out/a/b/c.txt")).unwrap(),
            "deep"
        );
        assert_eq!(txn.file_count(), 1);

        // Directories are not tracked, only the file goes away
        txn.rollback().unwrap();
        assert!(temp.path().join("out/a/b").is_dir());
        assert!(!temp.path().join("out/a/b/c.txt").exists());
    }

    #[test]
    fn test_apply_plan_stops_at_first_error() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("root")).unwrap();
        fs::write(temp.path().join("root/taken.txt"), "mine").unwrap();

        let plan = plan_in(
            &temp,
            r#"
[[scope]]
root = "root"

[[scope.file]]
path = "first.txt"
content = "1"

[[scope.file]]
path = "taken.txt"
content = "2"
mode = "create-new"

[[scope.file]]
path = "never.txt"
content = "3"
"#,
        );

        let mut txn = Transaction::new();
        assert!(apply_plan(&mut txn, &plan).is_err());
        assert!(!temp.path().join("root/never.txt").exists());

        txn.rollback().unwrap();
        assert!(!temp.path().join("root/first.txt").exists());
        assert_eq!(
            fs::read_to_string(temp.path().join("root/taken.txt")).unwrap(),
            "mine"
        );
    }

    #[test]
    fn test_abort_returns_cause_after_clean_rollback() {
        let temp = TempDir::new().unwrap();
        let mut txn = Transaction::new();
        txn.create_file_scope(temp.path()).write("a.txt", "x").unwrap();

        let err = abort(&mut txn, TxnError::InvalidPlan("boom".to_string()));

        assert!(matches!(err, TxnError::InvalidPlan(_)));
        assert!(!temp.path().join("a.txt").exists());
    }

    #[test]
    fn test_abort_reports_both_failures() {
        let temp = TempDir::new().unwrap();
        let mut txn = Transaction::new();
        txn.create_file_scope(temp.path()).write("a.txt", "x").unwrap();

        // A non-empty directory in place of the new file cannot be removed
        fs::remove_file(temp.path().join("a.txt")).unwrap();
        fs::create_dir(temp.path().join("a.txt")).unwrap();
        fs::write(temp.path().join("a.txt/inner"), "y").unwrap();

        let err = abort(&mut txn, TxnError::InvalidPlan("boom".to_string()));

        assert!(matches!(err, TxnError::Other(_)));
        let msg = err.to_string();
        assert!(msg.contains("Invalid plan: boom"));
        assert!(msg.contains("rollback also failed"));
        assert!(msg.contains("a.txt"));
    }

    #[test]
    fn test_display_path_relative_to_base() {
        let base = Path::new("/work");
        assert_eq!(display_path(Path::new("/work/out/a.txt"), base), "out/a.txt");
    }
}
