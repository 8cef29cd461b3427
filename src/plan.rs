//! TOML plan files describing a batch of writes.
//!
//! ```toml
//! [[scope]]
//! root = "out/site"
//! mkdir = ["assets"]
//!
//! [[scope.file]]
//! path = "assets/app.css"
//! content = "body {}"
//! mode = "append"
//! ```
//!
//! Relative roots resolve against the directory holding the plan.

use crate::error::{Result, TxnError};
use crate::fs::WriteMode;
use std::fs;
use std::path::{Component, Path, PathBuf};
use toml_edit::{DocumentMut, Item, Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub scopes: Vec<ScopePlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePlan {
    pub root: PathBuf,
    pub dirs: Vec<PathBuf>,
    pub files: Vec<FilePlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePlan {
    pub path: PathBuf,
    pub content: String,
    pub mode: WriteMode,
}

impl Plan {
    /// Reads and parses the plan at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            TxnError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read plan {}: {}", path.display(), e),
            ))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, base)
    }

    pub fn parse(text: &str, base: &Path) -> Result<Self> {
        let doc: DocumentMut = text.parse()?;

        let scopes = match doc.get("scope") {
            None => Vec::new(),
            Some(item) => item
                .as_array_of_tables()
                .ok_or_else(|| invalid("'scope' must be an array of tables ([[scope]])"))?
                .iter()
                .enumerate()
                .map(|(i, table)| parse_scope(i, table, base))
                .collect::<Result<Vec<_>>>()?,
        };

        if scopes.is_empty() {
            log::warn!("Plan defines no scopes");
        }

        Ok(Self { scopes })
    }

    pub fn file_count(&self) -> usize {
        self.scopes.iter().map(|s| s.files.len()).sum()
    }
}

fn parse_scope(idx: usize, table: &Table, base: &Path) -> Result<ScopePlan> {
    let ctx = format!("scope[{}]", idx);

    let root = PathBuf::from(required_str(table, "root", &ctx)?);
    let root = if root.is_absolute() {
        root
    } else {
        base.join(root)
    };

    let dirs = match table.get("mkdir") {
        None => Vec::new(),
        Some(item) => item
            .as_array()
            .ok_or_else(|| invalid(format!("{}.mkdir must be an array of strings", ctx)))?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(PathBuf::from)
                    .ok_or_else(|| invalid(format!("{}.mkdir must be an array of strings", ctx)))
            })
            .collect::<Result<Vec<_>>>()?,
    };

    let files = match table.get("file") {
        None => Vec::new(),
        Some(item) => item
            .as_array_of_tables()
            .ok_or_else(|| invalid(format!("{}.file must be an array of tables", ctx)))?
            .iter()
            .enumerate()
            .map(|(i, file)| parse_file(&format!("{}.file[{}]", ctx, i), file))
            .collect::<Result<Vec<_>>>()?,
    };

    Ok(ScopePlan { root, dirs, files })
}

fn parse_file(ctx: &str, table: &Table) -> Result<FilePlan> {
    let path = PathBuf::from(required_str(table, "path", ctx)?);
    if path.has_root() || path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(invalid(format!(
            "{}.path must be relative to the scope root without '..'",
            ctx
        )));
    }

    let content = required_str(table, "content", ctx)?.to_string();

    let mode = match table.get("mode") {
        None => WriteMode::default(),
        Some(item) => item
            .as_str()
            .ok_or_else(|| invalid(format!("{}.mode must be a string", ctx)))?
            .parse::<WriteMode>()?,
    };

    Ok(FilePlan {
        path,
        content,
        mode,
    })
}

fn required_str<'a>(table: &'a Table, key: &str, ctx: &str) -> Result<&'a str> {
    match table.get(key) {
        Some(Item::Value(v)) => v
            .as_str()
            .ok_or_else(|| invalid(format!("{}.{} must be a string", ctx, key))),
        Some(_) => Err(invalid(format!("{}.{} must be a string", ctx, key))),
        None => Err(invalid(format!("{} is missing '{}'", ctx, key))),
    }
}

fn invalid(msg: impl Into<String>) -> TxnError {
    TxnError::InvalidPlan(msg.into())
}
