//! How a tracked file is opened for writing.

use crate::error::TxnError;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::str::FromStr;

/// Write mode applied when a tracked file is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Create the file if missing, truncate it otherwise.
    #[default]
    Truncate,
    /// Create the file if missing, append to it otherwise.
    Append,
    /// Fail if the file already exists.
    CreateNew,
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::Truncate => "truncate",
            WriteMode::Append => "append",
            WriteMode::CreateNew => "create-new",
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WriteMode {
    type Err = TxnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "truncate" => Ok(WriteMode::Truncate),
            "append" => Ok(WriteMode::Append),
            "create-new" => Ok(WriteMode::CreateNew),
            other => Err(TxnError::InvalidPlan(format!(
                "unknown write mode '{}' (expected truncate, append or create-new)",
                other
            ))),
        }
    }
}

/// Options for [`FileScope::open`](crate::fs::FileScope::open).
///
/// The default truncates and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    mode: WriteMode,
}

impl WriteOptions {
    pub fn new(mode: WriteMode) -> Self {
        Self { mode }
    }

    pub fn truncate() -> Self {
        Self::new(WriteMode::Truncate)
    }

    pub fn append() -> Self {
        Self::new(WriteMode::Append)
    }

    pub fn create_new() -> Self {
        Self::new(WriteMode::CreateNew)
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    pub(crate) fn open(&self, path: &Path) -> io::Result<File> {
        let mut opts = OpenOptions::new();
        match self.mode {
            WriteMode::Truncate => opts.write(true).create(true).truncate(true),
            WriteMode::Append => opts.append(true).create(true),
            WriteMode::CreateNew => opts.write(true).create_new(true),
        };
        opts.open(path)
    }
}

impl From<WriteMode> for WriteOptions {
    fn from(mode: WriteMode) -> Self {
        Self::new(mode)
    }
}
