//! File system primitives with rollback support.
//!
//! Every path opened through a [`FileScope`] is snapshotted before its first
//! write and can be restored to that state later.

pub mod dir;
pub mod options;
pub mod scope;
pub mod snapshot;

pub use dir::ScopedDir;
pub use options::{WriteMode, WriteOptions};
pub use scope::FileScope;
pub use snapshot::{FileSnapshot, TrackedFile};
