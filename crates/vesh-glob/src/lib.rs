//! vesh-glob: Composable glob patterns and async filesystem expansion.
//!
//! Provides:
//! - **Pattern**: an ordered sequence of literal, slash and wildcard segments,
//!   built from text or assembled piece by piece by the expression engine
//! - **match_segments**: work-bounded matching of segments against a name
//! - **Globber**: async, cancellable expansion of a pattern against a filesystem
//! - **LocalFs**: `WalkerFs` over the real filesystem (tokio::fs)
//!
//! The globber is generic over `WalkerFs`, a minimal read-only filesystem trait.
//! Patterns stay pure data until a `Globber` expands them.

pub mod glob;
mod local;
pub mod pattern;
mod walker;

pub use glob::match_segments;
pub use local::{LocalDirEntry, LocalFs};
pub use pattern::{CharClass, Matcher, Pattern, PatternError, Segment, Wild, WildKind, wildcard_to_segment};
pub use walker::Globber;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from filesystem operations within the globber.
#[derive(Debug, Clone, Error)]
pub enum WalkerError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("io error: {0}")]
    Io(String),
}

/// Errors that abort a glob expansion.
///
/// Unreadable directories are skipped rather than reported, so the only way
/// an expansion fails is by being cancelled.
#[derive(Debug, Clone, Error)]
pub enum GlobError {
    /// The cancellation token fired while the filesystem was being walked.
    #[error("interrupted")]
    Interrupted,
}

/// Minimal read-only filesystem abstraction for the globber.
///
/// Implement this trait to expand patterns against something other than the
/// host filesystem (an in-memory tree, a sandbox, ...).
#[async_trait]
pub trait WalkerFs: Send + Sync {
    /// The directory entry type returned by `list_dir`.
    type DirEntry: WalkerDirEntry;

    /// List the entries in a directory. Order is not significant; the
    /// globber sorts by name.
    async fn list_dir(&self, path: &Path) -> Result<Vec<Self::DirEntry>, WalkerError>;

    /// Check if a path is a directory.
    async fn is_dir(&self, path: &Path) -> bool;

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> bool;
}

/// A single entry returned by `WalkerFs::list_dir`.
pub trait WalkerDirEntry: Send {
    /// The entry name (file or directory name, not full path).
    fn name(&self) -> &str;

    /// True if this entry is a directory.
    fn is_dir(&self) -> bool;

    /// True if this entry is a symbolic link.
    fn is_symlink(&self) -> bool;
}
