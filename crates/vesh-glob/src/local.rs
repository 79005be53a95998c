//! `WalkerFs` over the host filesystem.

use async_trait::async_trait;
use std::io;
use std::path::Path;

use crate::{WalkerDirEntry, WalkerError, WalkerFs};

/// A directory entry read through `tokio::fs`.
#[derive(Debug, Clone)]
pub struct LocalDirEntry {
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

impl WalkerDirEntry for LocalDirEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_dir(&self) -> bool {
        self.is_dir
    }

    fn is_symlink(&self) -> bool {
        self.is_symlink
    }
}

/// The real filesystem. Paths handed to it are expected to be absolute;
/// the globber resolves relative patterns against its working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

fn walker_error(path: &Path, err: io::Error) -> WalkerError {
    let shown = path.display().to_string();
    match err.kind() {
        io::ErrorKind::NotFound => WalkerError::NotFound(shown),
        io::ErrorKind::PermissionDenied => WalkerError::PermissionDenied(shown),
        _ => WalkerError::Io(format!("{shown}: {err}")),
    }
}

#[async_trait]
impl WalkerFs for LocalFs {
    type DirEntry = LocalDirEntry;

    async fn list_dir(&self, path: &Path) -> Result<Vec<LocalDirEntry>, WalkerError> {
        let mut dir = tokio::fs::read_dir(path).await.map_err(|e| walker_error(path, e))?;
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| walker_error(path, e))? {
            let file_type = entry.file_type().await.map_err(|e| walker_error(path, e))?;
            let is_symlink = file_type.is_symlink();
            // Symlinks report their own type; follow them so a link to a
            // directory can still be globbed through.
            let is_dir = if is_symlink {
                tokio::fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir())
            } else {
                file_type.is_dir()
            };
            entries.push(LocalDirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
                is_symlink,
            });
        }
        Ok(entries)
    }

    async fn is_dir(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir())
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::symlink_metadata(path).await.is_ok()
    }
}
