//! Filesystem access used by the file server.
//!
//! The handler and resolver never touch `std::fs` or `tokio::fs` directly;
//! they go through [`FileSystem`], which lets tests inject failures.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncRead;

/// What kind of object a path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    /// Sockets, devices, fifos. Never served.
    Other,
}

/// Result of [`FileSystem::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub kind: FileKind,
    pub size: u64,
}

/// Read-only filesystem operations.
pub trait FileSystem: Send + Sync + 'static {
    /// Handle returned by [`open_for_read`](FileSystem::open_for_read).
    type Reader: AsyncRead + Send + Unpin + 'static;

    /// Queries kind and size, following symlinks.
    fn stat(&self, path: &Path) -> impl Future<Output = io::Result<FileStat>> + Send;

    /// Opens a file for reading.
    fn open_for_read(&self, path: &Path) -> impl Future<Output = io::Result<Self::Reader>> + Send;

    /// Resolves symlinks and relative components.
    fn canonicalize(&self, path: &Path) -> impl Future<Output = io::Result<PathBuf>> + Send;
}

/// [`FileSystem`] backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

impl FileSystem for TokioFs {
    type Reader = tokio::fs::File;

    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = tokio::fs::metadata(path).await?;
        let kind = if meta.is_file() {
            FileKind::File
        } else if meta.is_dir() {
            FileKind::Directory
        } else {
            FileKind::Other
        };
        Ok(FileStat {
            kind,
            size: meta.len(),
        })
    }

    async fn open_for_read(&self, path: &Path) -> io::Result<Self::Reader> {
        tokio::fs::File::open(path).await
    }

    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        tokio::fs::canonicalize(path).await
    }
}
