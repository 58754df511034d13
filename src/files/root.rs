use std::path::{Path, PathBuf};

use anyhow::Context;

/// The directory every served file must live under.
///
/// Always canonical, so resolved paths can be checked with a plain prefix
/// comparison. Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRoot {
    path: PathBuf,
}

impl DocumentRoot {
    /// Canonicalizes `path` and checks that it is a directory.
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let canonical = std::fs::canonicalize(path)
            .with_context(|| format!("document root {} is not accessible", path.display()))?;

        if !canonical.is_dir() {
            anyhow::bail!("document root {} is not a directory", canonical.display());
        }

        Ok(Self { path: canonical })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if `candidate` is the root itself or lies below it.
    pub fn contains(&self, candidate: &Path) -> bool {
        candidate.starts_with(&self.path)
    }
}
