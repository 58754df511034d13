//! Maps request-targets onto paths below the document root.
//!
//! Resolution runs in two stages. [`normalize_target`] is purely lexical:
//! it strips query and fragment, percent-decodes, and folds `.` and `..`
//! against a virtual `/`. [`resolve`] then joins the result onto the
//! document root and canonicalizes it through the [`FileSystem`], checking
//! that the canonical form is still inside the root.

use std::io;
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::files::root::DocumentRoot;
use crate::fs::{FileKind, FileStat, FileSystem};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("malformed percent-encoding in request target")]
    InvalidEncoding,
    #[error("request target is not valid UTF-8 after decoding")]
    InvalidUtf8,
    #[error("request target contains a NUL byte")]
    NulByte,
    #[error("request target escapes the document root")]
    Traversal,
    #[error("filesystem error during resolution")]
    Io(#[from] io::Error),
}

/// A path confined to the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Absolute path, canonical when the target exists.
    pub path: PathBuf,
    /// `None` if nothing exists at `path`.
    pub stat: Option<FileStat>,
}

impl ResolvedPath {
    pub fn kind(&self) -> Option<FileKind> {
        self.stat.map(|s| s.kind)
    }
}

/// Lexically normalizes a request-target into a path relative to the root.
///
/// The empty path stands for the root itself. A `..` that would climb above
/// the virtual root is reported as [`ResolveError::Traversal`].
pub fn normalize_target(target: &str) -> Result<PathBuf, ResolveError> {
    let path = strip_authority(strip_query(target));

    validate_escapes(path)?;
    let decoded: Vec<u8> = percent_decode_str(path).collect();
    if decoded.contains(&0) {
        return Err(ResolveError::NulByte);
    }
    let decoded = String::from_utf8(decoded).map_err(|_| ResolveError::InvalidUtf8)?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ResolveError::Traversal);
                }
            }
            other => {
                // A drive prefix or root would make `join` discard the
                // document root.
                let mut components = Path::new(other).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => segments.push(other),
                    _ => return Err(ResolveError::Traversal),
                }
            }
        }
    }

    Ok(segments.iter().collect())
}

/// Resolves `target` to a path inside `root`.
pub async fn resolve<F: FileSystem>(
    target: &str,
    root: &DocumentRoot,
    fs: &F,
) -> Result<ResolvedPath, ResolveError> {
    let relative = normalize_target(target)?;
    locate(root.path().join(relative), root, fs).await
}

/// Canonicalizes `joined` and checks it against `root`.
///
/// `joined` must already be lexically inside the root; this only guards
/// against redirection through symlinks.
pub(crate) async fn locate<F: FileSystem>(
    joined: PathBuf,
    root: &DocumentRoot,
    fs: &F,
) -> Result<ResolvedPath, ResolveError> {
    let canonical = match fs.canonicalize(&joined).await {
        Ok(canonical) => canonical,
        Err(e) if is_missing(&e) => {
            return Ok(ResolvedPath {
                path: joined,
                stat: None,
            });
        }
        Err(e) => return Err(e.into()),
    };

    if !root.contains(&canonical) {
        return Err(ResolveError::Traversal);
    }

    let stat = match fs.stat(&canonical).await {
        Ok(stat) => Some(stat),
        Err(e) if is_missing(&e) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(ResolvedPath {
        path: canonical,
        stat,
    })
}

fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

fn strip_query(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

/// Reduces an absolute-form target (`http://host/path`) to its path.
fn strip_authority(target: &str) -> &str {
    let Some(scheme_end) = target.find("://") else {
        return target;
    };
    if target.starts_with('/') {
        return target;
    }
    let after = &target[scheme_end + 3..];
    after.find('/').map_or("/", |idx| &after[idx..])
}

/// Every `%` must start a two-digit hex escape.
fn validate_escapes(path: &str) -> Result<(), ResolveError> {
    let bytes = path.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(ResolveError::InvalidEncoding);
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
