//! Turns a parsed request into a response.
//!
//! Decision order for every request:
//!
//! 1. anything but GET/HEAD is rejected with 405 before the filesystem is
//!    touched;
//! 2. the target is resolved against the document root (400 for a target
//!    that cannot be decoded, 403 for one that escapes the root);
//! 3. a directory named with a trailing slash (`/blog/`) is replaced by its
//!    index file, if one is configured; without the slash it is 404;
//! 4. a regular file is served with 200, anything else is 404.
//!
//! Filesystem failures after the path was validated become 500.

use std::io;
use std::path::Path;

use bytes::Bytes;
use tokio::io::AsyncReadExt;

use crate::config::StaticFilesConfig;
use crate::error::ServeError;
use crate::files::resolver::{locate, resolve, ResolvedPath};
use crate::files::root::DocumentRoot;
use crate::fs::{FileKind, FileSystem, TokioFs};
use crate::http::mime::mime_type_for_path;
use crate::http::request::{Method, Request};
use crate::http::response::{Body, Response, ResponseBuilder, StatusCode};

pub struct FileHandler<F: FileSystem = TokioFs> {
    root: DocumentRoot,
    fs: F,
    index_file: Option<String>,
    stream_threshold: u64,
}

impl FileHandler<TokioFs> {
    pub fn new(root: DocumentRoot, config: &StaticFilesConfig) -> Self {
        Self::with_fs(root, config, TokioFs)
    }
}

impl<F: FileSystem> FileHandler<F> {
    pub fn with_fs(root: DocumentRoot, config: &StaticFilesConfig, fs: F) -> Self {
        Self {
            root,
            fs,
            index_file: config.index_file.clone(),
            stream_threshold: config.stream_threshold,
        }
    }

    pub fn root(&self) -> &DocumentRoot {
        &self.root
    }

    /// Produces the response for `req`. Never fails: errors become error
    /// pages.
    pub async fn handle(&self, req: &Request) -> Response {
        match self.serve(req).await {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    ServeError::Internal(_) => {
                        tracing::error!(path = %req.target, error = %err, "Failed to serve file");
                    }
                    _ => {
                        tracing::debug!(path = %req.target, error = %err, "Request rejected");
                    }
                }
                Response::from_error(&err)
            }
        }
    }

    async fn serve(&self, req: &Request) -> Result<Response, ServeError> {
        let head_only = match &req.method {
            Method::GET => false,
            Method::HEAD => true,
            other => return Err(ServeError::UnsupportedMethod(other.clone())),
        };

        let mut resolved = resolve(&req.target, &self.root, &self.fs).await?;

        if resolved.kind() == Some(FileKind::Directory) {
            if !names_directory(req.path()) {
                return Err(ServeError::NotFound);
            }
            resolved = self.index_of(&resolved).await?;
        }

        match resolved.stat {
            Some(stat) if stat.kind == FileKind::File => {
                self.serve_file(&resolved.path, stat.size, head_only).await
            }
            _ => Err(ServeError::NotFound),
        }
    }

    /// Resolves the index file inside `dir`.
    async fn index_of(&self, dir: &ResolvedPath) -> Result<ResolvedPath, ServeError> {
        let Some(index) = &self.index_file else {
            return Err(ServeError::NotFound);
        };
        Ok(locate(dir.path.join(index), &self.root, &self.fs).await?)
    }

    async fn serve_file(
        &self,
        path: &Path,
        size: u64,
        head_only: bool,
    ) -> Result<Response, ServeError> {
        let builder = ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", mime_type_for_path(path));

        if head_only {
            return Ok(builder.body(Body::Omitted(size)).build());
        }

        let mut file = self.fs.open_for_read(path).await.map_err(open_error)?;

        let body = if size <= self.stream_threshold {
            let mut contents = Vec::with_capacity(size as usize);
            file.read_to_end(&mut contents)
                .await
                .map_err(ServeError::Internal)?;
            Body::Bytes(Bytes::from(contents))
        } else {
            Body::File {
                reader: Box::pin(file),
                len: size,
            }
        };

        Ok(builder.body(body).build())
    }
}

/// True when the target path ends in `/`. An absolute-form target with no
/// path (`http://host`) names the root.
fn names_directory(path: &str) -> bool {
    match path.split_once("://") {
        Some((_, rest)) => !rest.contains('/') || rest.ends_with('/'),
        None => path.ends_with('/'),
    }
}

fn open_error(e: io::Error) -> ServeError {
    match e.kind() {
        io::ErrorKind::NotFound => ServeError::NotFound,
        _ => ServeError::Internal(e),
    }
}
