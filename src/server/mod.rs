//! Listening socket and the state shared by every connection.

pub mod listener;

use std::time::Duration;

use crate::config::Config;
use crate::files::handler::FileHandler;
use crate::files::root::DocumentRoot;
use crate::fs::{FileSystem, TokioFs};
use crate::http::parser::ParseLimits;

/// Read-only state handed to every connection task.
pub struct ServerContext<F: FileSystem = TokioFs> {
    pub handler: FileHandler<F>,
    pub limits: ParseLimits,
    pub read_timeout: Option<Duration>,
    pub max_connections: Option<usize>,
}

impl ServerContext<TokioFs> {
    /// Validates the document root and builds the context.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let root = DocumentRoot::new(&cfg.static_files.root)?;
        Ok(Self::new(FileHandler::new(root, &cfg.static_files), cfg))
    }
}

impl<F: FileSystem> ServerContext<F> {
    pub fn new(handler: FileHandler<F>, cfg: &Config) -> Self {
        Self {
            handler,
            limits: cfg.server.limits.clone(),
            read_timeout: cfg.server.read_timeout(),
            max_connections: cfg.server.max_connections,
        }
    }
}
