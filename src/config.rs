use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::http::parser::ParseLimits;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "ROOTSERVE_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Cap on concurrently served connections. Unbounded when absent.
    pub max_connections: Option<usize>,
    /// Time allowed to receive a complete request. Unbounded when absent.
    pub read_timeout_secs: Option<u64>,
    pub limits: ParseLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            max_connections: None,
            read_timeout_secs: None,
            limits: ParseLimits::default(),
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Document root. Relative paths are taken from the working directory.
    pub root: PathBuf,
    /// File served for directory requests; `None` makes them 404.
    pub index_file: Option<String>,
    /// Files larger than this are streamed instead of read into memory.
    pub stream_threshold: u64,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            index_file: Some("index.html".to_string()),
            stream_threshold: 1024 * 1024,
        }
    }
}

impl Config {
    /// Loads the YAML file named by `ROOTSERVE_CONFIG` (defaults otherwise),
    /// then applies the `LISTEN` and `DOC_ROOT` overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }
        if let Some(root) = std::env::var_os("DOC_ROOT") {
            cfg.static_files.root = PathBuf::from(root);
        }

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Applies the `<port> <document_root>` command-line arguments.
    ///
    /// The port replaces only the port half of `listen_addr`.
    pub fn apply_args(&mut self, port: Option<u16>, root: Option<PathBuf>) {
        if let Some(port) = port {
            let host = self
                .server
                .listen_addr
                .rsplit_once(':')
                .map_or("0.0.0.0", |(host, _)| host);
            self.server.listen_addr = format!("{}:{}", host, port);
        }
        if let Some(root) = root {
            self.static_files.root = root;
        }
    }
}
