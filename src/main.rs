use std::path::PathBuf;

use anyhow::Context;
use rootserve::config::Config;
use rootserve::server;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: rootserve [<port> <document_root>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let mut cfg = Config::load()?;

    let mut args = std::env::args().skip(1);
    let port = args
        .next()
        .map(|p| p.parse::<u16>().context(USAGE))
        .transpose()?;
    let root = args.next().map(PathBuf::from);
    if args.next().is_some() {
        anyhow::bail!(USAGE);
    }
    cfg.apply_args(port, root);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    };

    server::listener::run(&cfg, shutdown).await
}
