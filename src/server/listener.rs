use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, Instrument};

use crate::config::Config;
use crate::fs::FileSystem;
use crate::http::connection::Connection;
use crate::server::ServerContext;

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Binds the configured address and serves until `shutdown` resolves.
pub async fn run(cfg: &Config, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
    let ctx = Arc::new(ServerContext::from_config(cfg)?);

    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("binding {}", cfg.server.listen_addr))?;
    info!(
        "Listening on {} with document root {}",
        listener.local_addr()?,
        ctx.handler.root().path().display()
    );

    serve(listener, ctx, shutdown).await
}

/// Accepts connections on `listener`, one task per connection.
///
/// When `shutdown` resolves the listener is dropped and no more
/// connections are accepted; connections already accepted are allowed to
/// finish before this returns.
pub async fn serve<F: FileSystem>(
    listener: TcpListener,
    ctx: Arc<ServerContext<F>>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    tokio::pin!(shutdown);

    let limiter = ctx.max_connections.map(|max| Arc::new(Semaphore::new(max)));
    let mut tasks = JoinSet::new();

    loop {
        let permit = match &limiter {
            Some(sem) => tokio::select! {
                _ = &mut shutdown => break,
                permit = sem.clone().acquire_owned() => {
                    Some(permit.context("connection limiter closed")?)
                }
            },
            None => None,
        };

        let (socket, peer) = tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            },
        };
        tracing::debug!("Accepted connection from {}", peer);

        let ctx = Arc::clone(&ctx);
        let span = tracing::info_span!("conn", %peer);
        tasks.spawn(
            async move {
                let _permit = permit;
                let mut conn = Connection::new(socket, ctx);
                if let Err(e) = conn.run().await {
                    tracing::warn!("Connection error: {:#}", e);
                }
            }
            .instrument(span),
        );

        // Reap finished connections so the set stays small.
        while tasks.try_join_next().is_some() {}
    }

    drop(listener);
    info!(in_flight = tasks.len(), "Stopped accepting connections");

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Connection task panicked");
        }
    }

    Ok(())
}
