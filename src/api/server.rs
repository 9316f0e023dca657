//! HTTP server lifecycle: bind, serve, shut down on ctrl-c.

use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use super::router::app_router;
use super::types::AppContext;

/// Bind and serve the trigger API until interrupted.
pub async fn serve(ctx: AppContext, bind_addr: &str) -> io::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("bad bind address {bind_addr}: {e}")))?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app_router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
