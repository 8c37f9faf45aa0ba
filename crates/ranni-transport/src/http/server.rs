//! HTTP server helper.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use ranni_core::TransportResult;

/// A running HTTP server.
#[derive(Debug)]
pub struct HttpServerHandle {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl HttpServerHandle {
    /// The address the server actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the server task to finish.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "HTTP server task panicked");
        }
    }
}

/// Binds `addr` and serves `router` until `shutdown` is cancelled.
pub async fn serve(
    addr: &str,
    router: Router,
    shutdown: CancellationToken,
) -> TransportResult<HttpServerHandle> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    info!(addr = %local_addr, "HTTP server listening");

    let task = tokio::spawn(async move {
        let server = axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await });

        if let Err(e) = server.await {
            error!(error = %e, "HTTP server error");
        }
        info!(addr = %local_addr, "HTTP server stopped");
    });

    Ok(HttpServerHandle { local_addr, task })
}
