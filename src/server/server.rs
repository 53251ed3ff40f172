use std::net::SocketAddr;
use std::sync::Arc;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpListener;

use crate::proxy::{CacheService, process_edge_request};

#[tracing::instrument(level = "info", name = "EdgeServer", skip(service))]
pub async fn start_edge_server(
    addr: SocketAddr,
    service: Arc<CacheService>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Starting edge server at http://{}", listener.local_addr()?);

    serve_edge(listener, service).await
}

/// Accept loop: one task per connection, all sharing the same service.
pub async fn serve_edge(
    listener: TcpListener,
    service: Arc<CacheService>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;

        tracing::debug!("Accepted connection from {}", peer_addr);

        let service = Arc::clone(&service);
        tokio::task::spawn(async move {
            let io = TokioIo::new(stream);
            let handler = service_fn(move |req| process_edge_request(Arc::clone(&service), req));

            if let Err(err) = auto::Builder::new(TokioExecutor::new())
                .serve_connection(io, handler)
                .await
            {
                tracing::error!("Error serving connection from {}: {}", peer_addr, err);
            }
        });
    }
}
