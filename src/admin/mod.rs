pub mod handlers;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::proxy::CacheService;
use routes::{create_cache_routes, create_config_routes, create_health_routes};

pub fn create_admin_router(service: Arc<CacheService>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .merge(create_cache_routes())
        .merge(create_config_routes())
        .merge(create_health_routes())
        .layer(cors)
        .with_state(service)
}

#[tracing::instrument(level = "info", name = "Admin Server", skip(service))]
pub async fn start_admin_server(
    addr: SocketAddr,
    service: Arc<CacheService>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_admin_router(service);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Starting admin server at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
