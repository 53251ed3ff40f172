use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{get_config_handler, get_health_handler, get_stats_handler, purge_handler};
use crate::proxy::CacheService;

pub fn create_cache_routes() -> Router<Arc<CacheService>> {
    Router::new()
        .route("/stats", get(get_stats_handler))
        .route("/purge", post(purge_handler))
}

pub fn create_config_routes() -> Router<Arc<CacheService>> {
    Router::new().route("/config", get(get_config_handler))
}

pub fn create_health_routes() -> Router<Arc<CacheService>> {
    Router::new().route("/health", get(get_health_handler))
}
