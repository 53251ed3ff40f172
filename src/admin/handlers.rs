use std::sync::Arc;

use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::config::EdgeConfig;
use crate::proxy::CacheService;

// ============================================================
// Cache Handlers
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub message: String,
}

impl PurgeResponse {
    pub fn new(cleared: usize) -> Self {
        Self {
            message: format!("Cache purged successfully. {} items cleared.", cleared),
        }
    }
}

pub async fn get_stats_handler(State(service): State<Arc<CacheService>>) -> Json<CacheStats> {
    Json(service.stats())
}

pub async fn purge_handler(State(service): State<Arc<CacheService>>) -> Json<PurgeResponse> {
    tracing::info!("Cache purge requested via admin interface");
    let cleared = service.purge();
    Json(PurgeResponse::new(cleared))
}

// ============================================================
// Config Handlers
// ============================================================

pub async fn get_config_handler(State(service): State<Arc<CacheService>>) -> Json<EdgeConfig> {
    Json(service.config().clone())
}

// ============================================================
// Health Handlers
// ============================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub cached_items: usize,
}

pub async fn get_health_handler(State(service): State<Arc<CacheService>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        cached_items: service.cache().len(),
    })
}
