use std::sync::Arc;

use bytes::Bytes;
use http::Method;

use super::{EdgeError, EdgeResponse, MissResponse};
use crate::cache::{CacheStats, EdgeCache, generate_validator, is_cacheable};
use crate::client::{
    ApiClient, ApiRequest, FetchError, HttpApiClient, HttpOriginClient, OriginClient,
};
use crate::config::{API_PREFIX, EdgeConfig};

/// An inbound request, reduced to what the edge looks at.
#[derive(Debug, Clone)]
pub struct EdgeRequest {
    pub method: Method,
    /// Raw request target: path plus query string, exactly as received.
    pub target: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl EdgeRequest {
    pub fn get(target: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            target: target.into(),
            content_type: None,
            body: Bytes::new(),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.target.starts_with(API_PREFIX)
    }

    /// The cache key is the raw target, never normalized.
    pub fn cache_key(&self) -> &str {
        if self.target.is_empty() {
            "/"
        } else {
            &self.target
        }
    }
}

/// The edge: store, counters and upstream clients, constructed once at
/// startup and shared by every connection task.
pub struct CacheService {
    config: EdgeConfig,
    cache: Arc<EdgeCache>,
    origin: Arc<dyn OriginClient>,
    api: Arc<dyn ApiClient>,
}

impl CacheService {
    pub fn new(
        config: EdgeConfig,
        origin: Arc<dyn OriginClient>,
        api: Arc<dyn ApiClient>,
    ) -> Self {
        let cache = Arc::new(EdgeCache::new(config.ttl()));

        Self {
            config,
            cache,
            origin,
            api,
        }
    }

    pub fn from_config(config: EdgeConfig) -> Result<Self, FetchError> {
        let deadline = config.fetch_timeout();
        let origin = HttpOriginClient::new(config.origin_url.clone(), deadline)?;
        let api = HttpApiClient::new(config.api_url.clone(), deadline)?;

        Ok(Self::new(config, Arc::new(origin), Arc::new(api)))
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    pub fn cache(&self) -> &EdgeCache {
        &self.cache
    }

    /// Serves one proxied request. Counts exactly one request whatever the
    /// outcome.
    pub async fn handle(&self, request: EdgeRequest) -> EdgeResponse {
        self.cache.metrics().record_request();

        if request.is_dynamic() {
            return self.bypass(request).await;
        }

        self.serve_asset(request.cache_key().to_string()).await
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn purge(&self) -> usize {
        self.cache.purge()
    }

    async fn bypass(&self, request: EdgeRequest) -> EdgeResponse {
        self.cache.metrics().record_bypass();
        tracing::info!(
            "API request, proxying to {}{}",
            self.config.api_url,
            request.target
        );

        let api_request = ApiRequest {
            method: request.method,
            path_and_query: request.target,
            content_type: request.content_type,
            body: Some(request.body),
        };

        match self.api.forward(api_request).await {
            Ok(response) => EdgeResponse::Bypass(response),
            Err(e) => {
                tracing::error!("API proxy error: {}", e);
                EdgeResponse::GatewayError(EdgeError::ApiUnreachable(e))
            }
        }
    }

    async fn serve_asset(&self, key: String) -> EdgeResponse {
        if let Some(entry) = self.cache.lookup(&key) {
            tracing::info!("CACHE HIT: {}", key);
            return EdgeResponse::Hit(entry);
        }

        tracing::info!("CACHE MISS: {} - fetching from origin", key);

        // Detached so a client hang-up does not cancel the fetch or the store
        let cache = Arc::clone(&self.cache);
        let origin = Arc::clone(&self.origin);
        let populate = tokio::spawn(async move { fetch_and_populate(&cache, &*origin, key).await });

        match populate.await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Origin fetch task failed: {}", e);
                EdgeResponse::GatewayError(EdgeError::from(e))
            }
        }
    }
}

async fn fetch_and_populate(
    cache: &EdgeCache,
    origin: &dyn OriginClient,
    key: String,
) -> EdgeResponse {
    let fetched = match origin.get(&key).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::error!("Origin fetch error for {}: {}", key, e);
            return EdgeResponse::GatewayError(EdgeError::OriginUnreachable(e));
        }
    };

    let content_type = fetched.content_type;
    let body = fetched.body;

    let stored = match content_type.as_deref() {
        Some(content_type) if is_cacheable(&key, Some(content_type)) => {
            let entry = cache.store(&key, body.clone(), content_type);
            tracing::info!("Cached: {} (TTL: {:?})", key, cache.ttl());
            Some(entry)
        }
        _ => {
            tracing::debug!("Not caching {} ({:?})", key, content_type);
            None
        }
    };

    let validator = match &stored {
        Some(entry) => entry.validator.clone(),
        None => generate_validator(&body),
    };

    EdgeResponse::Miss(MissResponse {
        key,
        content_type,
        validator,
        body,
        stored: stored.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use http::StatusCode;
    use parking_lot::Mutex;

    use super::*;
    use crate::cache::CacheEntry;
    use crate::client::{ApiResponse, OriginResponse};
    use crate::proxy::CacheStatus;

    #[derive(Default)]
    struct FakeOrigin {
        assets: Mutex<HashMap<String, (Option<&'static str>, Bytes)>>,
        calls: AtomicUsize,
    }

    impl FakeOrigin {
        fn serve(&self, key: &str, content_type: Option<&'static str>, body: &'static str) {
            self.assets
                .lock()
                .insert(key.to_string(), (content_type, Bytes::from_static(body.as_bytes())));
        }
    }

    #[async_trait]
    impl OriginClient for FakeOrigin {
        async fn get(&self, key: &str) -> Result<OriginResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.assets.lock().get(key) {
                Some((content_type, body)) => Ok(OriginResponse {
                    content_type: content_type.map(str::to_string),
                    body: body.clone(),
                }),
                None => Err(FetchError::Status(StatusCode::NOT_FOUND)),
            }
        }
    }

    #[derive(Default)]
    struct FakeApi {
        down: bool,
        seen: Mutex<Vec<ApiRequest>>,
    }

    #[async_trait]
    impl ApiClient for FakeApi {
        async fn forward(&self, request: ApiRequest) -> Result<ApiResponse, FetchError> {
            self.seen.lock().push(request);
            if self.down {
                return Err(FetchError::Status(StatusCode::INTERNAL_SERVER_ERROR));
            }
            Ok(ApiResponse {
                status: StatusCode::OK,
                content_type: Some("application/json".to_string()),
                body: Bytes::from_static(br#"[{"id":1,"title":"Inception"}]"#),
            })
        }
    }

    fn service(origin: Arc<FakeOrigin>, api: Arc<FakeApi>) -> CacheService {
        CacheService::new(EdgeConfig::default(), origin, api)
    }

    #[tokio::test]
    async fn miss_then_hit_then_purge_then_miss() {
        let origin = Arc::new(FakeOrigin::default());
        origin.serve("/index.html", Some("text/html"), "<h1>hi</h1>");
        let edge = service(Arc::clone(&origin), Arc::default());

        let first = edge.handle(EdgeRequest::get("/index.html")).await;
        let EdgeResponse::Miss(miss) = first else {
            panic!("expected MISS");
        };
        assert!(miss.stored);
        assert_eq!(miss.validator, generate_validator(b"<h1>hi</h1>"));

        let second = edge.handle(EdgeRequest::get("/index.html")).await;
        let EdgeResponse::Hit(entry) = second else {
            panic!("expected HIT");
        };
        assert_eq!(entry.body, miss.body);
        assert_eq!(entry.validator, miss.validator);

        assert_eq!(edge.purge(), 1);
        let third = edge.handle(EdgeRequest::get("/index.html")).await;
        assert_eq!(third.cache_status(), Some(CacheStatus::Miss));
        assert_eq!(origin.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_cacheable_content_is_served_but_not_stored() {
        let origin = Arc::new(FakeOrigin::default());
        origin.serve("/file.bin", Some("application/octet-stream"), "\x00\x01");
        origin.serve("/untyped", None, "plain");
        let edge = service(Arc::clone(&origin), Arc::default());

        for key in ["/file.bin", "/untyped", "/file.bin"] {
            let response = edge.handle(EdgeRequest::get(key)).await;
            let EdgeResponse::Miss(miss) = response else {
                panic!("expected MISS for {key}");
            };
            assert!(!miss.stored);
        }

        assert!(edge.cache().is_empty());
        assert_eq!(origin.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched_and_overwritten() {
        let origin = Arc::new(FakeOrigin::default());
        origin.serve("/style.css", Some("text/css"), "body{}");
        let edge = service(Arc::clone(&origin), Arc::default());

        let past = Utc::now() - chrono::TimeDelta::days(1);
        edge.cache().put(CacheEntry::new(
            "/style.css".to_string(),
            Bytes::from_static(b"stale"),
            "text/css".to_string(),
            past,
            edge.config().ttl(),
        ));

        let response = edge.handle(EdgeRequest::get("/style.css")).await;
        assert_eq!(response.cache_status(), Some(CacheStatus::Miss));

        let entry = edge.cache().peek("/style.css").unwrap();
        assert_eq!(entry.body, Bytes::from_static(b"body{}"));
        assert!(entry.is_fresh_at(Utc::now()));
    }

    #[tokio::test]
    async fn origin_failure_leaves_store_untouched() {
        let origin = Arc::new(FakeOrigin::default());
        let edge = service(Arc::clone(&origin), Arc::default());

        let response = edge.handle(EdgeRequest::get("/missing.html")).await;
        assert!(matches!(
            response,
            EdgeResponse::GatewayError(EdgeError::OriginUnreachable(FetchError::Status(
                StatusCode::NOT_FOUND
            )))
        ));
        assert!(edge.cache().is_empty());

        let stats = edge.stats();
        assert_eq!((stats.requests, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn api_requests_bypass_the_cache() {
        let origin = Arc::new(FakeOrigin::default());
        let api = Arc::new(FakeApi::default());
        let edge = service(Arc::clone(&origin), Arc::clone(&api));

        let response = edge
            .handle(EdgeRequest {
                method: Method::POST,
                target: "/api/bookings?notify=1".to_string(),
                content_type: Some("application/json".to_string()),
                body: Bytes::from_static(br#"{"movieId":1}"#),
            })
            .await;
        assert_eq!(response.cache_status(), Some(CacheStatus::Bypass));

        let seen = api.seen.lock();
        assert_eq!(seen[0].method, Method::POST);
        assert_eq!(seen[0].path_and_query, "/api/bookings?notify=1");
        assert_eq!(seen[0].body.as_deref(), Some(&br#"{"movieId":1}"#[..]));
        assert_eq!(origin.calls.load(Ordering::SeqCst), 0);
        assert!(edge.cache().is_empty());
    }

    #[tokio::test]
    async fn api_failure_is_a_gateway_error() {
        let api = Arc::new(FakeApi {
            down: true,
            ..Default::default()
        });
        let edge = service(Arc::default(), api);

        let response = edge.handle(EdgeRequest::get("/api/movies")).await;
        assert!(matches!(
            response,
            EdgeResponse::GatewayError(EdgeError::ApiUnreachable(_))
        ));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn requests_equal_hits_plus_misses_plus_bypasses() {
        let origin = Arc::new(FakeOrigin::default());
        origin.serve("/", Some("text/html"), "home");
        origin.serve("/app.js", Some("application/javascript"), "run()");
        let edge = service(origin, Arc::default());

        for target in ["/", "/app.js", "/api/movies", "/", "/nope", "/api/movies/1", "/app.js"] {
            edge.handle(EdgeRequest::get(target)).await;
        }

        let stats = edge.stats();
        assert_eq!(stats.requests, 7);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.bypasses, 2);
        assert_eq!(stats.requests, stats.hits + stats.misses + stats.bypasses);
        assert_eq!(stats.hit_rate, "28.57%");
    }

    #[test]
    fn empty_target_keys_to_root() {
        assert_eq!(EdgeRequest::get("").cache_key(), "/");
        assert_eq!(EdgeRequest::get("/a?b=c").cache_key(), "/a?b=c");
        assert!(EdgeRequest::get("/api/movies").is_dynamic());
        assert!(!EdgeRequest::get("/api").is_dynamic());
    }
}
