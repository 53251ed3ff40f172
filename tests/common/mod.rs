//! Shared fixtures: a static origin, a small catalog API and an edge server
//! wired to them, all on ephemeral local ports.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
    routing::get,
};
use edge_cache::config::EdgeConfig;
use edge_cache::proxy::CacheService;
use edge_cache::server::serve_edge;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const INDEX_BODY: &str = "<h1>hi</h1>";

#[derive(Clone, Default)]
pub struct OriginHits(Arc<AtomicUsize>);

impl OriginHits {
    fn record(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bodies the booking endpoint received, in arrival order.
#[derive(Clone, Default)]
pub struct ApiBodies(Arc<Mutex<Vec<Bytes>>>);

impl ApiBodies {
    pub fn received(&self) -> Vec<Bytes> {
        self.0.lock().clone()
    }
}

pub struct TestEdge {
    pub addr: SocketAddr,
    pub service: Arc<CacheService>,
    pub origin_hits: OriginHits,
    pub client: reqwest::Client,
}

impl TestEdge {
    pub fn url(&self, target: &str) -> String {
        format!("http://{}{}", self.addr, target)
    }

    pub async fn get(&self, target: &str) -> reqwest::Response {
        self.client.get(self.url(target)).send().await.unwrap()
    }
}

async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub async fn start_origin(hits: OriginHits) -> SocketAddr {
    let router = Router::new()
        .route(
            "/index.html",
            get(|State(hits): State<OriginHits>| async move {
                hits.record();
                ([(CONTENT_TYPE, "text/html")], INDEX_BODY)
            }),
        )
        .route(
            "/logo.png",
            get(|State(hits): State<OriginHits>| async move {
                hits.record();
                ([(CONTENT_TYPE, "image/png")], vec![0x89u8, b'P', b'N', b'G'])
            }),
        )
        .route(
            "/data.bin",
            get(|State(hits): State<OriginHits>| async move {
                hits.record();
                ([(CONTENT_TYPE, "application/octet-stream")], vec![0u8, 1, 2])
            }),
        )
        .route(
            "/app.js",
            get(|State(hits): State<OriginHits>| async move {
                hits.record();
                ([(CONTENT_TYPE, "application/javascript")], "console.log(1)")
            }),
        )
        .route(
            "/broken",
            get(|State(hits): State<OriginHits>| async move {
                hits.record();
                (StatusCode::INTERNAL_SERVER_ERROR, "boom")
            }),
        )
        .route(
            "/slow.css",
            get(|State(hits): State<OriginHits>| async move {
                hits.record();
                tokio::time::sleep(Duration::from_secs(3)).await;
                ([(CONTENT_TYPE, "text/css")], "body{}")
            }),
        )
        .with_state(hits);

    spawn_router(router).await
}

pub async fn start_api() -> SocketAddr {
    let router = Router::new()
        .route(
            "/api/movies",
            get(|| async { Json(json!([{ "id": 1, "title": "Inception" }])) }),
        )
        .route(
            "/api/movies/{id}",
            get(|Path(id): Path<u32>| async move {
                match id {
                    1 => Json(json!({ "id": 1, "title": "Inception" })).into_response(),
                    _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "Movie not found" })))
                        .into_response(),
                }
            }),
        )
        .route(
            "/api/bookings",
            axum::routing::post(|Json(booking): Json<Value>| async move {
                (StatusCode::CREATED, Json(json!({ "booked": booking })))
            }),
        );

    spawn_router(router).await
}

/// API whose booking endpoint records every body it is handed.
pub async fn start_recording_api(bodies: ApiBodies) -> SocketAddr {
    let router = Router::new()
        .route(
            "/api/bookings",
            axum::routing::post(|State(bodies): State<ApiBodies>, body: Bytes| async move {
                bodies.0.lock().push(body);
                StatusCode::CREATED
            }),
        )
        .with_state(bodies);

    spawn_router(router).await
}

pub async fn start_edge_with(
    origin: SocketAddr,
    api: SocketAddr,
    fetch_timeout: Duration,
    origin_hits: OriginHits,
) -> TestEdge {
    let config = EdgeConfig::new(
        &format!("http://{origin}"),
        &format!("http://{api}"),
        Duration::from_secs(3600),
        fetch_timeout,
    )
    .unwrap();
    let service = Arc::new(CacheService::from_config(config).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let edge_service = Arc::clone(&service);
    tokio::spawn(async move {
        let _ = serve_edge(listener, edge_service).await;
    });

    TestEdge {
        addr,
        service,
        origin_hits,
        client: reqwest::Client::new(),
    }
}

pub async fn start_edge() -> TestEdge {
    let hits = OriginHits::default();
    let origin = start_origin(hits.clone()).await;
    let api = start_api().await;
    start_edge_with(origin, api, Duration::from_secs(30), hits).await
}
