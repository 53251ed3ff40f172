use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode, header::CONTENT_TYPE};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use serde::Serialize;
use uuid::Uuid;

use super::{CacheService, EdgeRequest};
use crate::admin::handlers::PurgeResponse;
use crate::config::{PURGE_PATH, STATS_PATH};

/// Entry point for every connection on the edge listener.
#[tracing::instrument(level = "info", name = "EdgeRequest", skip(service, req), fields(req_id = %Uuid::new_v4(), method = %req.method(), uri = %req.uri()))]
pub async fn process_edge_request(
    service: Arc<CacheService>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match req.uri().path() {
        STATS_PATH => return Ok(stats_response(&service, req.method())),
        PURGE_PATH => return Ok(purge_response(&service, req.method())),
        _ => {}
    }

    let method = req.method().clone();
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            // Never forward a partial body upstream
            tracing::warn!("Failed to read request body: {}", e);
            return Ok(empty_response(StatusCode::BAD_REQUEST));
        }
    };

    let request = EdgeRequest {
        method,
        target,
        content_type,
        body,
    };

    let response = service.handle(request).await;
    if let Some(status) = response.cache_status() {
        tracing::debug!("Responding with X-Cache: {}", status);
    }

    Ok(response.into_http())
}

fn stats_response(service: &CacheService, method: &Method) -> Response<Full<Bytes>> {
    if method != Method::GET {
        return empty_response(StatusCode::METHOD_NOT_ALLOWED);
    }

    json_response(StatusCode::OK, &service.stats())
}

fn purge_response(service: &CacheService, method: &Method) -> Response<Full<Bytes>> {
    if method != Method::POST {
        return empty_response(StatusCode::METHOD_NOT_ALLOWED);
    }

    let cleared = service.purge();
    json_response(StatusCode::OK, &PurgeResponse::new(cleared))
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = Response::new(Full::new(Bytes::from(body)));
            *response.status_mut() = status;
            response.headers_mut().insert(
                CONTENT_TYPE,
                http::HeaderValue::from_static("application/json"),
            );
            response
        }
        Err(e) => {
            tracing::error!("Failed to serialize admin response: {}", e);
            empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
