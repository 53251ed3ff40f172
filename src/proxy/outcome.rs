use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{
    HeaderMap, HeaderName, HeaderValue, Response, StatusCode,
    header::{CACHE_CONTROL, CONTENT_TYPE, ETAG},
};
use http_body_util::Full;

use super::EdgeError;
use crate::cache::CacheEntry;
use crate::client::ApiResponse;
use crate::config::constants::{
    BYPASS_REASON, EDGE_CACHE_CONTROL, SERVED_FROM_EDGE, SERVED_FROM_ORIGIN,
};

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
pub const X_CACHE_KEY: HeaderName = HeaderName::from_static("x-cache-key");
pub const X_CACHE_REASON: HeaderName = HeaderName::from_static("x-cache-reason");
pub const X_SERVED_FROM: HeaderName = HeaderName::from_static("x-served-from");

const API_GATEWAY_ERROR: &str = "Bad Gateway - API server unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin content served on a miss, whether or not it was stored.
#[derive(Debug, Clone)]
pub struct MissResponse {
    pub key: String,
    pub content_type: Option<String>,
    pub validator: String,
    pub body: Bytes,
    pub stored: bool,
}

/// Every way the edge can answer a proxied request. Each variant owns its
/// header set, see [`EdgeResponse::into_http`].
#[derive(Debug)]
pub enum EdgeResponse {
    Hit(Arc<CacheEntry>),
    Miss(MissResponse),
    Bypass(ApiResponse),
    GatewayError(EdgeError),
}

impl EdgeResponse {
    pub fn cache_status(&self) -> Option<CacheStatus> {
        match self {
            EdgeResponse::Hit(_) => Some(CacheStatus::Hit),
            EdgeResponse::Miss(_) => Some(CacheStatus::Miss),
            EdgeResponse::Bypass(_) => Some(CacheStatus::Bypass),
            EdgeResponse::GatewayError(_) => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            EdgeResponse::Hit(_) | EdgeResponse::Miss(_) => StatusCode::OK,
            EdgeResponse::Bypass(api) => api.status,
            EdgeResponse::GatewayError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn into_http(self) -> Response<Full<Bytes>> {
        let status = self.status();
        let mut headers = HeaderMap::new();

        let body = match self {
            EdgeResponse::Hit(entry) => {
                set_header(&mut headers, CONTENT_TYPE, &entry.content_type);
                set_asset_headers(&mut headers, &entry.validator, &entry.key);
                set_header(&mut headers, X_CACHE, CacheStatus::Hit.as_str());
                set_header(&mut headers, X_SERVED_FROM, SERVED_FROM_EDGE);
                entry.body.clone()
            }
            EdgeResponse::Miss(miss) => {
                if let Some(content_type) = &miss.content_type {
                    set_header(&mut headers, CONTENT_TYPE, content_type);
                }
                set_asset_headers(&mut headers, &miss.validator, &miss.key);
                set_header(&mut headers, X_CACHE, CacheStatus::Miss.as_str());
                set_header(&mut headers, X_SERVED_FROM, SERVED_FROM_ORIGIN);
                miss.body
            }
            EdgeResponse::Bypass(api) => {
                let content_type = api.content_type.as_deref().unwrap_or("application/json");
                set_header(&mut headers, CONTENT_TYPE, content_type);
                set_header(&mut headers, X_CACHE, CacheStatus::Bypass.as_str());
                set_header(&mut headers, X_CACHE_REASON, BYPASS_REASON);
                api.body
            }
            EdgeResponse::GatewayError(EdgeError::ApiUnreachable(_)) => {
                set_header(&mut headers, CONTENT_TYPE, "application/json");
                Bytes::from(serde_json::json!({ "error": API_GATEWAY_ERROR }).to_string())
            }
            EdgeResponse::GatewayError(err) => {
                set_header(&mut headers, CONTENT_TYPE, "text/html; charset=utf-8");
                Bytes::from(origin_error_page(&err))
            }
        };

        let mut response = Response::new(Full::new(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

fn set_asset_headers(headers: &mut HeaderMap, validator: &str, key: &str) {
    set_header(headers, ETAG, validator);
    set_header(headers, CACHE_CONTROL, EDGE_CACHE_CONTROL);
    set_header(headers, X_CACHE_KEY, key);
}

fn set_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!("Dropping header {} with invalid value {:?}", name, value),
    }
}

fn origin_error_page(err: &EdgeError) -> String {
    let reason = html_escape(&err.to_string());
    format!(
        r#"<html>
  <body style="font-family: system-ui; padding: 2rem; background: #0b0c10; color: #f5f5f5;">
    <h1>502 Bad Gateway</h1>
    <p>CDN Edge Server could not reach the origin server.</p>
    <p>Error: {reason}</p>
    <p><a href="/" style="color: #66d9ef;">Try again</a></p>
  </body>
</html>
"#
    )
}

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
