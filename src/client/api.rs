use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode, header::CONTENT_TYPE};

use super::FetchError;

const DEFAULT_API_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path_and_query: String,
    pub content_type: Option<String>,
    pub body: Option<Bytes>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Pass-through channel to the backend API. Nothing sent here is cached.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn forward(&self, request: ApiRequest) -> Result<ApiResponse, FetchError>;
}

pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
    deadline: Option<Duration>,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, deadline: Option<Duration>) -> Result<Self, FetchError> {
        let client = reqwest::ClientBuilder::new().http1_only().build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            deadline,
        })
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    #[tracing::instrument(level = "debug", name = "ForwardAPIRequest", skip(self, request), fields(method = %request.method, path = %request.path_and_query))]
    async fn forward(&self, request: ApiRequest) -> Result<ApiResponse, FetchError> {
        let url = format!("{}{}", self.base_url, request.path_and_query);
        let content_type = request
            .content_type
            .unwrap_or_else(|| DEFAULT_API_CONTENT_TYPE.to_string());

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(CONTENT_TYPE, content_type);

        // GET carries no body upstream
        if request.method != Method::GET {
            if let Some(body) = request.body {
                builder = builder.body(body);
            }
        }

        if let Some(deadline) = self.deadline {
            builder = builder.timeout(deadline);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.deadline))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.deadline))?;

        Ok(ApiResponse {
            status,
            content_type,
            body,
        })
    }
}
