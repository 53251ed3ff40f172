use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_TYPE;

use super::FetchError;

/// What the edge keeps from a successful origin fetch.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Source of truth for cacheable assets.
#[async_trait]
pub trait OriginClient: Send + Sync {
    /// Fetches `key` (path plus raw query) from the origin. Non-2xx statuses
    /// are errors.
    async fn get(&self, key: &str) -> Result<OriginResponse, FetchError>;
}

pub struct HttpOriginClient {
    client: reqwest::Client,
    base_url: String,
    deadline: Option<Duration>,
}

impl HttpOriginClient {
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
impl OriginClient for HttpOriginClient {
    #[tracing::instrument(level = "debug", name = "OriginFetch", skip(self))]
    async fn get(&self, key: &str) -> Result<OriginResponse, FetchError> {
        let url = format!("{}{}", self.base_url, key);
        tracing::debug!("Fetching {} from origin", url);

        let mut request = self.client.get(url);
        if let Some(deadline) = self.deadline {
            request = request.timeout(deadline);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.deadline))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        // A content type that isn't valid UTF-8 counts as absent
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.deadline))?;

        Ok(OriginResponse { content_type, body })
    }
}
