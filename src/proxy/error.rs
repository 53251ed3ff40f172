use crate::client::FetchError;

/// Per-request terminal failures. Neither kind touches the cache.
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    #[error("origin unreachable: {0}")]
    OriginUnreachable(#[source] FetchError),

    #[error("API unreachable: {0}")]
    ApiUnreachable(#[source] FetchError),

    #[error("origin fetch task failed: {0}")]
    FetchTask(#[from] tokio::task::JoinError),
}
