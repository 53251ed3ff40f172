use std::time::Duration;

use http::StatusCode;

/// Failure of a single upstream call. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {0}")]
    Status(StatusCode),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error, deadline: Option<Duration>) -> Self {
        match deadline {
            Some(deadline) if err.is_timeout() => FetchError::Timeout(deadline),
            _ => FetchError::Transport(err),
        }
    }
}
