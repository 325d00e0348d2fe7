//! Advisor error types. These never leave the crate's public boundary as
//! errors; [`HttpAdvisor`](crate::HttpAdvisor) maps them to the fallback text.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    #[error("invalid request: {0}")]
    Request(#[from] ::http::Error),

    #[error("advisor returned status {0}")]
    Status(::http::StatusCode),

    #[error("invalid advisor response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("advisor returned an empty report")]
    Empty,

    #[error("advisor did not answer within {0:?}")]
    Timeout(Duration),
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;
