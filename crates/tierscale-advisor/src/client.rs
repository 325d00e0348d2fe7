//! HTTP advisor: posts the snapshot prompt to a text-generation endpoint.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AdvisorError, AdvisorResult};
use crate::snapshot::AdvisorySnapshot;
use crate::{Advisor, BoxFuture, FAILURE_MESSAGE};

/// `[advisor]` configuration table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// `host:port` of the endpoint. Advisory reports are disabled when unset.
    pub endpoint: Option<String>,
    /// Request path on the endpoint.
    pub path: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Environment variable holding an optional bearer token.
    pub token_env: Option<String>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            path: "/v1/generate".to_string(),
            timeout_ms: 10_000,
            token_env: Some("TIERSCALE_ADVISOR_TOKEN".to_string()),
        }
    }
}

impl AdvisorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Advisor backed by an HTTP/1.1 text-generation endpoint.
#[derive(Debug, Clone)]
pub struct HttpAdvisor {
    address: String,
    path: String,
    timeout: Duration,
    token: Option<String>,
}

impl HttpAdvisor {
    pub fn new(address: impl Into<String>, path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            path: path.into(),
            timeout,
            token: None,
        }
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build from config, or `None` when no endpoint is configured.
    ///
    /// The token is read from the configured environment variable; an unset
    /// or empty variable means no `authorization` header.
    pub fn from_config(config: &AdvisorConfig) -> Option<Self> {
        let endpoint = config.endpoint.as_deref()?.trim();
        let address = endpoint
            .strip_prefix("http://")
            .unwrap_or(endpoint)
            .trim_end_matches('/');
        if address.is_empty() {
            return None;
        }

        let mut advisor = Self::new(address, config.path.clone(), config.timeout());
        if let Some(token) = config
            .token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|token| !token.is_empty())
        {
            advisor = advisor.with_token(token);
        }
        Some(advisor)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Perform one request, surfacing every failure as an [`AdvisorError`].
    pub async fn request(&self, snapshot: &AdvisorySnapshot) -> AdvisorResult<String> {
        tokio::time::timeout(self.timeout, self.send(snapshot))
            .await
            .map_err(|_| AdvisorError::Timeout(self.timeout))?
    }

    async fn send(&self, snapshot: &AdvisorySnapshot) -> AdvisorResult<String> {
        let uri = format!("http://{}{}", self.address, self.path);
        let prompt = snapshot.prompt();
        let body = serde_json::to_vec(&GenerateRequest { prompt: &prompt })?;

        let stream = tokio::net::TcpStream::connect(&self.address)
            .await
            .map_err(|source| AdvisorError::Connect {
                address: self.address.clone(),
                source,
            })?;
        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "advisor connection closed with error");
            }
        });

        let mut req = http::Request::builder()
            .method(http::Method::POST)
            .uri(&uri)
            .header(http::header::HOST, &self.address)
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(http::header::USER_AGENT, "tierscale-advisor/0.1");
        if let Some(ref token) = self.token {
            req = req.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = req.body(Full::new(Bytes::from(body)))?;

        debug!(%uri, "requesting advisory report");
        let resp = sender.send_request(req).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AdvisorError::Status(status));
        }

        let bytes = resp.into_body().collect().await?.to_bytes();
        let parsed: GenerateResponse = serde_json::from_slice(&bytes)?;
        let text = parsed.text.trim();
        if text.is_empty() {
            return Err(AdvisorError::Empty);
        }
        Ok(text.to_string())
    }
}

impl Advisor for HttpAdvisor {
    fn summarize<'a>(&'a self, snapshot: &'a AdvisorySnapshot) -> BoxFuture<'a, String> {
        Box::pin(async move {
            match self.request(snapshot).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(address = %self.address, error = %e, "advisory request failed");
                    FAILURE_MESSAGE.to_string()
                }
            }
        })
    }
}
