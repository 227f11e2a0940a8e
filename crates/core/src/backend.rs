use crate::{
    endpoint::Endpoint,
    protocol::{BackendEnvelope, ConversationRequest, HealthInfo, ResponsePayload},
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Per-turn HTTP timeout when the configuration does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub const TIMEOUT_APOLOGY: &str = "I'm having trouble thinking right now. Please try again.";
pub const UNREACHABLE_APOLOGY: &str = "I can't connect to my brain right now. Please try again.";
pub const BACKEND_APOLOGY: &str = "Something went wrong with my thinking. Please try again.";
pub const UNEXPECTED_APOLOGY: &str = "I encountered an unexpected error. Please try again.";

/// Why a backend call produced no usable payload.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request timed out")]
    Timeout,
    #[error("Backend unreachable: {0}")]
    Unreachable(String),
    #[error("API error: {0}")]
    BackendStatus(u16),
    #[error("Conversation failed: {0}")]
    BackendRejected(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// The fixed spoken apology for this failure.
    pub fn apology(&self) -> &'static str {
        match self {
            ClientError::Timeout => TIMEOUT_APOLOGY,
            ClientError::Unreachable(_) => UNREACHABLE_APOLOGY,
            ClientError::BackendStatus(_) | ClientError::BackendRejected(_) => BACKEND_APOLOGY,
            ClientError::MalformedResponse(_) => UNEXPECTED_APOLOGY,
        }
    }

    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Unreachable(e.to_string())
        }
    }
}

/// A client for the remote conversation backend.
///
/// One call is one attempt: no retries, no state kept between calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Sends one turn and returns the parsed `data` payload.
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: &ConversationRequest,
        timeout: Duration,
    ) -> Result<ResponsePayload, ClientError>;

    /// Probes `GET /health`, used when validating a setup.
    async fn health(&self, endpoint: &Endpoint, timeout: Duration) -> Result<HealthInfo, ClientError>;
}

/// `ConversationBackend` over plain HTTP with `reqwest`.
#[derive(Clone)]
pub struct HttpBackendClient {
    client: Client,
}

impl HttpBackendClient {
    /// Creates a client that keeps no idle connections between turns.
    pub fn new() -> Result<Self, ClientError> {
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ClientError::Unreachable(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

/// Decodes a response body into its payload.
///
/// `success: false` is a rejection; a successful envelope without `data` is
/// treated as an empty payload.
pub fn parse_envelope(body: &str) -> Result<ResponsePayload, ClientError> {
    let envelope: BackendEnvelope =
        serde_json::from_str(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
    if !envelope.success {
        return Err(ClientError::BackendRejected(
            envelope.error.unwrap_or_else(|| "Unknown error".to_string()),
        ));
    }
    Ok(envelope.data.unwrap_or_default())
}

#[async_trait]
impl ConversationBackend for HttpBackendClient {
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: &ConversationRequest,
        timeout: Duration,
    ) -> Result<ResponsePayload, ClientError> {
        let url = endpoint.conversation_url();
        debug!(%url, payload = ?request, "Sending payload to backend");

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        let status = response.status();
        info!(status = status.as_u16(), "Backend response status");
        if !status.is_success() {
            return Err(ClientError::BackendStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(ClientError::from_transport)?;
        parse_envelope(&body)
    }

    async fn health(&self, endpoint: &Endpoint, timeout: Duration) -> Result<HealthInfo, ClientError> {
        let response = self
            .client
            .get(endpoint.health_url())
            .timeout(timeout)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ClientError::BackendStatus(status.as_u16()));
        }
        let body = response.text().await.map_err(ClientError::from_transport)?;
        serde_json::from_str(&body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }
}
