//! The seam between the gateway and the upstream instance.
use async_trait::async_trait;
use fedinbox_http::HttpError;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("invalid status id: {0:?}")]
    InvalidId(String),
}

impl UpstreamError {
    /// Best available detail to hand back to the gateway's caller: the
    /// upstream JSON error body when there was one, the message otherwise.
    pub fn details(&self) -> Value {
        match self {
            UpstreamError::Http(HttpError::Api {
                body: Some(body), ..
            }) => body.clone(),
            UpstreamError::Http(HttpError::Api { message, .. }) => Value::String(message.clone()),
            other => Value::String(other.to_string()),
        }
    }
}

/// Everything the gateway needs from the upstream instance.
///
/// Payloads are passed through as raw JSON so the gateway never reshapes
/// what upstream returns.
#[async_trait]
pub trait TimelineUpstream: Send + Sync {
    /// Public timeline, newest first, capped at `limit` posts. Unauthenticated.
    async fn public_timeline(&self, limit: u32) -> Result<Vec<Value>, UpstreamError>;

    /// Publish a new status with the service credential.
    async fn create_status(&self, status: &str) -> Result<Value, UpstreamError>;

    async fn favourite(&self, id: &str) -> Result<Value, UpstreamError>;

    async fn unfavourite(&self, id: &str) -> Result<Value, UpstreamError>;

    /// Statuses favourited by the credential's account.
    async fn favourites(&self) -> Result<Vec<Value>, UpstreamError>;
}
