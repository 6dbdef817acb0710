//! Thin wrapper around the Mastodon v1 REST API with fedinbox defaults.
//!
//! Attaches the service credential to every authenticated call and shapes
//! request paths before delegating to the shared HTTP client. Reads of the
//! public timeline go out without credentials.
use crate::mastodon::upstream::{TimelineUpstream, UpstreamError};
use async_trait::async_trait;
use fedinbox_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;

#[derive(Clone)]
pub struct MastodonApi {
    http: HttpClient,
    access_token: String,
}

impl fmt::Debug for MastodonApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MastodonApi")
            .field("instance", &self.http.base().as_str())
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl MastodonApi {
    pub fn new(instance_url: &str, access_token: String) -> Result<Self, HttpError> {
        let http = HttpClient::new(instance_url)?;
        Ok(Self { http, access_token })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    fn authed(&self) -> RequestOpts<'_> {
        RequestOpts {
            auth: Some(Auth::Bearer(&self.access_token)),
            ..Default::default()
        }
    }
}

/// Status ids are interpolated into the request path, so only accept the
/// characters Mastodon-compatible servers actually use.
fn checked_id(id: &str) -> Result<&str, UpstreamError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(UpstreamError::InvalidId(id.to_string()))
    }
}

#[async_trait]
impl TimelineUpstream for MastodonApi {
    async fn public_timeline(&self, limit: u32) -> Result<Vec<Value>, UpstreamError> {
        let limit = limit.to_string();
        let posts: Vec<Value> = self
            .http
            .get_json(
                "api/v1/timelines/public",
                RequestOpts {
                    query: Some(vec![("limit", limit.into())]),
                    ..Default::default()
                },
            )
            .await?;
        tracing::debug!(count = posts.len(), "mastodon.timeline.public");
        Ok(posts)
    }

    async fn create_status(&self, status: &str) -> Result<Value, UpstreamError> {
        let created: Value = self
            .http
            .post_json_opts("api/v1/statuses", &json!({ "status": status }), self.authed())
            .await?;
        let id = created.get("id").and_then(Value::as_str).unwrap_or("-");
        tracing::info!(%id, "mastodon.status.created");
        Ok(created)
    }

    async fn favourite(&self, id: &str) -> Result<Value, UpstreamError> {
        let id = checked_id(id)?;
        let status = self
            .http
            .post_empty(&format!("api/v1/statuses/{id}/favourite"), self.authed())
            .await?;
        tracing::info!(%id, "mastodon.status.favourited");
        Ok(status)
    }

    async fn unfavourite(&self, id: &str) -> Result<Value, UpstreamError> {
        let id = checked_id(id)?;
        let status = self
            .http
            .post_empty(&format!("api/v1/statuses/{id}/unfavourite"), self.authed())
            .await?;
        tracing::info!(%id, "mastodon.status.unfavourited");
        Ok(status)
    }

    async fn favourites(&self) -> Result<Vec<Value>, UpstreamError> {
        let list: Vec<Value> = self
            .http
            .get_json("api/v1/favourites", self.authed())
            .await?;
        tracing::debug!(count = list.len(), "mastodon.favourites.list");
        Ok(list)
    }
}
