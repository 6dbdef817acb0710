//! Client side of the timeline gateway's HTTP surface.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use fedinbox_config::ClientSettings;
use fedinbox_http::{Auth, HttpClient, HttpError, RequestOpts};
use fedinbox_social::mastodon::Status;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

/// What the inbox needs from the gateway.
#[async_trait]
pub trait TimelineGateway: Send + Sync {
    /// Posts from the public timeline. Entries that do not decode as a
    /// status are skipped.
    async fn timeline(&self) -> Result<Vec<Status>, HttpError>;
    /// Ids of the posts the service account has favourited.
    async fn favorites(&self) -> Result<Vec<String>, HttpError>;
    async fn share(&self, text: &str) -> Result<Value, HttpError>;
    async fn favorite(&self, id: &str) -> Result<Value, HttpError>;
    async fn unfavorite(&self, id: &str) -> Result<Value, HttpError>;
}

#[derive(Clone)]
pub struct GatewayClient {
    http: HttpClient,
    basic: Option<(String, String)>,
}

impl fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base", &self.http.base().as_str())
            .field("basic_auth", &self.basic.as_ref().map(|(user, _)| user))
            .finish()
    }
}

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

impl GatewayClient {
    pub fn new(gateway_url: &str) -> Result<Self, HttpError> {
        Ok(Self {
            http: HttpClient::new(gateway_url)?,
            basic: None,
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, HttpError> {
        let mut client = Self::new(&settings.gateway_url)?;
        if let Some((user, pass)) = settings.basic_auth() {
            client = client.with_basic_auth(user, pass);
        }
        if let Some(secs) = settings.request_timeout_secs {
            client = client.with_timeout(Duration::from_secs(secs));
        }
        Ok(client)
    }

    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.basic = Some((username.to_string(), password.to_string()));
        self
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.http = self.http.with_timeout(dur);
        self
    }

    fn opts(&self) -> RequestOpts<'_> {
        RequestOpts {
            auth: self.basic.as_ref().map(|(username, password)| Auth::Basic {
                username: username.as_str(),
                password: password.as_str(),
            }),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TimelineGateway for GatewayClient {
    async fn timeline(&self) -> Result<Vec<Status>, HttpError> {
        let raw: Vec<Value> = self.http.get_json("timeline-list", self.opts()).await?;
        let total = raw.len();
        let posts: Vec<Status> = raw
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();
        if posts.len() < total {
            warn!(skipped = total - posts.len(), "Skipped undecodable timeline entries");
        }
        Ok(posts)
    }

    async fn favorites(&self) -> Result<Vec<String>, HttpError> {
        let raw: Vec<Value> = self.http.get_json("favorites-list", self.opts()).await?;
        Ok(raw
            .into_iter()
            .filter_map(|v| serde_json::from_value::<IdOnly>(v).ok())
            .map(|s| s.id)
            .collect())
    }

    async fn share(&self, text: &str) -> Result<Value, HttpError> {
        self.http
            .post_json_opts("share", &json!({ "postContent": text }), self.opts())
            .await
    }

    async fn favorite(&self, id: &str) -> Result<Value, HttpError> {
        self.http
            .post_json_opts("favorite", &json!({ "id": id }), self.opts())
            .await
    }

    async fn unfavorite(&self, id: &str) -> Result<Value, HttpError> {
        self.http
            .post_json_opts("unfavorite", &json!({ "id": id }), self.opts())
            .await
    }
}
