use std::sync::Arc;
use std::time::Duration;

use fedinbox_common::FedinboxError;
use fedinbox_config::GatewaySettings;
use fedinbox_social::mastodon::{MastodonApi, TimelineUpstream};
use tracing::{info, warn};

/// Mastodon refuses public timeline pages above this size.
const MAX_TIMELINE_LIMIT: u32 = 40;

#[derive(Clone)]
pub struct OperatorAuth {
    pub username: String,
    pub password: String,
}

/// Immutable per-process state shared by every handler.
pub struct AppState {
    pub upstream: Arc<dyn TimelineUpstream>,
    pub timeline_limit: u32,
    pub operator: Option<OperatorAuth>,
}

impl AppState {
    /// Build state around an explicit upstream, e.g. a test double.
    pub fn new(settings: &GatewaySettings, upstream: Arc<dyn TimelineUpstream>) -> Arc<Self> {
        let timeline_limit = settings.timeline_limit.clamp(1, MAX_TIMELINE_LIMIT);
        if timeline_limit != settings.timeline_limit {
            warn!(
                configured = settings.timeline_limit,
                used = timeline_limit,
                "gateway.timeline_limit out of range, clamping"
            );
        }

        let operator = settings
            .operator_credentials()
            .map(|(username, password)| OperatorAuth {
                username: username.to_string(),
                password: password.to_string(),
            });

        Arc::new(Self {
            upstream,
            timeline_limit,
            operator,
        })
    }

    /// Build state talking to the configured Mastodon instance.
    pub fn from_settings(settings: &GatewaySettings) -> fedinbox_common::Result<Arc<Self>> {
        let token = settings
            .require_access_token()
            .map_err(|e| FedinboxError::Config(e.to_string()))?;
        let mut api = MastodonApi::new(&settings.instance_url, token.expose().to_string())
            .map_err(|e| {
                FedinboxError::Config(format!(
                    "invalid gateway.instance_url {}: {e}",
                    settings.instance_url
                ))
            })?;
        if let Some(secs) = settings.request_timeout_secs {
            api = api.with_timeout(Duration::from_secs(secs));
        }

        info!(
            instance = %settings.instance_url,
            operator_auth = settings.operator_credentials().is_some(),
            "Initialized upstream client"
        );
        Ok(Self::new(settings, Arc::new(api)))
    }
}
