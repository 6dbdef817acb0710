#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use fedinbox_config::{GatewaySettings, OperatorCredentials, Secret};
use fedinbox_gateway::{AppState, build_router};
use fedinbox_http::HttpError;
use fedinbox_social::mastodon::{TimelineUpstream, UpstreamError};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Upstream double that records every call it receives.
#[derive(Default)]
pub struct FakeUpstream {
    pub calls: Mutex<Vec<String>>,
    pub fail: bool,
    pub timeline: Vec<Value>,
    pub favourites: Vec<Value>,
}

impl FakeUpstream {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), UpstreamError> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            Err(UpstreamError::Http(HttpError::Network(
                "connection refused".into(),
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TimelineUpstream for FakeUpstream {
    async fn public_timeline(&self, limit: u32) -> Result<Vec<Value>, UpstreamError> {
        self.record(format!("timeline:{limit}"))?;
        Ok(self.timeline.clone())
    }

    async fn create_status(&self, status: &str) -> Result<Value, UpstreamError> {
        self.record(format!("status:{status}"))?;
        Ok(json!({ "id": "new", "content": status }))
    }

    async fn favourite(&self, id: &str) -> Result<Value, UpstreamError> {
        self.record(format!("favourite:{id}"))?;
        Ok(json!({ "id": id, "favourited": true }))
    }

    async fn unfavourite(&self, id: &str) -> Result<Value, UpstreamError> {
        self.record(format!("unfavourite:{id}"))?;
        Ok(json!({ "id": id, "favourited": false }))
    }

    async fn favourites(&self) -> Result<Vec<Value>, UpstreamError> {
        self.record("favourites".into())?;
        Ok(self.favourites.clone())
    }
}

pub fn settings() -> GatewaySettings {
    GatewaySettings {
        access_token: Some(Secret::new("service-token")),
        ..Default::default()
    }
}

pub fn protected_settings() -> GatewaySettings {
    GatewaySettings {
        operator: Some(OperatorCredentials {
            username: Some("ops".into()),
            password: Some(Secret::new("hunter2")),
        }),
        ..settings()
    }
}

pub fn router(settings: &GatewaySettings, upstream: Arc<FakeUpstream>) -> Router {
    build_router(AppState::new(settings, upstream), None)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Drive one request through the router and decode the JSON reply.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}
