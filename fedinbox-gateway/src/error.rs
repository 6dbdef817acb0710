use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use fedinbox_social::mastodon::UpstreamError;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const AUTH_CHALLENGE: &str = r#"Basic realm="fedinbox""#;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing {0} in request body")]
    MissingField(&'static str),

    #[error("Invalid id in request body")]
    InvalidId,

    #[error("{message}")]
    Upstream {
        message: &'static str,
        details: Option<Value>,
    },

    #[error("Authentication required")]
    Unauthorized,
}

impl ApiError {
    /// Map an upstream failure to the gateway's error for the given action.
    pub fn upstream(message: &'static str, err: &UpstreamError) -> Self {
        tracing::error!(error = %err, "{message}");
        match err {
            UpstreamError::InvalidId(_) => ApiError::InvalidId,
            other => ApiError::Upstream {
                message,
                details: Some(other.details()),
            },
        }
    }

    /// Like [`ApiError::upstream`] but without echoing upstream detail.
    pub fn opaque(message: &'static str, err: &UpstreamError) -> Self {
        tracing::error!(error = %err, "{message}");
        ApiError::Upstream {
            message,
            details: None,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MissingField(_) | ApiError::InvalidId => StatusCode::BAD_REQUEST,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        let error = self.to_string();
        let challenge = matches!(self, ApiError::Unauthorized);
        let details = match self {
            ApiError::Upstream { details, .. } => details,
            _ => None,
        };

        let mut response = (status, Json(ErrorBody { error, details })).into_response();
        if challenge {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(AUTH_CHALLENGE));
        }
        response
    }
}
