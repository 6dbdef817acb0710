//! Optional operator basic-auth in front of every route.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::warn;

use crate::error::ApiError;
use crate::state::{AppState, OperatorAuth};

pub async fn operator_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = &state.operator else {
        return next.run(request).await;
    };

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(decode_basic);

    match presented {
        Some((user, pass)) if matches(expected, &user, &pass) => next.run(request).await,
        _ => {
            warn!(
                path = %request.uri().path(),
                "Rejected request without valid operator credentials"
            );
            ApiError::Unauthorized.into_response()
        }
    }
}

fn matches(expected: &OperatorAuth, user: &str, pass: &str) -> bool {
    let user_ok = constant_time_eq(expected.username.as_bytes(), user.as_bytes());
    let pass_ok = constant_time_eq(expected.password.as_bytes(), pass.as_bytes());
    user_ok & pass_ok
}

/// Equal-length inputs take the same time whatever their contents.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Parse `Basic <base64(user:pass)>`; the scheme name is case-insensitive.
fn decode_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_basic_header() {
        // base64("ops:hunter2")
        assert_eq!(
            decode_basic("Basic b3BzOmh1bnRlcjI="),
            Some(("ops".into(), "hunter2".into()))
        );
        assert_eq!(
            decode_basic("basic b3BzOmh1bnRlcjI="),
            Some(("ops".into(), "hunter2".into()))
        );
    }

    #[test]
    fn passwords_may_contain_colons() {
        let header = format!("Basic {}", STANDARD.encode("ops:a:b"));
        assert_eq!(decode_basic(&header), Some(("ops".into(), "a:b".into())));
    }

    #[test]
    fn credential_compare_checks_every_byte() {
        assert!(constant_time_eq(b"hunter2", b"hunter2"));
        assert!(!constant_time_eq(b"hunter2", b"hunter3"));
        assert!(!constant_time_eq(b"hunter2", b"Hunter2"));
        assert!(!constant_time_eq(b"hunter2", b"hunter"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn both_fields_must_match() {
        let expected = OperatorAuth {
            username: "ops".into(),
            password: "hunter2".into(),
        };
        assert!(matches(&expected, "ops", "hunter2"));
        assert!(!matches(&expected, "ops", "hunter"));
        assert!(!matches(&expected, "opz", "hunter2"));
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert_eq!(decode_basic("Bearer abc"), None);
        assert_eq!(decode_basic("Basic !!!"), None);
        assert_eq!(decode_basic("Basic"), None);
        assert_eq!(decode_basic(&format!("Basic {}", STANDARD.encode("nocolon"))), None);
    }
}
