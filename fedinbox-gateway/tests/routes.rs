mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{FakeUpstream, get, post_json, protected_settings, router, send, settings};
use fedinbox_config::GatewaySettings;
use fedinbox_gateway::{AppState, build_router};
use serde_json::json;

#[tokio::test]
async fn timeline_returns_upstream_array_unmodified() {
    let posts = vec![
        json!({"id": "1", "content": "<p>hi</p>", "custom": {"kept": true}}),
        json!({"id": "2", "content": "<p>there</p>"}),
    ];
    let upstream = Arc::new(FakeUpstream {
        timeline: posts.clone(),
        ..Default::default()
    });

    let (status, body) = send(router(&settings(), upstream.clone()), get("/timeline-list")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(posts));
    assert_eq!(upstream.calls(), vec!["timeline:20"]);
}

#[tokio::test]
async fn timeline_aliases_reach_the_same_handler() {
    for uri in ["/api/posts", "/api/toots"] {
        let upstream = Arc::new(FakeUpstream::default());
        let (status, body) = send(router(&settings(), upstream.clone()), get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!([]));
        assert_eq!(upstream.calls().len(), 1);
    }
}

#[tokio::test]
async fn timeline_limit_is_clamped() {
    let upstream = Arc::new(FakeUpstream::default());
    let settings = GatewaySettings {
        timeline_limit: 500,
        ..settings()
    };

    send(router(&settings, upstream.clone()), get("/timeline-list")).await;

    assert_eq!(upstream.calls(), vec!["timeline:40"]);
}

#[tokio::test]
async fn timeline_failure_is_generic_server_error() {
    let upstream = Arc::new(FakeUpstream::failing());

    let (status, body) = send(router(&settings(), upstream.clone()), get("/timeline-list")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to fetch posts"}));
    // never retried
    assert_eq!(upstream.calls().len(), 1);
}

#[tokio::test]
async fn share_forwards_post_content_as_status() {
    let upstream = Arc::new(FakeUpstream::default());

    let (status, body) = send(
        router(&settings(), upstream.clone()),
        post_json("/share", r#"{"postContent": "Hello – Alice"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": "new", "content": "Hello – Alice"}));
    assert_eq!(upstream.calls(), vec!["status:Hello – Alice"]);
}

#[tokio::test]
async fn share_with_empty_body_is_rejected_before_upstream() {
    let upstream = Arc::new(FakeUpstream::default());
    let request = Request::builder()
        .method("POST")
        .uri("/share")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(router(&settings(), upstream.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing postContent in request body"}));
    assert!(upstream.calls().is_empty());
}

#[tokio::test]
async fn share_rejects_missing_blank_or_malformed_content() {
    for raw in ["{}", r#"{"postContent": "   "}"#, r#"{"postContent": 7}"#, "not json"] {
        let upstream = Arc::new(FakeUpstream::default());
        let (status, body) = send(router(&settings(), upstream.clone()), post_json("/api/share", raw)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{raw}");
        assert_eq!(body["error"], "Missing postContent in request body");
        assert!(upstream.calls().is_empty());
    }
}

#[tokio::test]
async fn share_failure_carries_details() {
    let upstream = Arc::new(FakeUpstream::failing());

    let (status, body) = send(
        router(&settings(), upstream),
        post_json("/share", r#"{"postContent": "hi"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to share post");
    assert_eq!(body["details"], "network error: connection refused");
}

#[tokio::test]
async fn favorite_and_unfavorite_forward_the_id() {
    let upstream = Arc::new(FakeUpstream::default());

    let (status, body) = send(
        router(&settings(), upstream.clone()),
        post_json("/favorite", r#"{"id": "42"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favourited"], true);

    let (status, body) = send(
        router(&settings(), upstream.clone()),
        post_json("/unfavorite", r#"{"id": "42"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favourited"], false);

    assert_eq!(upstream.calls(), vec!["favourite:42", "unfavourite:42"]);
}

#[tokio::test]
async fn favorite_without_id_is_a_client_error() {
    let upstream = Arc::new(FakeUpstream::default());

    let (status, body) = send(router(&settings(), upstream.clone()), post_json("/favorite", "{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing id in request body"}));
    assert!(upstream.calls().is_empty());
}

#[tokio::test]
async fn unfavorite_failure_mirrors_upstream_failure() {
    let upstream = Arc::new(FakeUpstream::failing());

    let (status, body) = send(
        router(&settings(), upstream),
        post_json("/unfavorite", r#"{"id": "42"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to unfavorite post");
}

#[tokio::test]
async fn favorites_list_is_passed_through() {
    let upstream = Arc::new(FakeUpstream {
        favourites: vec![json!({"id": "7"})],
        ..Default::default()
    });

    let (status, body) = send(router(&settings(), upstream), get("/favorites-list")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": "7"}]));
}

#[tokio::test]
async fn operator_auth_challenges_missing_credentials() {
    let upstream = Arc::new(FakeUpstream::default());
    let app = router(&protected_settings(), upstream.clone());

    let response = tower::ServiceExt::oneshot(app, get("/timeline-list"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        r#"Basic realm="fedinbox""#
    );
    assert!(upstream.calls().is_empty());
}

#[tokio::test]
async fn operator_auth_rejects_wrong_password_even_for_health() {
    let upstream = Arc::new(FakeUpstream::default());
    // base64("ops:wrong")
    let request = Request::builder()
        .uri("/health")
        .header(header::AUTHORIZATION, "Basic b3BzOndyb25n")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(router(&protected_settings(), upstream), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Authentication required"}));
}

#[tokio::test]
async fn operator_auth_lets_valid_credentials_through() {
    let upstream = Arc::new(FakeUpstream::default());
    // base64("ops:hunter2")
    let request = Request::builder()
        .method("POST")
        .uri("/share")
        .header(header::AUTHORIZATION, "Basic b3BzOmh1bnRlcjI=")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"postContent": "hi"}"#))
        .unwrap();

    let (status, _) = send(router(&protected_settings(), upstream.clone()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(upstream.calls(), vec!["status:hi"]);
}

#[tokio::test]
async fn static_files_are_served_for_unmatched_paths() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>inbox</h1>").unwrap();
    let upstream = Arc::new(FakeUpstream::default());
    let app = build_router(AppState::new(&settings(), upstream), Some(dir.path()));

    let (status, body) = send(app, get("/index.html")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("<h1>inbox</h1>"));
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = send(router(&settings(), Arc::new(FakeUpstream::default())), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}
