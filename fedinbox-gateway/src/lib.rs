//! Timeline gateway: a thin HTTP proxy between the inbox and a Mastodon instance.
//!
//! The gateway holds the only copy of the instance credential. Reads of the
//! public timeline are forwarded anonymously; writes (share, favorite,
//! unfavorite) and the favourites list are forwarded with the bearer token
//! attached server-side. Payloads pass through unmodified and nothing is
//! kept between requests.
//!
//! # Routes
//!
//! | method | path              | aliases                    |
//! |--------|-------------------|----------------------------|
//! | GET    | `/timeline-list`  | `/api/posts`, `/api/toots` |
//! | POST   | `/share`          | `/api/share`               |
//! | POST   | `/favorite`       | `/api/favorite`            |
//! | POST   | `/unfavorite`     | `/api/unfavorite`          |
//! | GET    | `/favorites-list` | `/api/favorites`           |
//! | GET    | `/health`         |                            |
//!
//! Errors are JSON `{ "error": string, "details"?: any }`: `400` for a
//! missing body field (checked before any upstream call), `500` for upstream
//! failures, `401` with a `WWW-Authenticate` challenge when operator
//! credentials are configured and not presented.
//!
//! # Running
//!
//! ```sh
//! FEDINBOX__GATEWAY__ACCESS_TOKEN=... fedinbox serve --config fedinbox.yaml
//! ```
use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{get, post},
};
use fedinbox_config::GatewaySettings;
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use routes::{
    favorite_handler, favorites_handler, health_handler, share_handler, timeline_handler,
    unfavorite_handler,
};
pub use state::AppState;

/// Assemble the router. `static_dir`, when given, serves unmatched paths.
pub fn build_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let mut app = Router::new()
        .route("/health", get(health_handler))
        .route("/timeline-list", get(timeline_handler))
        .route("/api/posts", get(timeline_handler))
        .route("/api/toots", get(timeline_handler))
        .route("/share", post(share_handler))
        .route("/api/share", post(share_handler))
        .route("/favorite", post(favorite_handler))
        .route("/api/favorite", post(favorite_handler))
        .route("/unfavorite", post(unfavorite_handler))
        .route("/api/unfavorite", post(unfavorite_handler))
        .route("/favorites-list", get(favorites_handler))
        .route("/api/favorites", get(favorites_handler));

    if let Some(dir) = static_dir {
        info!(dir = %dir.display(), "Serving static files");
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(middleware::from_fn_with_state(
        Arc::clone(&state),
        auth::operator_auth,
    ))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Bind to the configured address and serve until Ctrl+C / SIGTERM.
pub async fn serve(settings: &GatewaySettings) -> anyhow::Result<()> {
    info!("Initializing state...");
    let state = AppState::from_settings(settings)?;
    let app = build_router(state, settings.static_dir.as_deref());

    let address = format!("{}:{}", settings.bind, settings.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
