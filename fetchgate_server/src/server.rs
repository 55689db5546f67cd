use std::sync::Arc;

use axum::extract::{State, WebSocketUpgrade};
use axum::http::Method;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use fetchgate_core::download::download_client;
use fetchgate_core::vcs::git::GitEngine;
use fetchgate_core::vcs::CloneEngine;

use crate::config::Config;
use crate::registry::SessionRegistry;
use crate::verify::{HttpVerifier, TokenVerifier};
use crate::ws;

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub registry: SessionRegistry,
    pub verifier: Box<dyn TokenVerifier>,
    pub engine: Box<dyn CloneEngine>,
    /// Client for resource downloads, built with the 5 s connect timeout.
    pub http: reqwest::Client,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Arc<Self> {
        let http = download_client();
        let verifier = Box::new(HttpVerifier::new(
            http.clone(),
            config.verify_url.clone(),
            config.verify_secret.clone(),
        ));
        Self::with_collaborators(config, verifier, Box::new(GitEngine))
    }

    /// Assemble state around explicit collaborators. Tests use this to swap
    /// in scripted verifiers and clone engines.
    pub fn with_collaborators(
        config: Config,
        verifier: Box<dyn TokenVerifier>,
        engine: Box<dyn CloneEngine>,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry: SessionRegistry::new(),
            verifier,
            engine,
            http: download_client(),
            config,
        })
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/websocket", get(websocket_handler))
        // Produced archives (and downloads) are served by bare file name.
        .nest_service("/files", ServeDir::new(&state.config.archive_dir))
        .layer(cors)
        .with_state(state)
}

/// GET /websocket
/// Upgrades the connection and hands the socket to the session loop.
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws::handle_socket(socket, state))
}
