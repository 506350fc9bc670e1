//! Web server setup and routing

use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api;
use crate::state::AppState;
use crate::ws;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/parts", get(api::list_parts))
        .route("/api/parts/{id}", get(api::get_part))
        .route("/api/time", get(api::get_time))
        .route("/api/snapshot", get(api::get_snapshot))
        .route("/api/highlight/{id}", post(api::highlight_part))
        .route("/api/highlight", delete(api::clear_highlight))
        .route("/api/settings", get(api::get_settings))
        .route("/api/settings", post(api::update_settings))
        // WebSocket for frame updates
        .route("/ws", get(ws::websocket_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the frame loop and the HTTP server
pub async fn run(state: Arc<AppState>, bind: &str) -> Result<()> {
    let app = router(state.clone());

    tokio::spawn(state.run_frames());

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, protocol = "HTTP", "Starting web server");
    axum::serve(listener, app).await?;
    Ok(())
}
