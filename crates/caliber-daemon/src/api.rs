//! REST API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use caliber_core::DisplayChange;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::state::AppState;

/// API error response
#[derive(Serialize)]
struct ApiError {
    error: String,
}

impl ApiError {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

#[derive(Serialize)]
struct HighlightResponse {
    highlighted: Option<String>,
}

/// List all parts with their names and descriptions
pub async fn list_parts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let assembly = state.assembly.read().await;
    Json(assembly.parts().to_vec())
}

/// Get a single part by id
pub async fn get_part(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let assembly = state.assembly.read().await;
    match assembly.part(&id) {
        Some(part) => Json(part.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(ApiError::new("Part not found"))).into_response(),
    }
}

/// Current local time and frame rate
pub async fn get_time(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.time_report().await)
}

/// Pose of every named node
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.assembly.read().await.snapshot())
}

/// Highlight one part, replacing any previous highlight
pub async fn highlight_part(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if state.highlight(&id).await {
        Json(HighlightResponse {
            highlighted: Some(id),
        })
        .into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(format!("Unknown part: {}", id))),
        )
            .into_response()
    }
}

/// Clear the current highlight
pub async fn clear_highlight(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.clear_highlight().await;
    Json(HighlightResponse { highlighted: None })
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.assembly.read().await.settings())
}

/// Apply a partial display settings change
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(change): Json<DisplayChange>,
) -> impl IntoResponse {
    info!(
        wireframe = ?change.wireframe,
        performance_mode = ?change.performance_mode,
        "Settings update requested"
    );
    let settings = state.assembly.write().await.apply_settings(change);
    Json(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::Router;
    use tower::ServiceExt;

    async fn app() -> (Arc<AppState>, Router) {
        let state = AppState::new(Config::default()).await.unwrap();
        (state.clone(), router(state))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if body.is_some() {
            request = request.header("content-type", "application/json");
        }
        let request = request
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_parts_listing_and_lookup() {
        let (_, app) = app().await;
        let (status, parts) = send(&app, "GET", "/api/parts", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parts.as_array().unwrap().len(), 21);

        let (status, part) = send(&app, "GET", "/api/parts/anchor", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(part["id"], "anchor");
        assert_eq!(part["renderable"]["kind"], "composite");

        let (status, error) = send(&app, "GET", "/api/parts/tourbillon", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"], "Part not found");
    }

    #[tokio::test]
    async fn test_highlight_endpoints() {
        let (state, app) = app().await;
        let (status, body) = send(&app, "POST", "/api/highlight/balance", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["highlighted"], "balance");

        // Unknown ids leave the current highlight in place
        let (status, error) = send(&app, "POST", "/api/highlight/tourbillon", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"], "Unknown part: tourbillon");
        assert_eq!(state.assembly.read().await.highlighted(), Some("balance"));

        let (status, body) = send(&app, "DELETE", "/api/highlight", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["highlighted"].is_null());
        assert_eq!(state.assembly.read().await.highlighted(), None);
    }

    #[tokio::test]
    async fn test_settings_update() {
        let (_, app) = app().await;
        let (status, settings) =
            send(&app, "POST", "/api/settings", Some(r#"{"wireframe": true}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settings["wireframe"], true);
        assert_eq!(settings["performance_mode"], false);

        let (_, settings) = send(&app, "GET", "/api/settings", None).await;
        assert_eq!(settings["wireframe"], true);
    }

    #[tokio::test]
    async fn test_time_and_snapshot() {
        let (_, app) = app().await;
        let (status, time) = send(&app, "GET", "/api/time", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(time["timezone"], "Asia/Tokyo");
        assert!(time["formatted"].as_str().unwrap().ends_with("JST"));

        let (status, snapshot) = send(&app, "GET", "/api/snapshot", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!snapshot["nodes"].as_array().unwrap().is_empty());
    }
}
