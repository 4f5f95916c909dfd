// src/web/static_files.rs - Index page and static asset fallback
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use super::AppState;

pub async fn index(State(state): State<AppState>) -> Response {
    let path = state.config.resolve(&state.config.paths.index_html);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Html(content).into_response(),
        Err(e) => {
            tracing::warn!("Index page {} unavailable: {}", path.display(), e);
            not_found().await.into_response()
        }
    }
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "File not found")
}
