use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};

#[derive(Clone)]
pub struct SpaState {
    pub index_file: PathBuf,
}

pub async fn ping_handler() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub fn is_asset_path(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    Path::new(last).extension().is_some()
}

/// Serves the page shell for any route the static files do not cover, so
/// reloading a client-side route such as `/trace` still boots the app.
pub async fn spa_handler(State(state): State<SpaState>, uri: Uri) -> Response {
    if is_asset_path(uri.path()) {
        tracing::debug!(path = uri.path(), "missing asset");
        return StatusCode::NOT_FOUND.into_response();
    }
    match tokio::fs::read_to_string(&state.index_file).await {
        Ok(contents) => Html(contents).into_response(),
        Err(error) => {
            tracing::error!(index = %state.index_file.display(), %error, "failed to read page shell");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
