use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all DFS endpoints.
///
/// `max_upload_size` bounds the request body of uploads.
pub fn build_router(state: AppState, max_upload_size: usize) -> Router {
    Router::new()
        .route("/dfs/upload", post(handler::upload_handler))
        .route("/dfs/getfile/:filename", get(handler::download_handler))
        .route("/dfs/file-list", get(handler::list_handler))
        .route("/dfs/health", get(handler::health_handler))
        .route("/dfs/info", get(handler::info_handler))
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
