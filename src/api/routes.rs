use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

/// Headroom for text fields and multipart framing on top of the file payloads.
const UPLOAD_OVERHEAD: usize = 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let per_file = usize::try_from(state.config.max_upload_size).unwrap_or(usize::MAX);
    let upload_limit = per_file
        .saturating_mul(state.config.max_files_per_upload)
        .saturating_add(UPLOAD_OVERHEAD);

    Router::new()
        // Accounts
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        // Posts
        .route(
            "/upload",
            post(handlers::create_post).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/posts", get(handlers::list_posts))
        .route(
            "/posts/:index",
            put(handlers::update_post_at).delete(handlers::delete_post_at),
        )
        .route(
            "/posts/id/:id",
            get(handlers::get_post_by_id)
                .put(handlers::update_post_by_id)
                .delete(handlers::delete_post_by_id),
        )
        // Attachments
        .route("/download/:filename", get(handlers::download))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
