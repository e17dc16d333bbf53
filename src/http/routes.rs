use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::handlers::{health_check, method_not_allowed, remove_bg};
use super::state::AppState;

pub const REMOVE_BG_PATH: &str = "/api/remove-bg";

/// Allowance on top of the image limit for multipart framing and text fields.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Build the router: the remove-bg route, a health check and static serving of the uploads
/// directory under its URL prefix.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .remover
        .intake_policy()
        .max_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let uploads = ServeDir::new(state.uploads.dir());
    let uploads_prefix = state.uploads.url_prefix().to_string();

    Router::new()
        .route(
            REMOVE_BG_PATH,
            post(remove_bg)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/health", get(health_check))
        .nest_service(&uploads_prefix, uploads)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
