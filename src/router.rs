use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers::{self, AppState};
use crate::openapi;

/// Largest request body accepted, 5MB.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Builds the full route table with the default middleware stack.
pub fn create_router(state: Arc<AppState>) -> Router {
    build_router(state, |routes| routes)
}

/// Builds the route table, letting the caller wrap every route except the
/// health check (the binary adds rate limiting there).
pub fn build_router<F>(state: Arc<AppState>, wrap_api: F) -> Router
where
    F: FnOnce(Router<Arc<AppState>>) -> Router<Arc<AppState>>,
{
    let api_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/addresses", get(handlers::search_addresses))
        .route("/submit", post(handlers::submit_entry))
        .route("/get-by-address", get(handlers::get_by_address))
        .route("/qualified-entries", get(handlers::qualified_entries))
        // API Documentation
        .route("/docs", get(openapi::serve_swagger_ui))
        .route("/api-docs/openapi.json", get(openapi::serve_openapi_spec))
        // The extractor's own 2MB cap would otherwise win over MAX_BODY_BYTES
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(wrap_api(api_routes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
