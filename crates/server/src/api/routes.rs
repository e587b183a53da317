use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, queue, upload, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config().uploads.max_upload_bytes);

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Queue
        .route("/queue", get(queue::get_status))
        .route("/queue/jobs/{id}", get(queue::get_job))
        // Upload
        .route("/upload", post(upload::upload).layer(upload_limit.clone()));

    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(upload::upload).layer(upload_limit))
        .route("/ws", get(ws::ws_handler))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
