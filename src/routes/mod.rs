//! HTTP surface
//!
//! All JSON endpoints under `/api`, health probes at the root, plus the
//! Prometheus scrape endpoint mounted by `main`.

pub mod health;
pub mod posts;
pub mod rag;

use crate::services::AppState;
use axum::{
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub struct RouterOptions {
    pub request_timeout: Duration,
    pub max_concurrency: usize,
}

pub fn create_router(state: AppState, options: RouterOptions) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/posts", get(posts::list_posts))
        .route("/posts", post(posts::create_post))
        .route("/posts/{id}", get(posts::get_post))
        .route("/posts/{id}", put(posts::update_post))
        .route("/posts/{id}", delete(posts::delete_post))
        .route("/posts/{id}/related", get(rag::related_posts))
        .route("/search", get(rag::search))
        .route("/ask", post(rag::ask))
        .route("/admin/reindex", post(posts::reindex));

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            options.request_timeout,
        ))
        .layer(ConcurrencyLimitLayer::new(options.max_concurrency))
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .with_state(state)
}
