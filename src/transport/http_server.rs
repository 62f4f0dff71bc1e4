use std::sync::Arc;

use axum::{Router, middleware, routing::get};

use crate::{
    server::AppState,
    transport::{middleware::add_response_headers, routes::metrics},
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics::get_metrics))
        .route("/health", get(metrics::get_health))
        .route("/version", get(metrics::get_version))
        .layer(middleware::from_fn(add_response_headers))
        .with_state(state)
}
