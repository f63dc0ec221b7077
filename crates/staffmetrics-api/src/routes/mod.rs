//! Router assembly.

pub mod analytics;
pub mod attendance;
pub mod employees;
pub mod export;
pub mod health;
pub mod reviews;

use axum::routing::get;
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::rate_limit::enforce;
use crate::state::ApiState;

/// Build the full application: open `/health`, and every `/api` route behind
/// bearer authentication and the per-subject rate limit.
pub fn build_app(state: ApiState) -> Router {
    // route_layer order: the last layer added runs first, so authentication
    // establishes the subject before the limiter counts it.
    let api = Router::new()
        .merge(employees::router())
        .merge(attendance::router())
        .merge(reviews::router())
        .merge(analytics::router())
        .merge(export::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), enforce))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
