use axum::{
    middleware::{self as axum_mw, from_fn_with_state},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers::{self, schedule};
use crate::metrics::exposition;
use crate::middleware::{instrument, trace_context};
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let schedule_route = state.instrumentation.route(schedule::ROUTE);

    Router::new()
        // ── Business endpoint (instrumented) ────────────────────
        .route(
            schedule::ROUTE,
            get(schedule::available_schedule)
                .layer(from_fn_with_state(schedule_route, instrument)),
        )
        // ── Operational endpoints (not instrumented) ────────────
        .route("/healthz", get(handlers::health))
        .route("/metrics", get(exposition::get_metrics))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(trace_context::propagate))
        .layer(CorsLayer::permissive())
}
