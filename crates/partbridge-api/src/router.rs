//! Route definitions.
//!
//! The conversion endpoint is mounted twice: at `/convert-cad` and at the
//! hosted-functions path the browser client already calls.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Conversion endpoint paths.
pub const CONVERT_PATHS: [&str; 2] = ["/convert-cad", "/functions/v1/convert-cad"];

/// Build the router with all routes and request logging.
pub fn build_router(state: AppState) -> Router {
    let convert_routes = CONVERT_PATHS.iter().fold(Router::new(), |router, path| {
        router.route(path, post(handlers::convert::convert_cad))
    });

    Router::new()
        .merge(convert_routes)
        .route("/health", get(handlers::health::health))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}
