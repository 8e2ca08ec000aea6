//! API Routes
//!
//! Configures the Axum router with all engine endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    aggregate_handler, get_handler, health_handler, invalidate_handler, put_handler,
    run_cycle_handler, stats_handler, warm_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache/set` - Store a payload with a privacy classification
/// - `GET /cache/:namespace/:key` - Retrieve a cached payload
/// - `DELETE /cache/:namespace/:key` - Invalidate a key
/// - `POST /analytics/aggregate` - K-anonymous group aggregation
/// - `POST /cache/warm` - Warm top aggregate groups
/// - `POST /retention/run-cycle` - Trigger a retention cycle
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/cache/set", put(put_handler))
        .route(
            "/cache/:namespace/:key",
            get(get_handler).delete(invalidate_handler),
        )
        .route("/cache/warm", post(warm_handler))
        .route("/analytics/aggregate", post(aggregate_handler))
        .route("/retention/run-cycle", post(run_cycle_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
