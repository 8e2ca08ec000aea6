//! API Module
//!
//! HTTP handlers and routing for the engine REST API.
//!
//! # Endpoints
//! - `PUT /cache/set` - Store a payload with a privacy classification
//! - `GET /cache/:namespace/:key` - Retrieve a cached payload
//! - `DELETE /cache/:namespace/:key` - Invalidate a key
//! - `POST /analytics/aggregate` - K-anonymous group aggregation
//! - `POST /cache/warm` - Warm top aggregate groups
//! - `POST /retention/run-cycle` - Trigger a retention cycle
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
