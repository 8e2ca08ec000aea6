//! Request and Response models for the engine API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{AggregateRequest, PutRequest, RunCycleRequest, WarmRequest};
pub use responses::{
    AggregateResponse, ErrorResponse, GetResponse, HealthResponse, InvalidateResponse,
    PutResponse, WarmResponse,
};
