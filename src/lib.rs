//! Privtier - Privacy-tiered cache and retention engine
//!
//! Provides a keyed cache whose expiry derives from per-record privacy
//! classification, K-anonymous analytics aggregation, and a scheduled
//! archiver driving records through a compliance lifecycle.

pub mod analytics;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod retention;
pub mod tasks;
pub mod warmer;

pub use api::AppState;
pub use config::Config;
pub use tasks::{spawn_cleanup_task, spawn_retention_task};
