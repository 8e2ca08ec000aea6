//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: opportunistically removes expired cache entries
//! - Retention: runs the archiver's lifecycle cycle on a schedule

mod cleanup;
mod retention;

pub use cleanup::spawn_cleanup_task;
pub use retention::spawn_retention_task;
