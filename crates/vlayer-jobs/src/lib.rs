//! Render job pipeline: a bounded worker pool with pollable job state.
//!
//! Submission is fire-and-forget; callers poll [`JobManager::status`] until
//! the job reaches a terminal state, then fetch the rendered file via
//! [`JobManager::result`]. Job state lives in memory for the process
//! lifetime only.

pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod store;

pub use config::ManagerConfig;
pub use error::{JobError, JobResult};
pub use logging::JobLogger;
pub use manager::JobManager;
pub use store::JobStore;
