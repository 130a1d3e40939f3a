//! Shared data models for the overlay render pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Overlay metadata (timed, positioned compositing elements)
//! - Render jobs and their pollable status
//! - Encoding policy for the transcoder invocation

pub mod encoding;
pub mod job;
pub mod overlay;

// Re-export common types
pub use encoding::EncodingConfig;
pub use job::{JobId, JobRecord, JobSnapshot, JobStatus, JobUpdate};
pub use overlay::{Metadata, Overlay, OverlayKind, Position, Size, Timing};
