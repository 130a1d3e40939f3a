#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for overlay compositing.
//!
//! This crate provides:
//! - Compilation of a declarative overlay list into a `filter_complex` graph
//! - Type-safe render command building and process supervision
//! - Progress scraping from the transcoder's stderr `time=` tokens
//! - Duration probing via ffprobe

pub mod command;
pub mod error;
pub mod graph;
pub mod probe;
pub mod progress;
pub mod render;

pub use command::{run_render, RenderCommand};
pub use error::{MediaError, MediaResult};
pub use graph::{compile_overlay_graph, FilterGraph};
pub use probe::probe_duration;
pub use progress::{
    parse_time_line, ProgressEvent, ProgressSink, TranscodeProgress, PROGRESS_FINALIZING,
    PROGRESS_STARTING,
};
pub use render::{FfmpegTranscoder, Transcoder};
