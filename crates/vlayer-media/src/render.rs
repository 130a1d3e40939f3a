//! Transcoder invocation behind a narrow trait.
//!
//! The job manager talks to the transcoder only through [`Transcoder`], so
//! process supervision can be swapped out (or stubbed in tests) without
//! touching job bookkeeping.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use vlayer_models::EncodingConfig;

use crate::command::{run_render, RenderCommand};
use crate::error::MediaResult;
use crate::graph::FilterGraph;
use crate::probe::probe_duration;
use crate::progress::{ProgressEvent, ProgressSink, PROGRESS_FINALIZING, PROGRESS_STARTING};

/// Runs one compiled render to completion, reporting progress to the sink.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn run(
        &self,
        graph: &FilterGraph,
        output: &Path,
        sink: ProgressSink,
    ) -> MediaResult<()>;
}

/// Production transcoder backed by the external FFmpeg binary.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder {
    encoding: EncodingConfig,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoding(encoding: EncodingConfig) -> Self {
        Self { encoding }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn run(
        &self,
        graph: &FilterGraph,
        output: &Path,
        sink: ProgressSink,
    ) -> MediaResult<()> {
        sink(ProgressEvent::new(PROGRESS_STARTING, "Invoking ffmpeg"));

        // A failed probe only costs progress granularity.
        let mut duration = None;
        if let Some(base) = graph.base_input() {
            match probe_duration(base).await {
                Ok(d) => duration = Some(d),
                Err(e) => debug!("Duration probe failed, progress will be coarse: {e}"),
            }
        }

        let cmd = RenderCommand::new(graph.clone(), output).encoding(self.encoding.clone());
        run_render(&cmd, duration, &sink).await?;

        sink(ProgressEvent::new(PROGRESS_FINALIZING, "Finalizing"));
        Ok(())
    }
}
