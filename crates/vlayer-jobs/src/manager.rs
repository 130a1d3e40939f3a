//! Render job lifecycle manager.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;
use tokio::sync::Semaphore;
use tracing::info;

use vlayer_media::{compile_overlay_graph, FfmpegTranscoder, ProgressSink, Transcoder};
use vlayer_models::{JobId, JobRecord, JobSnapshot, JobStatus, JobUpdate, Metadata};

use crate::config::ManagerConfig;
use crate::error::JobResult;
use crate::logging::JobLogger;
use crate::store::JobStore;

/// Owns the job records and the bounded render pool.
///
/// Each job occupies one pool slot for its whole lifetime, including the
/// external transcoder run. The semaphore is fair, so arrival order is
/// service order; its wait queue is unbounded and submission never blocks.
pub struct JobManager {
    config: ManagerConfig,
    store: Arc<JobStore>,
    pool: Arc<Semaphore>,
    transcoder: Arc<dyn Transcoder>,
}

impl JobManager {
    /// Create a manager backed by the external FFmpeg binary.
    pub fn new(config: ManagerConfig) -> Self {
        Self::with_transcoder(config, Arc::new(FfmpegTranscoder::new()))
    }

    /// Create a manager with a custom transcoder implementation.
    pub fn with_transcoder(config: ManagerConfig, transcoder: Arc<dyn Transcoder>) -> Self {
        let pool = Arc::new(Semaphore::new(config.workers));
        Self {
            config,
            store: Arc::new(JobStore::new()),
            pool,
            transcoder,
        }
    }

    /// Submit a render job.
    ///
    /// Fire-and-forget: the job is pollable in `Queued` state before this
    /// returns, and runs once a pool slot frees up.
    pub fn submit(
        &self,
        job_id: JobId,
        input_path: PathBuf,
        metadata: Metadata,
        assets: HashMap<String, PathBuf>,
    ) {
        self.store.insert(JobRecord::new(job_id.clone()));
        counter!("render_jobs_submitted_total").increment(1);

        let store = Arc::clone(&self.store);
        let pool = Arc::clone(&self.pool);
        let transcoder = Arc::clone(&self.transcoder);
        let output_root = self.config.output_root.clone();

        tokio::spawn(async move {
            // One permit per job for its whole lifetime; acquisition is the
            // moment a worker picks the job up.
            let _permit = match pool.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return, // manager dropped the pool
            };

            let logger = JobLogger::new(&job_id, "render_overlays");
            logger.started();

            store.apply(
                &job_id,
                JobUpdate::new()
                    .status(JobStatus::Processing)
                    .progress(0.05)
                    .message("Starting render"),
            );

            let result = run_job(
                &store,
                transcoder.as_ref(),
                &job_id,
                &input_path,
                &metadata,
                &assets,
                &output_root,
            )
            .await;

            match result {
                Ok(output) => {
                    logger.completed();
                    counter!("render_jobs_completed_total").increment(1);
                    store.apply(
                        &job_id,
                        JobUpdate::new()
                            .status(JobStatus::Completed)
                            .progress(1.0)
                            .message("Completed")
                            .result_path(output),
                    );
                }
                Err(e) => {
                    let detail = format!("{:#}", anyhow::Error::from(e));
                    logger.failed(&detail);
                    counter!("render_jobs_failed_total").increment(1);
                    store.apply(
                        &job_id,
                        JobUpdate::new()
                            .status(JobStatus::Error)
                            .progress(1.0)
                            .message(detail),
                    );
                }
            }
        });
    }

    /// Poll a job's current state.
    pub fn status(&self, job_id: &JobId) -> Option<JobSnapshot> {
        self.store.snapshot(job_id)
    }

    /// Rendered output path, available once the job has completed.
    pub fn result(&self, job_id: &JobId) -> Option<PathBuf> {
        self.store.result(job_id)
    }

    /// Pool size this manager was configured with.
    pub fn workers(&self) -> usize {
        self.config.workers
    }
}

/// Worker body for one render.
async fn run_job(
    store: &Arc<JobStore>,
    transcoder: &dyn Transcoder,
    job_id: &JobId,
    input_path: &Path,
    metadata: &Metadata,
    assets: &HashMap<String, PathBuf>,
    output_root: &Path,
) -> JobResult<PathBuf> {
    let out_dir = output_root.join(job_id.as_str());
    tokio::fs::create_dir_all(&out_dir).await?;
    let output = out_dir.join("output.mp4");

    let graph = compile_overlay_graph(input_path, &metadata.overlays, assets);
    info!(
        job_id = %job_id,
        inputs = graph.inputs.len(),
        composited = graph.has_overlays(),
        "Compiled overlay graph"
    );

    let sink: ProgressSink = {
        let store = Arc::clone(store);
        let job_id = job_id.clone();
        Arc::new(move |event| {
            store.apply(
                &job_id,
                JobUpdate::new()
                    .progress(event.fraction)
                    .maybe_message(event.message),
            );
        })
    };

    transcoder.run(&graph, &output, sink).await?;
    Ok(output)
}
