//! Structured job logging.

use tracing::{error, info};

use vlayer_models::JobId;

/// Logger attaching job context to lifecycle events.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn started(&self) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started"
        );
    }

    pub fn completed(&self) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job completed"
        );
    }

    pub fn failed(&self, detail: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job failed: {detail}"
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_carries_job_id() {
        let id = JobId::from_string("job-42");
        let logger = JobLogger::new(&id, "render_overlays");
        assert_eq!(logger.job_id(), "job-42");
    }
}
