//! In-memory job record store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use vlayer_models::{JobId, JobRecord, JobSnapshot, JobStatus, JobUpdate};

/// Thread-safe map of job records.
///
/// Owned by one manager instance; all access goes through these locked
/// accessors. The lock is held only for the merge or copy, never across a
/// render. Jobs are never evicted.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job record.
    pub fn insert(&self, record: JobRecord) {
        self.jobs
            .write()
            .expect("job store lock poisoned")
            .insert(record.job_id.clone(), record);
    }

    /// Merge a partial update into a record; unknown ids are ignored.
    pub fn apply(&self, job_id: &JobId, update: JobUpdate) {
        let mut jobs = self.jobs.write().expect("job store lock poisoned");
        if let Some(record) = jobs.get_mut(job_id) {
            record.apply(update);
        }
    }

    /// Immutable snapshot of a job's pollable fields.
    pub fn snapshot(&self, job_id: &JobId) -> Option<JobSnapshot> {
        self.jobs
            .read()
            .expect("job store lock poisoned")
            .get(job_id)
            .map(JobRecord::snapshot)
    }

    /// Rendered output path, present only once the job has completed.
    pub fn result(&self, job_id: &JobId) -> Option<PathBuf> {
        self.jobs
            .read()
            .expect("job store lock poisoned")
            .get(job_id)
            .filter(|record| record.status == JobStatus::Completed)
            .and_then(|record| record.result_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_job_snapshot_is_none() {
        let store = JobStore::new();
        assert!(store.snapshot(&JobId::from_string("nope")).is_none());
    }

    #[test]
    fn test_apply_on_unknown_job_is_noop() {
        let store = JobStore::new();
        store.apply(
            &JobId::from_string("nope"),
            JobUpdate::new().progress(0.5),
        );
        assert!(store.snapshot(&JobId::from_string("nope")).is_none());
    }

    #[test]
    fn test_result_only_after_completion() {
        let store = JobStore::new();
        let id = JobId::from_string("job-1");
        store.insert(JobRecord::new(id.clone()));

        store.apply(
            &id,
            JobUpdate::new()
                .status(JobStatus::Processing)
                .result_path("/out/output.mp4"),
        );
        assert!(store.result(&id).is_none());

        store.apply(&id, JobUpdate::new().status(JobStatus::Completed).progress(1.0));
        assert_eq!(store.result(&id), Some(PathBuf::from("/out/output.mp4")));
    }
}
