//! Job manager configuration.

use std::path::PathBuf;

const DEFAULT_WORKERS: usize = 2;
const DEFAULT_OUTPUT_ROOT: &str = "/tmp/vlayer/outputs";

/// Render pool configuration.
///
/// The pool size is a deployment-time constant, never derived from request
/// load.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Number of concurrent render workers
    pub workers: usize,
    /// Root directory for rendered outputs (one subdirectory per job)
    pub output_root: PathBuf,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
        }
    }
}

impl ManagerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            workers: std::env::var("RENDER_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_WORKERS),
            output_root: std::env::var("RENDER_OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_ROOT)),
        }
    }

    /// Override the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Override the output root.
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }
}
