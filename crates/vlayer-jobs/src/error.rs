//! Job pipeline error types.

use thiserror::Error;

pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Media error: {0}")]
    Media(#[from] vlayer_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
