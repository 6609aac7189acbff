//! Pipeline assembly error taxonomy (spec §4.6, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline is already running")]
    AlreadyRunning,

    #[error("pipeline is not running")]
    NotRunning,

    #[error("failed to bind one or more pipeline stages")]
    StartFailed,
}

impl From<PipelineError> for wfd_core::Error {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::AlreadyRunning => Self::Already,
            PipelineError::NotRunning => Self::InvalidState,
            PipelineError::StartFailed => Self::Failed,
        }
    }
}
