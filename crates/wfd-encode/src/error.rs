//! Encoder error taxonomy (spec §4.2, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("encoder already configured; call configure() again only after stop()")]
    AlreadyConfigured,

    #[error("encoder is not configured")]
    NotConfigured,

    #[error("rejected configuration: {0:?}")]
    InvalidConfiguration(crate::config::EncoderConfig),

    #[error("failed to build GStreamer pipeline")]
    PipelineBuild,

    #[error("failed to start GStreamer pipeline")]
    PipelineStart,

    #[error("failed to push buffer into appsrc")]
    PushBuffer,

    #[error("encoder is not running")]
    NotRunning,
}

impl From<EncodeError> for wfd_core::Error {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::AlreadyConfigured => Self::Already,
            EncodeError::NotConfigured | EncodeError::NotRunning => Self::InvalidState,
            EncodeError::InvalidConfiguration(_) => Self::ParamInvalid("encoder configuration".into()),
            EncodeError::PipelineBuild | EncodeError::PipelineStart | EncodeError::PushBuffer => {
                Self::Failed
            }
        }
    }
}
