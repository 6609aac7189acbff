//! RTSP/WFD error taxonomy (spec §4.7, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RtspError {
    #[error("malformed RTSP message")]
    Malformed,

    #[error("declared Content-Length exceeds the configured maximum")]
    BodyTooLarge,

    #[error("connection closed while reading a message")]
    ConnectionClosed,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("operation is not valid in the current session state")]
    InvalidState,

    #[error("no video format intersection between sink and source capabilities")]
    InvalidParameters,

    #[error("timed out waiting for a peer response")]
    Timeout,
}

impl From<RtspError> for wfd_core::Error {
    fn from(e: RtspError) -> Self {
        match e {
            RtspError::Malformed | RtspError::BodyTooLarge => {
                Self::ParamInvalid("RTSP message".into())
            }
            RtspError::ConnectionClosed => Self::RemoteClosedConnection,
            RtspError::Io(_) => Self::Failed,
            RtspError::InvalidState => Self::InvalidState,
            RtspError::InvalidParameters => Self::ParamInvalid("video format".into()),
            RtspError::Timeout => Self::Timeout,
        }
    }
}
