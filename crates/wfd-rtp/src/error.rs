//! RTP Sender error taxonomy (spec §4.4, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RtpError {
    #[error("submitted TS run length {0} is not a multiple of 188")]
    InvalidRunLength(usize),

    #[error("failed to create UDP socket: {0}")]
    Socket(#[source] std::io::Error),

    #[error("failed to bind local UDP port: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to connect to remote sink: {0}")]
    Connect(#[source] std::io::Error),

    #[error("remote has closed the connection")]
    RemoteClosed,
}

impl From<RtpError> for wfd_core::Error {
    fn from(e: RtpError) -> Self {
        match e {
            RtpError::InvalidRunLength(_) => Self::ParamInvalid("TS run length".into()),
            RtpError::RemoteClosed => Self::RemoteClosedConnection,
            RtpError::Socket(_) | RtpError::Bind(_) | RtpError::Connect(_) => Self::Failed,
        }
    }
}
