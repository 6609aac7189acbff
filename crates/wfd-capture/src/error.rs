//! Frame Source error taxonomy (spec §4.1, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("only the extend display mode is supported")]
    UnsupportedMode,

    #[error("frame source is already configured; call teardown() first")]
    AlreadyConfigured,

    #[error("frame source has not been configured")]
    NotConfigured,

    #[error("failed to negotiate a ScreenCast portal session")]
    PortalNegotiation,

    #[error("failed to create PipeWire main loop")]
    MainLoop,

    #[error("failed to create PipeWire context")]
    Context,

    #[error("failed to connect to PipeWire")]
    Connect,

    #[error("failed to create PipeWire stream")]
    CreateStream,

    #[error("failed to connect PipeWire stream")]
    StreamConnect,

    #[error("failed to spawn capture thread")]
    SpawnThread(#[source] std::io::Error),

    #[error("capture channel closed")]
    ChannelClosed,
}

impl From<CaptureError> for wfd_core::Error {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::AlreadyConfigured => Self::Already,
            CaptureError::UnsupportedMode => Self::ParamInvalid("display mode".into()),
            CaptureError::NotConfigured => Self::InvalidState,
            CaptureError::ChannelClosed => Self::RemoteClosedConnection,
            _ => Self::Failed,
        }
    }
}
