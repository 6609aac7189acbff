//! ScreenCast portal negotiation (the "EGL read-back vs direct buffer
//! stream" open question in spec §9: we always attempt the portal's
//! zero-copy `PipeWire` node first; `pipewire_stream` decides per-buffer
//! whether a DMA-BUF handle or a copied SHM buffer came back).

use ashpd::desktop::screencast::{CursorMode, Screencast, SourceType};
use ashpd::desktop::PersistMode;

use crate::error::CaptureError;

/// Outcome of a successful portal negotiation: the `PipeWire` node to
/// connect to and the remote socket fd backing it.
pub struct PortalSession {
    pub node_id: u32,
    pub fd: std::os::fd::OwnedFd,
    pub width: u32,
    pub height: u32,
}

/// Ask the desktop portal for a single monitor ScreenCast stream.
///
/// Only "extend" mode is meaningful here: we always request the whole
/// monitor, never a window (spec §4.1 only supports `extend`).
pub async fn negotiate() -> Result<PortalSession, CaptureError> {
    let proxy = Screencast::new()
        .await
        .map_err(|_| CaptureError::PortalNegotiation)?;

    let session = proxy
        .create_session()
        .await
        .map_err(|_| CaptureError::PortalNegotiation)?;

    proxy
        .select_sources(
            &session,
            CursorMode::Metadata,
            SourceType::Monitor.into(),
            false,
            None,
            PersistMode::DoNot,
        )
        .await
        .map_err(|_| CaptureError::PortalNegotiation)?;

    let response = proxy
        .start(&session, None)
        .await
        .map_err(|_| CaptureError::PortalNegotiation)?
        .response()
        .map_err(|_| CaptureError::PortalNegotiation)?;

    let stream = response
        .streams()
        .first()
        .ok_or(CaptureError::PortalNegotiation)?;

    let (width, height) = stream.size().unwrap_or((1920, 1080));

    let fd = proxy
        .open_pipe_wire_remote(&session)
        .await
        .map_err(|_| CaptureError::PortalNegotiation)?;

    Ok(PortalSession {
        node_id: stream.pipe_wire_node_id(),
        fd,
        #[allow(clippy::cast_sign_loss)]
        width: width as u32,
        #[allow(clippy::cast_sign_loss)]
        height: height as u32,
    })
}
