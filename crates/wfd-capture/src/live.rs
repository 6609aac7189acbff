//! Live [`FrameSource`] backed by the desktop ScreenCast portal and
//! `PipeWire` (spec §4.1, component C1, "real" path).
//!
//! `setup` blocks on the async portal negotiation using a private
//! single-threaded runtime, since the capture worker that owns this
//! source runs on its own OS thread (spec §5), not inside the caller's
//! async executor.

use std::sync::mpsc as std_mpsc;

use crate::error::CaptureError;
use crate::frame::{DisplayMode, Frame, OutputMode, OutputModeRequest};
use crate::pipewire_stream::PwCaptureHandle;
use crate::portal;
use crate::source::FrameSource;

pub struct LiveFrameSource {
    mode: Option<OutputMode>,
    handle: Option<PwCaptureHandle>,
    frame_rx: Option<std_mpsc::Receiver<Frame>>,
    pending: Option<Frame>,
}

impl LiveFrameSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: None,
            handle: None,
            frame_rx: None,
            pending: None,
        }
    }
}

impl Default for LiveFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for LiveFrameSource {
    fn setup(&mut self, request: OutputModeRequest) -> Result<(), CaptureError> {
        if self.mode.is_some() {
            return Err(CaptureError::AlreadyConfigured);
        }
        if request.mode != DisplayMode::Extend {
            return Err(CaptureError::UnsupportedMode);
        }

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(CaptureError::SpawnThread)?;
        let session = rt.block_on(portal::negotiate())?;

        let (handle, frame_rx) = PwCaptureHandle::spawn(
            session.node_id,
            session.fd,
            session.width,
            session.height,
            wfd_core::wire::CAPTURE_QUEUE_CAPACITY,
        )?;

        self.mode = Some(OutputMode {
            mode: request.mode,
            width: session.width,
            height: session.height,
            refresh_rate: request.refresh_rate,
        });
        self.handle = Some(handle);
        self.frame_rx = Some(frame_rx);
        Ok(())
    }

    fn teardown(&mut self) {
        self.handle = None;
        self.frame_rx = None;
        self.pending = None;
        self.mode = None;
    }

    fn swap_buffers(&mut self) -> Result<(), CaptureError> {
        let rx = self.frame_rx.as_ref().ok_or(CaptureError::NotConfigured)?;
        let frame = rx.recv().map_err(|_| CaptureError::ChannelClosed)?;
        self.pending = Some(frame);
        Ok(())
    }

    fn current_buffer(&mut self) -> Result<Frame, CaptureError> {
        self.pending.take().ok_or(CaptureError::NotConfigured)
    }

    fn output_mode(&self) -> Result<OutputMode, CaptureError> {
        self.mode.ok_or(CaptureError::NotConfigured)
    }
}
