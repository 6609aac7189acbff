//! The Frame Source capability trait (spec §4.1, component C1).
//!
//! `swap_buffers` blocks until the next frame is ready and stashes it;
//! `current_buffer` hands that frame to the caller, consuming it. Splitting
//! the two lets the pipeline scheduler's capture worker block on
//! `swap_buffers` while a separate stage reads `current_buffer` without
//! re-entering the platform capture API.

use crate::error::CaptureError;
use crate::frame::{Frame, OutputMode, OutputModeRequest};

pub trait FrameSource: Send {
    /// Configure the source for the requested display mode. Only
    /// [`crate::frame::DisplayMode::Extend`] is supported; anything else is
    /// [`CaptureError::UnsupportedMode`]. Calling `setup` while already
    /// configured is [`CaptureError::AlreadyConfigured`].
    fn setup(&mut self, request: OutputModeRequest) -> Result<(), CaptureError>;

    /// Release the capture session. Idempotent.
    fn teardown(&mut self);

    /// Block until the next frame is captured and make it available via
    /// [`Self::current_buffer`]. [`CaptureError::NotConfigured`] if
    /// `setup` hasn't been called.
    fn swap_buffers(&mut self) -> Result<(), CaptureError>;

    /// The frame most recently made current by `swap_buffers`. Its
    /// timestamp is the post-swap wall time in microseconds.
    fn current_buffer(&mut self) -> Result<Frame, CaptureError>;

    /// The mode negotiated by the last successful `setup` call.
    fn output_mode(&self) -> Result<OutputMode, CaptureError>;
}
