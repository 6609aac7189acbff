//! Software frame source used when no portal/`PipeWire` session is
//! available (headless test rigs, CI) and by the crate's own tests.
//!
//! Produces a solid-color BGRA frame of the requested size on every swap,
//! ticking monotonically. This exists purely to give the rest of the
//! pipeline something to drive without a real compositor; it is not a
//! substitute for `pipewire_stream` in a real deployment.

use crate::error::CaptureError;
use crate::frame::{DisplayMode, Frame, FramePayload, OutputMode, OutputModeRequest, PixelFormat};
use crate::source::FrameSource;

pub struct SyntheticFrameSource {
    mode: Option<OutputMode>,
    frame_counter: u64,
    pending: Option<Frame>,
}

impl SyntheticFrameSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: None,
            frame_counter: 0,
            pending: None,
        }
    }
}

impl Default for SyntheticFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for SyntheticFrameSource {
    fn setup(&mut self, request: OutputModeRequest) -> Result<(), CaptureError> {
        if self.mode.is_some() {
            return Err(CaptureError::AlreadyConfigured);
        }
        if request.mode != DisplayMode::Extend {
            return Err(CaptureError::UnsupportedMode);
        }
        self.mode = Some(OutputMode {
            mode: request.mode,
            width: request.width,
            height: request.height,
            refresh_rate: request.refresh_rate,
        });
        self.frame_counter = 0;
        Ok(())
    }

    fn teardown(&mut self) {
        self.mode = None;
        self.pending = None;
    }

    fn swap_buffers(&mut self) -> Result<(), CaptureError> {
        let mode = self.mode.ok_or(CaptureError::NotConfigured)?;
        self.frame_counter += 1;

        let len = Frame::expected_len(mode.width, mode.height, PixelFormat::Bgra);
        let shade = (self.frame_counter % 256) as u8;
        let bytes = vec![shade; len];

        self.pending = Some(Frame {
            format: PixelFormat::Bgra,
            width: mode.width,
            height: mode.height,
            stride: mode.width * PixelFormat::Bgra.bytes_per_pixel() as u32,
            timestamp_us: now_us(),
            payload: FramePayload::Bytes(bytes),
            on_complete: None,
        });
        Ok(())
    }

    fn current_buffer(&mut self) -> Result<Frame, CaptureError> {
        self.pending.take().ok_or(CaptureError::NotConfigured)
    }

    fn output_mode(&self) -> Result<OutputMode, CaptureError> {
        self.mode.ok_or(CaptureError::NotConfigured)
    }
}

fn now_us() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OutputModeRequest {
        OutputModeRequest {
            mode: DisplayMode::Extend,
            width: 1280,
            height: 720,
            refresh_rate: 30,
        }
    }

    #[test]
    fn setup_twice_fails() {
        let mut src = SyntheticFrameSource::new();
        src.setup(request()).unwrap();
        assert!(matches!(
            src.setup(request()),
            Err(CaptureError::AlreadyConfigured)
        ));
    }

    #[test]
    fn swap_before_setup_fails() {
        let mut src = SyntheticFrameSource::new();
        assert!(matches!(
            src.swap_buffers(),
            Err(CaptureError::NotConfigured)
        ));
    }

    #[test]
    fn mirror_mode_rejected() {
        let mut src = SyntheticFrameSource::new();
        let mut req = request();
        req.mode = DisplayMode::Mirror;
        assert!(matches!(src.setup(req), Err(CaptureError::UnsupportedMode)));
    }

    #[test]
    fn swapped_frames_have_monotonic_timestamps() {
        let mut src = SyntheticFrameSource::new();
        src.setup(request()).unwrap();
        src.swap_buffers().unwrap();
        let a = src.current_buffer().unwrap();
        src.swap_buffers().unwrap();
        let b = src.current_buffer().unwrap();
        assert!(b.timestamp_us >= a.timestamp_us);
    }

    #[test]
    fn current_buffer_without_swap_fails() {
        let mut src = SyntheticFrameSource::new();
        src.setup(request()).unwrap();
        assert!(matches!(
            src.current_buffer(),
            Err(CaptureError::NotConfigured)
        ));
    }

    #[test]
    fn teardown_then_setup_again_succeeds() {
        let mut src = SyntheticFrameSource::new();
        src.setup(request()).unwrap();
        src.teardown();
        assert!(src.setup(request()).is_ok());
    }
}
