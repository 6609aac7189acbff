//! Data model for the Frame Source (spec §3 "Frame", §4.1).

use std::fmt;

/// Pixel format of a captured or synthesized frame.
///
/// The full enumeration from spec §3; `wfd-encode` only accepts a subset
/// (see `wfd_encode::SUPPORTED_INPUT_FORMATS`) but the capture side must be
/// able to describe whatever the platform handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba,
    Bgra,
    Rgbx,
    Bgrx,
    Rgb,
    Bgr,
    Rgb565,
    Rgba5551,
    Rgba4444,
}

impl PixelFormat {
    /// Bytes occupied by one pixel in this format.
    #[must_use]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba | Self::Bgra | Self::Rgbx | Self::Bgrx => 4,
            Self::Rgb | Self::Bgr => 3,
            Self::Rgb565 | Self::Rgba5551 | Self::Rgba4444 => 2,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rgba => "RGBA",
            Self::Bgra => "BGRA",
            Self::Rgbx => "RGBX",
            Self::Bgrx => "BGRX",
            Self::Rgb => "RGB",
            Self::Bgr => "BGR",
            Self::Rgb565 => "RGB565",
            Self::Rgba5551 => "RGBA5551",
            Self::Rgba4444 => "RGBA4444",
        };
        f.write_str(s)
    }
}

/// The secondary-display mode requested from `setup()` (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Unsupported: the sink shows a copy of the local display.
    Mirror,
    /// The only supported mode: the sink extends the desktop.
    Extend,
}

/// Parameters requested when configuring the Frame Source.
#[derive(Debug, Clone, Copy)]
pub struct OutputModeRequest {
    pub mode: DisplayMode,
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
}

/// The negotiated output mode, returned by `output_mode()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputMode {
    pub mode: DisplayMode,
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
}

/// Either a zero-copy native buffer handle, or owned pixel bytes.
pub enum FramePayload {
    /// Opaque platform handle (e.g. a DMA-BUF fd or `PipeWire` buffer id),
    /// consumed zero-copy by an encoder that understands it.
    Native(u64),
    /// Pixel rows in top-down order.
    Bytes(Vec<u8>),
}

impl fmt::Debug for FramePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(handle) => f.debug_tuple("Native").field(handle).finish(),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
        }
    }
}

/// A callback fired exactly once when the last reference to a frame's
/// underlying buffer is released (spec §3 "Frame", §4.5).
pub type CompletionCallback = Box<dyn FnOnce() + Send>;

/// A single captured display frame (spec §3 "Frame").
pub struct Frame {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    /// Monotonic microsecond timestamp, taken post-swap (spec §4.1).
    pub timestamp_us: i64,
    pub payload: FramePayload,
    /// Invoked when this frame's last reference is dropped; used by the
    /// renderer to return the native buffer to the display source.
    pub on_complete: Option<CompletionCallback>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("timestamp_us", &self.timestamp_us)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        if let Some(cb) = self.on_complete.take() {
            cb();
        }
    }
}

impl Frame {
    /// Expected byte length of a full tightly-packed frame, ignoring stride
    /// padding. Used to validate synthetic/test frames.
    #[must_use]
    pub fn expected_len(width: u32, height: u32, format: PixelFormat) -> usize {
        width as usize * height as usize * format.bytes_per_pixel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn bytes_per_pixel_matches_layout() {
        assert_eq!(PixelFormat::Rgba.bytes_per_pixel(), 4);
        assert_eq!(PixelFormat::Rgb.bytes_per_pixel(), 3);
        assert_eq!(PixelFormat::Rgb565.bytes_per_pixel(), 2);
    }

    #[test]
    fn completion_callback_fires_once_on_drop() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);
        let frame = Frame {
            format: PixelFormat::Bgra,
            width: 2,
            height: 2,
            stride: 8,
            timestamp_us: 0,
            payload: FramePayload::Bytes(vec![0; 16]),
            on_complete: Some(Box::new(move || {
                fired_clone.store(true, Ordering::SeqCst);
            })),
        };
        assert!(!fired.load(Ordering::SeqCst));
        drop(frame);
        assert!(fired.load(Ordering::SeqCst));
    }
}
