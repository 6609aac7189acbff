//! Frame Source (C1): captures display frames via the desktop portal and
//! `PipeWire`, with a synthetic fallback for headless environments.

pub mod error;
pub mod frame;
pub mod live;
pub mod pipewire_stream;
pub mod portal;
pub mod source;
pub mod synthetic;

pub use error::CaptureError;
pub use frame::{
    CompletionCallback, DisplayMode, Frame, FramePayload, OutputMode, OutputModeRequest,
    PixelFormat,
};
pub use live::LiveFrameSource;
pub use source::FrameSource;
pub use synthetic::SyntheticFrameSource;
