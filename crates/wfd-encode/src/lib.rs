//! Encoder (C2): turns raw frames into an H.264 Annex-B byte stream via
//! GStreamer, emitting codec-config units on start and on forced IDR.

pub mod config;
pub mod encoder;
pub mod error;
pub mod gst;
pub mod nal;
pub mod unit;

pub use config::{EncoderConfig, H264Level, H264Profile};
pub use encoder::{BufferAvailableCallback, BufferReturnedCallback, Encoder};
pub use error::EncodeError;
pub use gst::GstEncoder;
pub use unit::EncodedUnit;
