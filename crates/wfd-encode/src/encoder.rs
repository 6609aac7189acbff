//! The Encoder capability trait (spec §4.2, component C2).
//!
//! The three events the teacher's controller-façade style would have
//! delivered through virtual methods on a shared owner are instead owned
//! closures the caller installs before `configure()`; this keeps the
//! encoder decoupled from whatever the Media Sender happens to be.

use wfd_capture::Frame;

use crate::config::EncoderConfig;
use crate::error::EncodeError;
use crate::unit::EncodedUnit;

pub type BufferAvailableCallback = Box<dyn FnMut(EncodedUnit) + Send>;
pub type BufferReturnedCallback = Box<dyn FnMut() + Send>;

pub trait Encoder: Send {
    /// A configuration this encoder would accept for the given input size,
    /// useful as a starting point before capability negotiation narrows it.
    fn default_configuration(&self, width: u32, height: u32) -> EncoderConfig;

    /// Build the encoding pipeline. `Err(AlreadyConfigured)` if called
    /// twice without an intervening teardown.
    fn configure(&mut self, cfg: EncoderConfig) -> Result<(), EncodeError>;

    /// Enqueue a captured frame for encoding. `NotConfigured` if
    /// `configure` hasn't succeeded yet.
    fn queue_buffer(&mut self, frame: Frame) -> Result<(), EncodeError>;

    /// Force the next encoded frame to be an IDR, re-emitting codec config.
    fn send_idr_frame(&mut self) -> Result<(), EncodeError>;

    /// The configuration last accepted by `configure`, if any.
    fn configuration(&self) -> Option<EncoderConfig>;

    /// Whether the encoding pipeline is currently running.
    fn running(&self) -> bool;

    /// Install the callback invoked for every non-config encoded unit.
    fn set_on_buffer_available(&mut self, cb: BufferAvailableCallback);

    /// Install the callback invoked for units carrying SPS/PPS.
    fn set_on_buffer_with_codec_config(&mut self, cb: BufferAvailableCallback);

    /// Install the callback invoked when an input frame's reference is
    /// released back to the caller.
    fn set_on_buffer_returned(&mut self, cb: BufferReturnedCallback);
}
