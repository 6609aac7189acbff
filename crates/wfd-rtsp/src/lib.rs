//! Session State Machine (C7) and RTSP Framing & I/O (C8).

pub mod cseq;
pub mod error;
pub mod format;
pub mod framing;
pub mod message;
pub mod state;
pub mod timer;

pub use cseq::CSeqCounter;
pub use error::RtspError;
pub use format::{encoder_config_for, negotiate, Resolution, SinkCapability};
pub use framing::{RtspReader, RtspWriter};
pub use message::{RtspMessage, StartLine};
pub use state::{Session, SessionState};
pub use timer::{TimerFired, TimerHandle, TimerId, TimerSet};
