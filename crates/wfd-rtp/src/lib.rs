//! RTP Sender (C4): wraps MPEG-TS runs into RTP/MP2T datagrams and streams
//! them over UDP at real-time rates.

pub mod datagram;
pub mod error;
pub mod port;
pub mod sender;

pub use datagram::RtpDatagram;
pub use error::RtpError;
pub use port::pick_random_rtp_port;
pub use sender::RtpSender;
