//! Wire-level constants shared by the mux, RTP and RTSP crates (spec §3, §6).

/// Maximum RTP datagram payload size: 1500 MTU minus IP/UDP headers.
pub const MAX_UNIT_SIZE: usize = 1472;

/// Size of the fixed RTP header (version/PT/seq/timestamp/SSRC).
pub const RTP_HEADER_LEN: usize = 12;

/// One MPEG-TS packet is always exactly this many bytes.
pub const TS_PACKET_LEN: usize = 188;

/// Maximum whole TS packets that fit after the RTP header in one datagram.
pub const MAX_TS_PACKETS_PER_RTP: usize = (MAX_UNIT_SIZE - RTP_HEADER_LEN) / TS_PACKET_LEN;

/// RTP payload type for MPEG2-TS (IANA rtp-parameters registry).
pub const RTP_PAYLOAD_TYPE_MP2T: u8 = 33;

/// Fixed synchronization source identifier used by every session.
pub const RTP_SSRC: u32 = 0xDEAD_BEEF;

/// PAT PID.
pub const PID_PAT: u16 = 0x0000;

/// PMT PID.
pub const PID_PMT: u16 = 0x0100;

/// Video elementary stream PID.
pub const PID_VIDEO: u16 = 0x1011;

/// PES stream id used for the video elementary stream.
pub const PES_STREAM_ID_VIDEO: u8 = 0xE0;

/// MPEG-TS sync byte.
pub const TS_SYNC_BYTE: u8 = 0x47;

/// Default media-control TCP port advertised by the Connection Manager (§4.9).
pub const DEFAULT_MEDIA_CONTROL_PORT: u16 = 7236;

/// Lower bound (inclusive) of the locally-chosen RTP port range (§4.7).
pub const RTP_PORT_RANGE_START: u16 = 1024;

/// Upper bound (inclusive) of the locally-chosen RTP port range (§4.7).
pub const RTP_PORT_RANGE_END: u16 = 65534;

/// Interval at which the packetizer must refresh PAT+PMT+PCR (§3 invariant 3).
pub const PAT_PMT_INTERVAL_MS: u64 = 100;

/// Capacity of the capture -> encode buffer queue (§4.5).
pub const CAPTURE_QUEUE_CAPACITY: usize = 2;
