//! RTP/MP2T datagram construction (spec §3 "RTPDatagram", §4.4).
//!
//! The sequence number is assigned when a TS run is queued, so strict
//! ordering survives even if a later send is dropped after a retry. The
//! 90 kHz timestamp field is left zeroed here and patched in just before
//! the datagram actually goes out, since the wire timestamp is defined as
//! wall-clock time at send, not at queue time.

use wfd_core::wire::{MAX_TS_PACKETS_PER_RTP, MAX_UNIT_SIZE, RTP_HEADER_LEN, RTP_PAYLOAD_TYPE_MP2T, RTP_SSRC, TS_PACKET_LEN};

/// A single RTP/MP2T datagram awaiting send.
#[derive(Debug, Clone)]
pub struct RtpDatagram {
    pub bytes: Vec<u8>,
    /// Timestamp of the parent TS run, carried for observability only
    /// (spec §4.4): not the 90 kHz field written on the wire.
    pub parent_timestamp_us: i64,
}

/// Splits `ts_run` (must be a multiple of 188 bytes) into RTP datagrams of
/// at most [`MAX_TS_PACKETS_PER_RTP`] TS packets each, assigning
/// sequence numbers starting at `*sequence` and advancing it mod 2^16.
#[must_use]
pub fn build_datagrams(ts_run: &[u8], parent_timestamp_us: i64, sequence: &mut u16) -> Vec<RtpDatagram> {
    debug_assert_eq!(ts_run.len() % TS_PACKET_LEN, 0);

    let mut out = Vec::new();
    let mut offset = 0;

    while offset < ts_run.len() {
        let remaining_packets = (ts_run.len() - offset) / TS_PACKET_LEN;
        let num_packets = remaining_packets.min(MAX_TS_PACKETS_PER_RTP);
        let payload_len = num_packets * TS_PACKET_LEN;

        let mut bytes = Vec::with_capacity(RTP_HEADER_LEN + payload_len);
        bytes.push(0x80); // version=2, no padding, no extension, no CSRC
        bytes.push(RTP_PAYLOAD_TYPE_MP2T);
        bytes.push((*sequence >> 8) as u8);
        bytes.push((*sequence & 0xFF) as u8);
        bytes.extend_from_slice(&0u32.to_be_bytes()); // timestamp placeholder
        bytes.extend_from_slice(&RTP_SSRC.to_be_bytes());
        bytes.extend_from_slice(&ts_run[offset..offset + payload_len]);

        debug_assert!(bytes.len() <= MAX_UNIT_SIZE);

        *sequence = sequence.wrapping_add(1);
        offset += payload_len;

        out.push(RtpDatagram {
            bytes,
            parent_timestamp_us,
        });
    }

    out
}

/// Patches the 90 kHz RTP timestamp field with the value derived from
/// `now_us` (spec §3: `(now_us * 9) / 100`).
pub fn stamp_send_timestamp(datagram: &mut [u8], now_us: i64) {
    let rtp_time = ((now_us.max(0) as u64 * 9) / 100) as u32;
    datagram[4..8].copy_from_slice(&rtp_time.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_at_most_seven_packets() {
        let ts_run = vec![0xAB; TS_PACKET_LEN * 10];
        let mut seq = 0u16;
        let datagrams = build_datagrams(&ts_run, 123, &mut seq);
        assert_eq!(datagrams.len(), 2); // 7 + 3
        assert_eq!(datagrams[0].bytes.len(), RTP_HEADER_LEN + 7 * TS_PACKET_LEN);
        assert_eq!(datagrams[1].bytes.len(), RTP_HEADER_LEN + 3 * TS_PACKET_LEN);
    }

    #[test]
    fn sequence_numbers_are_monotonic_and_wrap() {
        let ts_run = vec![0xAB; TS_PACKET_LEN];
        let mut seq = 0xFFFFu16;
        let first = build_datagrams(&ts_run, 0, &mut seq);
        let second = build_datagrams(&ts_run, 0, &mut seq);
        let seq_of = |d: &RtpDatagram| u16::from_be_bytes([d.bytes[2], d.bytes[3]]);
        assert_eq!(seq_of(&first[0]), 0xFFFF);
        assert_eq!(seq_of(&second[0]), 0x0000);
    }

    #[test]
    fn header_has_fixed_payload_type_and_ssrc() {
        let ts_run = vec![0; TS_PACKET_LEN];
        let mut seq = 0;
        let datagrams = build_datagrams(&ts_run, 0, &mut seq);
        assert_eq!(datagrams[0].bytes[1], RTP_PAYLOAD_TYPE_MP2T);
        let ssrc = u32::from_be_bytes([
            datagrams[0].bytes[8],
            datagrams[0].bytes[9],
            datagrams[0].bytes[10],
            datagrams[0].bytes[11],
        ]);
        assert_eq!(ssrc, RTP_SSRC);
    }

    #[test]
    fn stamp_send_timestamp_uses_90khz_formula() {
        let mut bytes = vec![0u8; RTP_HEADER_LEN];
        stamp_send_timestamp(&mut bytes, 1_000_000);
        let stamped = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(stamped, (1_000_000u64 * 9 / 100) as u32);
    }
}
