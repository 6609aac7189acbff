//! The Packetizer (spec §4.3, component C3): multiplexes an H.264
//! elementary stream into an MPEG-TS program with periodic PAT/PMT/PCR.

use std::collections::HashMap;

use wfd_core::wire::{PES_STREAM_ID_VIDEO, PID_VIDEO, TS_PACKET_LEN};
use wfd_encode::EncodedUnit;

use crate::error::MuxError;
use crate::ts::{build_adaptation_field_with_pcr, build_pat, build_pes_header, build_pmt, packetize_payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFormat {
    H264,
}

/// `flags` bitset from spec §4.3: which periodic structures to emit ahead
/// of this run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketizeFlags {
    pub emit_pat_and_pmt: bool,
    pub emit_pcr: bool,
}

struct TrackState {
    #[allow(dead_code)]
    format: TrackFormat,
    pending_codec_config: Option<Vec<u8>>,
    pcr_base_us: Option<i64>,
}

/// Multiplexes one or more elementary streams into a single MPEG-TS
/// program. Only a video track is exercised in this deployment, but the
/// track API is generic.
pub struct Packetizer {
    tracks: HashMap<u32, TrackState>,
    next_track_id: u32,
    pat_continuity: u8,
    pmt_continuity: u8,
    video_continuity: u8,
}

impl Packetizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tracks: HashMap::new(),
            next_track_id: 0,
            pat_continuity: 0,
            pmt_continuity: 0,
            video_continuity: 0,
        }
    }

    pub fn add_track(&mut self, format: TrackFormat) -> u32 {
        let id = self.next_track_id;
        self.next_track_id += 1;
        self.tracks.insert(
            id,
            TrackState {
                format,
                pending_codec_config: None,
                pcr_base_us: None,
            },
        );
        id
    }

    /// Stashes `unit`'s payload to be prepended to the next packetized
    /// access unit on `track_id`. The codec-config unit is never emitted
    /// on its own (spec §4.3 invariant 4).
    pub fn submit_codec_config(&mut self, track_id: u32, unit: &EncodedUnit) -> Result<(), MuxError> {
        let track = self
            .tracks
            .get_mut(&track_id)
            .ok_or(MuxError::UnknownTrack(track_id))?;
        if track.pending_codec_config.is_some() {
            return Err(MuxError::CodecConfigAlreadySubmitted(track_id));
        }
        track.pending_codec_config = Some(unit.payload.clone());
        Ok(())
    }

    /// Packetizes `unit` (plus any pending codec config) into a run of
    /// 188-byte TS packets, optionally prefixed with fresh PAT/PMT and
    /// carrying a PCR in the first packet's adaptation field.
    /// `Err(PartialNal)` if `unit.payload` is not a whole number of
    /// Annex-B NALs.
    pub fn packetize(
        &mut self,
        track_id: u32,
        unit: &EncodedUnit,
        flags: PacketizeFlags,
    ) -> Result<Vec<u8>, MuxError> {
        if !is_whole_number_of_nals(&unit.payload) {
            return Err(MuxError::PartialNal(unit.payload.len()));
        }

        let track = self
            .tracks
            .get_mut(&track_id)
            .ok_or(MuxError::UnknownTrack(track_id))?;

        let base = *track.pcr_base_us.get_or_insert(unit.timestamp_us);

        let mut payload = Vec::new();
        if let Some(cfg) = track.pending_codec_config.take() {
            payload.extend_from_slice(&cfg);
        }
        payload.extend_from_slice(&unit.payload);

        let mut out = Vec::new();

        if flags.emit_pat_and_pmt {
            out.extend_from_slice(&build_pat(self.pat_continuity));
            self.pat_continuity = self.pat_continuity.wrapping_add(1) & 0x0F;
            out.extend_from_slice(&build_pmt(self.pmt_continuity));
            self.pmt_continuity = self.pmt_continuity.wrapping_add(1) & 0x0F;
        }

        let elapsed_us = unit.timestamp_us.saturating_sub(base).max(0);
        #[allow(clippy::cast_sign_loss)]
        let pcr_90k = ((elapsed_us as u64) * 9) / 100;

        let adaptation = flags
            .emit_pcr
            .then(|| build_adaptation_field_with_pcr(pcr_90k, 8));

        let pes = build_pes_header(PES_STREAM_ID_VIDEO, Some(pcr_90k), payload.len());
        let mut pes_payload = pes;
        pes_payload.extend_from_slice(&payload);

        let (ts_bytes, next_continuity) =
            packetize_payload(PID_VIDEO, &pes_payload, self.video_continuity, adaptation);
        self.video_continuity = next_continuity;

        out.extend_from_slice(&ts_bytes);

        debug_assert_eq!(out.len() % TS_PACKET_LEN, 0);
        Ok(out)
    }
}

impl Default for Packetizer {
    fn default() -> Self {
        Self::new()
    }
}

/// `true` if `bytes` is empty, or begins with an Annex-B start code and
/// every delimited NAL (up to the next start code or end of buffer)
/// carries at least one byte. A dangling start code with nothing after
/// it — a NAL truncated mid-emission — fails this check (spec §4.3).
fn is_whole_number_of_nals(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return true;
    }
    let starts = find_start_codes(bytes);
    if starts.first().map(|&(offset, _)| offset) != Some(0) {
        return false;
    }
    starts.iter().enumerate().all(|(i, &(start, header_len))| {
        let nal_start = start + header_len;
        let end = starts.get(i + 1).map_or(bytes.len(), |&(next, _)| next);
        nal_start < end
    })
}

/// Returns `(offset, start_code_len)` for every Annex-B start code found.
fn find_start_codes(bytes: &[u8]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut i = 0;
    while i + 2 < bytes.len() {
        if bytes[i] == 0 && bytes[i + 1] == 0 && bytes[i + 2] == 1 {
            out.push((i, 3));
            i += 3;
        } else if i + 3 < bytes.len()
            && bytes[i] == 0
            && bytes[i + 1] == 0
            && bytes[i + 2] == 0
            && bytes[i + 3] == 1
        {
            out.push((i, 4));
            i += 4;
        } else {
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(ts: i64, payload: Vec<u8>) -> EncodedUnit {
        EncodedUnit::frame(payload, ts)
    }

    /// One Annex-B-framed NAL unit (start code + type nibble + body).
    fn nal_unit(ts: i64, nal_type: u8, body_len: usize) -> EncodedUnit {
        let mut payload = vec![0, 0, 0, 1, nal_type];
        payload.extend(std::iter::repeat(0xABu8).take(body_len));
        unit(ts, payload)
    }

    #[test]
    fn output_is_188_aligned_with_pat_pmt() {
        let mut mux = Packetizer::new();
        let track = mux.add_track(TrackFormat::H264);
        let run = mux
            .packetize(
                track,
                &nal_unit(0, 1, 300),
                PacketizeFlags {
                    emit_pat_and_pmt: true,
                    emit_pcr: true,
                },
            )
            .unwrap();
        assert_eq!(run.len() % TS_PACKET_LEN, 0);
        assert!(run.len() > 2 * TS_PACKET_LEN); // PAT + PMT + at least one payload packet
    }

    #[test]
    fn codec_config_is_prepended_once() {
        let mut mux = Packetizer::new();
        let track = mux.add_track(TrackFormat::H264);
        mux.submit_codec_config(track, &EncodedUnit::codec_config(vec![0x11; 20], 0))
            .unwrap();
        let first = mux
            .packetize(track, &nal_unit(0, 1, 10), PacketizeFlags::default())
            .unwrap();
        let second = mux
            .packetize(track, &nal_unit(33, 1, 10), PacketizeFlags::default())
            .unwrap();
        assert!(first.len() >= second.len());
    }

    #[test]
    fn unknown_track_is_rejected() {
        let mut mux = Packetizer::new();
        let result = mux.packetize(99, &unit(0, vec![]), PacketizeFlags::default());
        assert!(matches!(result, Err(MuxError::UnknownTrack(99))));
    }

    #[test]
    fn continuity_counters_wrap_mod_16() {
        let mut mux = Packetizer::new();
        let track = mux.add_track(TrackFormat::H264);
        for i in 0..20 {
            mux.packetize(track, &nal_unit(i, 1, 200), PacketizeFlags::default())
                .unwrap();
        }
        assert!(mux.video_continuity < 16);
    }

    #[test]
    fn partial_trailing_nal_is_rejected() {
        let mut mux = Packetizer::new();
        let track = mux.add_track(TrackFormat::H264);
        // A dangling start code with no NAL header/body after it.
        let truncated = unit(0, vec![0, 0, 0, 1]);
        let result = mux.packetize(track, &truncated, PacketizeFlags::default());
        assert!(matches!(result, Err(MuxError::PartialNal(4))));
    }

    #[test]
    fn leading_garbage_before_first_start_code_is_rejected() {
        let mut mux = Packetizer::new();
        let track = mux.add_track(TrackFormat::H264);
        let mut payload = vec![0xFF, 0xFF];
        payload.extend_from_slice(&[0, 0, 0, 1, 1, 0xAB]);
        let result = mux.packetize(track, &unit(0, payload), PacketizeFlags::default());
        assert!(matches!(result, Err(MuxError::PartialNal(8))));
    }
}
