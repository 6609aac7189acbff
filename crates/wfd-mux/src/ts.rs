//! MPEG-TS packet construction: PAT, PMT, PES framing, and the 188-byte
//! packet header shared by all three (spec §3 "TSPacket", §4.3).

use wfd_core::wire::{PES_STREAM_ID_VIDEO, PID_PAT, PID_PMT, PID_VIDEO, TS_PACKET_LEN, TS_SYNC_BYTE};

use crate::crc32::mpeg2_crc32;

const PROGRAM_NUMBER: u16 = 1;
const TRANSPORT_STREAM_ID: u16 = 1;
const H264_STREAM_TYPE: u8 = 0x1B;

fn fill_header(out: &mut [u8; TS_PACKET_LEN], pid: u16, payload_start: bool, continuity: u8) {
    out[0] = TS_SYNC_BYTE;
    out[1] = (if payload_start { 0x40 } else { 0x00 }) | ((pid >> 8) as u8 & 0x1F);
    out[2] = (pid & 0xFF) as u8;
    out[3] = 0x10 | (continuity & 0x0F); // adaptation_field_control = payload only
}

/// Builds the single PAT packet: PID 0, one program pointing at the PMT.
#[must_use]
pub fn build_pat(continuity: u8) -> [u8; TS_PACKET_LEN] {
    let mut section = Vec::with_capacity(13);
    section.push(0x00); // table_id
    section.push(0xB0); // section_syntax_indicator=1, reserved, length high nibble
    section.push(0x00); // placeholder for length low byte, fixed below
    section.extend_from_slice(&TRANSPORT_STREAM_ID.to_be_bytes());
    section.push(0xC1); // reserved, version=0, current_next_indicator=1
    section.push(0x00); // section_number
    section.push(0x00); // last_section_number
    section.extend_from_slice(&PROGRAM_NUMBER.to_be_bytes());
    section.push(0xE0 | ((PID_PMT >> 8) as u8 & 0x1F));
    section.push((PID_PMT & 0xFF) as u8);

    let section_length = section.len() as u16 - 3 + 4; // from after length field, plus CRC
    section[1] = 0xB0 | ((section_length >> 8) as u8 & 0x0F);
    section[2] = (section_length & 0xFF) as u8;

    let crc = mpeg2_crc32(&section);
    section.extend_from_slice(&crc.to_be_bytes());

    build_psi_packet(PID_PAT, &section, continuity)
}

/// Builds the single PMT packet: one elementary stream, H.264 video.
#[must_use]
pub fn build_pmt(continuity: u8) -> [u8; TS_PACKET_LEN] {
    let mut section = Vec::with_capacity(18);
    section.push(0x02); // table_id
    section.push(0xB0);
    section.push(0x00);
    section.extend_from_slice(&PROGRAM_NUMBER.to_be_bytes());
    section.push(0xC1);
    section.push(0x00);
    section.push(0x00);
    section.push(0xE0 | ((PID_VIDEO >> 8) as u8 & 0x1F)); // PCR_PID = video PID
    section.push((PID_VIDEO & 0xFF) as u8);
    section.push(0xF0); // reserved, program_info_length high
    section.push(0x00); // program_info_length low, no descriptors
    section.push(H264_STREAM_TYPE);
    section.push(0xE0 | ((PID_VIDEO >> 8) as u8 & 0x1F));
    section.push((PID_VIDEO & 0xFF) as u8);
    section.push(0xF0); // ES_info_length high
    section.push(0x00); // ES_info_length low

    let section_length = section.len() as u16 - 3 + 4;
    section[1] = 0xB0 | ((section_length >> 8) as u8 & 0x0F);
    section[2] = (section_length & 0xFF) as u8;

    let crc = mpeg2_crc32(&section);
    section.extend_from_slice(&crc.to_be_bytes());

    build_psi_packet(PID_PMT, &section, continuity)
}

fn build_psi_packet(pid: u16, section: &[u8], continuity: u8) -> [u8; TS_PACKET_LEN] {
    let mut packet = [0xFFu8; TS_PACKET_LEN];
    fill_header(&mut packet, pid, true, continuity);
    packet[4] = 0x00; // pointer_field
    let body = &mut packet[5..];
    let n = section.len().min(body.len());
    body[..n].copy_from_slice(&section[..n]);
    packet
}

/// Wraps H.264 Annex-B payload in a PES header (`stream_id = 0xE0`).
#[must_use]
pub fn build_pes_header(stream_id: u8, pts_90k: Option<u64>, payload_len: usize) -> Vec<u8> {
    let mut pes = vec![0x00, 0x00, 0x01, stream_id];
    let (pts_bytes, flags): (Vec<u8>, u8) = match pts_90k {
        Some(pts) => (encode_pts(0x02, pts), 0x80),
        None => (Vec::new(), 0x00),
    };
    let header_data_len = pts_bytes.len() as u8;
    let pes_packet_length = if payload_len > 0 {
        (3 + header_data_len as usize + payload_len).min(0xFFFF) as u16
    } else {
        0
    };
    pes.extend_from_slice(&pes_packet_length.to_be_bytes());
    pes.push(0x80); // '10' marker, no scrambling, not priority, data-aligned=0, copyright=0, original=0
    pes.push(flags);
    pes.push(header_data_len);
    pes.extend_from_slice(&pts_bytes);
    pes
}

fn encode_pts(marker: u8, pts: u64) -> Vec<u8> {
    let pts = pts & 0x1_FFFF_FFFF;
    let b0 = (marker << 4) | (((pts >> 30) as u8 & 0x07) << 1) | 0x01;
    let b1 = ((pts >> 22) & 0xFF) as u8;
    let b2 = ((((pts >> 15) & 0x7F) as u8) << 1) | 0x01;
    let b3 = ((pts >> 7) & 0xFF) as u8;
    let b4 = (((pts & 0x7F) as u8) << 1) | 0x01;
    vec![b0, b1, b2, b3, b4]
}

/// Builds one PCR adaptation field (42-bit PCR: 33-bit base + 9-bit
/// extension), padded to `stuffing_len` total adaptation bytes.
#[must_use]
pub fn build_adaptation_field_with_pcr(pcr_base: u64, stuffing_len: usize) -> Vec<u8> {
    let mut field = Vec::with_capacity(stuffing_len.max(8));
    field.push(0); // length placeholder
    field.push(0x10); // PCR_flag set, other flags clear
    let base = pcr_base & 0x1_FFFF_FFFF;
    let ext: u16 = 0;
    field.push(((base >> 25) & 0xFF) as u8);
    field.push(((base >> 17) & 0xFF) as u8);
    field.push(((base >> 9) & 0xFF) as u8);
    field.push(((base >> 1) & 0xFF) as u8);
    field.push((((base & 0x01) as u8) << 7) | 0x7E | (((ext >> 8) & 0x01) as u8));
    field.push((ext & 0xFF) as u8);

    while field.len() < stuffing_len.max(field.len()) {
        field.push(0xFF);
    }
    let len = (field.len() - 1) as u8;
    field[0] = len;
    field
}

/// Splits `payload` into 188-byte TS packets on `pid`, continuity counters
/// starting at `continuity`. The first packet carries `payload_unit_start`
/// and, if `adaptation` is given, the supplied adaptation field before the
/// payload bytes.
pub fn packetize_payload(
    pid: u16,
    payload: &[u8],
    mut continuity: u8,
    adaptation: Option<Vec<u8>>,
) -> (Vec<u8>, u8) {
    let mut out = Vec::new();
    let mut offset = 0;
    let mut first = true;

    while offset < payload.len() || first {
        let mut packet = [0xFFu8; TS_PACKET_LEN];
        fill_header(&mut packet, pid, first && offset == 0, continuity);

        let mut body_start = 4;
        let adaptation_bytes = if first {
            adaptation.clone()
        } else {
            None
        };

        let remaining_capacity = TS_PACKET_LEN - body_start;
        let chunk_len = (payload.len() - offset).min(remaining_capacity);
        let needs_stuffing = chunk_len < remaining_capacity && adaptation_bytes.is_none();

        if let Some(adapt) = &adaptation_bytes {
            packet[3] |= 0x20; // adaptation_field_control |= adaptation present
            let n = adapt.len().min(TS_PACKET_LEN - body_start);
            packet[body_start..body_start + n].copy_from_slice(&adapt[..n]);
            body_start += n;
        } else if needs_stuffing {
            let stuff_len = remaining_capacity - chunk_len - 1;
            packet[3] |= 0x20;
            packet[body_start] = stuff_len as u8;
            if stuff_len > 0 {
                packet[3] |= 0x10; // also has adaptation flags byte region used as stuffing
            }
            for b in packet.iter_mut().skip(body_start + 1).take(stuff_len) {
                *b = 0xFF;
            }
            body_start += 1 + stuff_len;
        }

        let n = chunk_len.min(TS_PACKET_LEN - body_start);
        packet[body_start..body_start + n].copy_from_slice(&payload[offset..offset + n]);

        out.extend_from_slice(&packet);
        offset += n;
        continuity = continuity.wrapping_add(1) & 0x0F;
        first = false;
    }

    (out, continuity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pat_is_one_ts_packet() {
        let pat = build_pat(0);
        assert_eq!(pat.len(), TS_PACKET_LEN);
        assert_eq!(pat[0], TS_SYNC_BYTE);
    }

    #[test]
    fn pmt_references_video_stream_type() {
        let pmt = build_pmt(0);
        assert!(pmt.windows(1).any(|w| w[0] == H264_STREAM_TYPE));
    }

    #[test]
    fn packetize_payload_is_188_aligned() {
        let payload = vec![0xAB; 500];
        let (bytes, _) = packetize_payload(PID_VIDEO, &payload, 0, None);
        assert_eq!(bytes.len() % TS_PACKET_LEN, 0);
    }

    #[test]
    fn pes_header_starts_with_prefix_and_stream_id() {
        let header = build_pes_header(PES_STREAM_ID_VIDEO, Some(1000), 64);
        assert_eq!(&header[0..3], &[0x00, 0x00, 0x01]);
        assert_eq!(header[3], PES_STREAM_ID_VIDEO);
    }
}
