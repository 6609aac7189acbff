//! Wires the Encoder's event interface to the Packetizer and RTP Sender
//! (spec §4.2 "event interface to the Media Sender", §4.3 invariant 3:
//! fresh PAT/PMT/PCR every 100 ms).

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use wfd_core::wire::PAT_PMT_INTERVAL_MS;
use wfd_encode::{Encoder, EncodedUnit};
use wfd_mux::{PacketizeFlags, Packetizer, TrackFormat};
use wfd_rtp::RtpSender;

struct Cadence {
    last_pat_pmt: Option<Instant>,
}

impl Cadence {
    fn next_flags(&mut self) -> PacketizeFlags {
        let now = Instant::now();
        let due = match self.last_pat_pmt {
            None => true,
            Some(last) => now.duration_since(last) >= Duration::from_millis(PAT_PMT_INTERVAL_MS),
        };
        if due {
            self.last_pat_pmt = Some(now);
        }
        PacketizeFlags {
            emit_pat_and_pmt: due,
            emit_pcr: due,
        }
    }
}

/// Registers the callbacks on `encoder` that feed every encoded unit
/// through `packetizer` and onward into `sender`.
pub fn wire(
    encoder: &mut dyn Encoder,
    packetizer: Arc<Mutex<Packetizer>>,
    sender: Arc<Mutex<RtpSender>>,
) -> u32 {
    let track_id = packetizer
        .lock()
        .expect("packetizer mutex poisoned")
        .add_track(TrackFormat::H264);

    let cadence = Arc::new(Mutex::new(Cadence { last_pat_pmt: None }));

    let config_packetizer = Arc::clone(&packetizer);
    encoder.set_on_buffer_with_codec_config(Box::new(move |unit: EncodedUnit| {
        if let Err(e) = config_packetizer
            .lock()
            .expect("packetizer mutex poisoned")
            .submit_codec_config(track_id, &unit)
        {
            tracing::warn!("failed to submit codec config: {e}");
        }
    }));

    let frame_packetizer = Arc::clone(&packetizer);
    let frame_sender = Arc::clone(&sender);
    encoder.set_on_buffer_available(Box::new(move |unit: EncodedUnit| {
        let flags = cadence.lock().expect("cadence mutex poisoned").next_flags();
        let run = frame_packetizer
            .lock()
            .expect("packetizer mutex poisoned")
            .packetize(track_id, &unit, flags);
        match run {
            Ok(bytes) => {
                if let Err(e) = frame_sender
                    .lock()
                    .expect("rtp sender mutex poisoned")
                    .queue(&bytes, unit.timestamp_us)
                {
                    tracing::warn!("failed to queue RTP run: {e}");
                }
            }
            Err(e) => tracing::warn!("failed to packetize encoded unit: {e}"),
        }
    }));

    track_id
}
