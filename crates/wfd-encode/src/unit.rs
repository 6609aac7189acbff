//! `EncodedUnit`, the Encoder's output type (spec §3).

/// One or more H.264 NAL units in Annex-B framing (start codes
/// `0x000001`/`0x00000001`).
#[derive(Debug, Clone)]
pub struct EncodedUnit {
    pub payload: Vec<u8>,
    /// Carried verbatim from the frame that produced it.
    pub timestamp_us: i64,
    /// Set only on the unit carrying SPS+PPS, emitted once per `start()`
    /// and again after every honored `send_idr_frame()`.
    pub is_codec_config: bool,
}

impl EncodedUnit {
    #[must_use]
    pub fn codec_config(payload: Vec<u8>, timestamp_us: i64) -> Self {
        Self {
            payload,
            timestamp_us,
            is_codec_config: true,
        }
    }

    #[must_use]
    pub fn frame(payload: Vec<u8>, timestamp_us: i64) -> Self {
        Self {
            payload,
            timestamp_us,
            is_codec_config: false,
        }
    }
}
