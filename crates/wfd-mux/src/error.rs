//! Packetizer error taxonomy (spec §4.3, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MuxError {
    #[error("unknown track id {0}")]
    UnknownTrack(u32),

    #[error("codec config already submitted for track {0}; call packetize() instead")]
    CodecConfigAlreadySubmitted(u32),

    #[error("no codec config submitted yet for track {0}")]
    NoCodecConfig(u32),

    #[error("encoded unit payload ({0} bytes) is not a whole number of Annex-B NALs")]
    PartialNal(usize),
}

impl From<MuxError> for wfd_core::Error {
    fn from(e: MuxError) -> Self {
        match e {
            MuxError::UnknownTrack(_) => Self::ParamInvalid("track id".into()),
            MuxError::CodecConfigAlreadySubmitted(_) | MuxError::NoCodecConfig(_) => {
                Self::InvalidState
            }
            MuxError::PartialNal(_) => Self::ParamInvalid("nal framing".into()),
        }
    }
}
