//! Video format negotiation (spec §4.7 "Video format negotiation").

use wfd_encode::{EncoderConfig, H264Level, H264Profile};

use crate::error::RtspError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
}

/// The reference set an implementer must meet per spec: CEA 720p at
/// 30/25/24 Hz, CBP and CHP at level 3.2.
const REFERENCE_RESOLUTIONS: &[Resolution] = &[
    Resolution { width: 1280, height: 720, framerate: 30 },
    Resolution { width: 1280, height: 720, framerate: 25 },
    Resolution { width: 1280, height: 720, framerate: 24 },
];

#[derive(Debug, Clone)]
pub struct SinkCapability {
    pub native_resolution: Resolution,
    pub supported_profiles: Vec<(H264Profile, H264Level)>,
}

/// Picks, for each profile the sink and the local encoder both support,
/// the highest-framerate resolution that is within the encoder's
/// hardware ceiling and at or above the sink's native resolution.
/// Fails with [`RtspError::InvalidParameters`] if no profile survives.
pub fn negotiate(
    sink: &SinkCapability,
    local_offers: &[(H264Profile, H264Level)],
    hardware_ceiling: Resolution,
) -> Result<(H264Profile, H264Level, Resolution), RtspError> {
    let mut best: Option<(H264Profile, H264Level, Resolution)> = None;

    for (profile, level) in local_offers {
        let supported = sink
            .supported_profiles
            .iter()
            .any(|(p, l)| p == profile && l.0 >= level.0);
        if !supported {
            continue;
        }

        let candidate = REFERENCE_RESOLUTIONS
            .iter()
            .filter(|r| fits_within(r, &hardware_ceiling))
            .filter(|r| meets_or_exceeds(r, &sink.native_resolution))
            .max_by_key(|r| r.framerate);

        if let Some(resolution) = candidate {
            let better = match &best {
                Some((_, _, current)) => resolution.framerate > current.framerate,
                None => true,
            };
            if better {
                best = Some((*profile, *level, *resolution));
            }
        }
    }

    best.ok_or(RtspError::InvalidParameters)
}

fn fits_within(candidate: &Resolution, ceiling: &Resolution) -> bool {
    candidate.width <= ceiling.width && candidate.height <= ceiling.height
}

fn meets_or_exceeds(candidate: &Resolution, floor: &Resolution) -> bool {
    candidate.width >= floor.width && candidate.height >= floor.height
}

/// Builds the encoder configuration implied by a negotiated format.
pub fn encoder_config_for(
    profile: H264Profile,
    level: H264Level,
    resolution: Resolution,
) -> EncoderConfig {
    let mut config = EncoderConfig::default_for(resolution.width, resolution.height);
    config.profile = profile;
    config.level = level;
    config.framerate = resolution.framerate;
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cbp_32() -> (H264Profile, H264Level) {
        (H264Profile::ConstrainedBaseline, H264Level::MIN)
    }

    #[test]
    fn picks_highest_framerate_within_ceiling() {
        let sink = SinkCapability {
            native_resolution: Resolution { width: 640, height: 480, framerate: 30 },
            supported_profiles: vec![cbp_32()],
        };
        let ceiling = Resolution { width: 1920, height: 1080, framerate: 60 };
        let (profile, _, resolution) = negotiate(&sink, &[cbp_32()], ceiling).unwrap();
        assert_eq!(profile, H264Profile::ConstrainedBaseline);
        assert_eq!(resolution.framerate, 30);
        assert_eq!(resolution.width, 1280);
    }

    #[test]
    fn no_intersection_fails_with_invalid_parameters() {
        let sink = SinkCapability {
            native_resolution: Resolution { width: 3840, height: 2160, framerate: 30 },
            supported_profiles: vec![cbp_32()],
        };
        let ceiling = Resolution { width: 1280, height: 720, framerate: 30 };
        let err = negotiate(&sink, &[cbp_32()], ceiling).unwrap_err();
        assert!(matches!(err, RtspError::InvalidParameters));
    }

    #[test]
    fn profile_absent_from_sink_is_skipped() {
        let sink = SinkCapability {
            native_resolution: Resolution { width: 640, height: 480, framerate: 24 },
            supported_profiles: vec![(H264Profile::ConstrainedHigh, H264Level(40))],
        };
        let ceiling = Resolution { width: 1280, height: 720, framerate: 30 };
        let err = negotiate(&sink, &[cbp_32()], ceiling).unwrap_err();
        assert!(matches!(err, RtspError::InvalidParameters));
    }
}
