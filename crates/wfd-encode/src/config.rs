//! Encoder configuration (spec §4.2).

use wfd_capture::PixelFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum H264Profile {
    ConstrainedBaseline,
    ConstrainedHigh,
}

/// H.264 level, expressed as `major * 10 + minor` (e.g. 32 for level 3.2).
/// Spec requires level >= 3.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct H264Level(pub u32);

impl H264Level {
    pub const MIN: Self = Self(32);
}

#[derive(Debug, Clone, Copy)]
pub struct EncoderConfig {
    pub profile: H264Profile,
    pub level: H264Level,
    pub framerate: u32,
    pub bitrate_bps: u32,
    pub idr_interval_frames: u32,
    pub input_format: PixelFormat,
    pub width: u32,
    pub height: u32,
}

impl EncoderConfig {
    /// A conservative default matching the CEA 1280x720p30 reference mode
    /// from the WFD sink capability set.
    #[must_use]
    pub fn default_for(width: u32, height: u32) -> Self {
        Self {
            profile: H264Profile::ConstrainedBaseline,
            level: H264Level::MIN,
            framerate: 30,
            bitrate_bps: 8_000_000,
            idr_interval_frames: 60,
            input_format: PixelFormat::Bgra,
            width,
            height,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.level >= H264Level::MIN
            && self.framerate > 0
            && self.bitrate_bps > 0
            && self.width > 0
            && self.height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EncoderConfig::default_for(1280, 720).is_valid());
    }

    #[test]
    fn level_below_minimum_is_invalid() {
        let mut cfg = EncoderConfig::default_for(1280, 720);
        cfg.level = H264Level(30);
        assert!(!cfg.is_valid());
    }

    #[test]
    fn zero_dimensions_are_invalid() {
        let mut cfg = EncoderConfig::default_for(1280, 720);
        cfg.width = 0;
        assert!(!cfg.is_valid());
    }
}
