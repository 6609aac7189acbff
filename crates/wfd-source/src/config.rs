use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Source daemon configuration loaded from TOML, overridable by CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Local address the media-control listener binds to.
    pub bind_address: String,

    /// Media-control TCP port (spec §4.9, §6).
    pub media_control_port: u16,

    /// Capture frame rate in frames per second.
    pub capture_fps: u32,

    /// Target H.264 bitrate in bits per second.
    pub encoder_bitrate_bps: u32,

    /// Frames between forced IDRs.
    pub idr_interval_frames: u32,

    /// Seconds to wait for a peer's RTSP response before firing `kTimeout`.
    pub rtsp_timeout_secs: u64,

    /// Run the D-Bus operator facade on the session bus instead of the
    /// system bus. Useful for development without a system service unit.
    pub dbus_session_bus: bool,

    /// Use the synthetic test-pattern Frame Source instead of the portal/
    /// `PipeWire` live capture path. Off by default; useful for headless
    /// test rigs and CI where no compositor is available.
    pub static_display: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            media_control_port: wfd_core::wire::DEFAULT_MEDIA_CONTROL_PORT,
            capture_fps: 30,
            encoder_bitrate_bps: 8_000_000,
            idr_interval_frames: 60,
            rtsp_timeout_secs: 10,
            dbus_session_bus: false,
            static_display: false,
        }
    }
}

/// Loads the daemon configuration from a TOML file, falling back to
/// defaults if the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load(path: Option<&Path>) -> Result<SourceConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from("/etc/aethercast-rs/source.toml"),
    };

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(SourceConfig::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config: SourceConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;

    tracing::info!(?path, "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_spec_media_control_port() {
        let cfg = SourceConfig::default();
        assert_eq!(cfg.media_control_port, 7236);
        assert!(!cfg.static_display);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load(Some(Path::new("/nonexistent/path/source.toml"))).unwrap();
        assert_eq!(cfg.capture_fps, 30);
    }
}
