//! Turns the sink's `GET_PARAMETER` response body into the
//! [`SinkCapability`] the state machine negotiates against.
//!
//! spec.md does not define the exact `wfd_video_formats` bitfield
//! encoding (that lives in the Wi-Fi Display 1.0 parameter spec, outside
//! this core's scope), so this reads only the sink's native resolution
//! line and otherwise assumes the mandatory CBP/level-3.2 profile every
//! compliant sink must support.

use wfd_encode::{H264Level, H264Profile};
use wfd_rtsp::{Resolution, SinkCapability};

const FALLBACK_NATIVE: Resolution = Resolution { width: 640, height: 480, framerate: 30 };

#[must_use]
pub fn parse_sink_capability(body: &str) -> SinkCapability {
    let native_resolution = body
        .lines()
        .find_map(|line| line.trim().strip_prefix("wfd_native_resolution:"))
        .and_then(parse_resolution)
        .unwrap_or(FALLBACK_NATIVE);

    SinkCapability {
        native_resolution,
        supported_profiles: vec![(H264Profile::ConstrainedBaseline, H264Level::MIN)],
    }
}

fn parse_resolution(value: &str) -> Option<Resolution> {
    let mut parts = value.trim().split('x');
    let width: u32 = parts.next()?.trim().parse().ok()?;
    let rest = parts.next()?;
    let mut rest_parts = rest.trim().split('@');
    let height: u32 = rest_parts.next()?.trim().parse().ok()?;
    let framerate: u32 = rest_parts.next()?.trim().parse().ok()?;
    Some(Resolution { width, height, framerate })
}

/// Parses `client_port=<n>` (or `client_port=<n>-<m>`) out of a SETUP
/// request's `Transport` header, per RTSP/RTP convention.
#[must_use]
pub fn parse_client_port(transport_header: &str) -> Option<u16> {
    transport_header
        .split(';')
        .find_map(|field| field.trim().strip_prefix("client_port="))
        .and_then(|range| range.split('-').next())
        .and_then(|port| port.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_explicit_native_resolution() {
        let body = "wfd_native_resolution: 1920x1080@30\r\n";
        let cap = parse_sink_capability(body);
        assert_eq!(cap.native_resolution.width, 1920);
        assert_eq!(cap.native_resolution.height, 1080);
    }

    #[test]
    fn falls_back_when_line_missing() {
        let cap = parse_sink_capability("wfd_audio_codecs: none\r\n");
        assert_eq!(cap.native_resolution, FALLBACK_NATIVE);
    }

    #[test]
    fn parses_client_port_range() {
        assert_eq!(
            parse_client_port("RTP/AVP/UDP;unicast;client_port=19000-19001"),
            Some(19000)
        );
    }

    #[test]
    fn parses_single_client_port() {
        assert_eq!(
            parse_client_port("RTP/AVP/UDP;unicast;client_port=19000"),
            Some(19000)
        );
    }
}
