//! RTSP message model: start line, headers, optional body (spec §4.8).

use crate::error::RtspError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    Request { method: String, uri: String },
    Response { status: u16, reason: String },
}

#[derive(Debug, Clone)]
pub struct RtspMessage {
    pub start_line: StartLine,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

const RTSP_VERSION: &str = "RTSP/1.0";

impl RtspMessage {
    #[must_use]
    pub fn request(method: &str, uri: &str, cseq: u32) -> Self {
        Self {
            start_line: StartLine::Request {
                method: method.to_string(),
                uri: uri.to_string(),
            },
            headers: vec![("CSeq".into(), cseq.to_string())],
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn response(status: u16, reason: &str, cseq: u32) -> Self {
        Self {
            start_line: StartLine::Response {
                status,
                reason: reason.to_string(),
            },
            headers: vec![("CSeq".into(), cseq.to_string())],
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.headers.push(("Content-Length".into(), body.len().to_string()));
        self.body = body;
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn cseq(&self) -> Option<u32> {
        self.header("CSeq").and_then(|v| v.trim().parse().ok())
    }

    #[must_use]
    pub fn content_length(&self) -> usize {
        self.header("Content-Length")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match &self.start_line {
            StartLine::Request { method, .. } => Some(method),
            StartLine::Response { .. } => None,
        }
    }

    /// Serializes the message header block plus body into wire bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        match &self.start_line {
            StartLine::Request { method, uri } => {
                out.push_str(&format!("{method} {uri} {RTSP_VERSION}\r\n"));
            }
            StartLine::Response { status, reason } => {
                out.push_str(&format!("{RTSP_VERSION} {status} {reason}\r\n"));
            }
        }
        for (name, value) in &self.headers {
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        out.push_str("\r\n");

        let mut bytes = out.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }

    /// Parses the header block (everything up to, but not including, the
    /// body). `head` must not contain the trailing `\r\n\r\n`.
    pub fn parse_head(head: &str) -> Result<Self, RtspError> {
        let mut lines = head.split("\r\n");
        let first = lines.next().ok_or(RtspError::Malformed)?;
        let start_line = parse_start_line(first)?;

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let (name, value) = line.split_once(':').ok_or(RtspError::Malformed)?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        Ok(Self {
            start_line,
            headers,
            body: Vec::new(),
        })
    }
}

fn parse_start_line(line: &str) -> Result<StartLine, RtspError> {
    let parts: Vec<&str> = line.splitn(3, ' ').collect();
    if parts.len() != 3 {
        return Err(RtspError::Malformed);
    }

    if parts[0].starts_with("RTSP/") {
        let status = parts[1].parse().map_err(|_| RtspError::Malformed)?;
        Ok(StartLine::Response {
            status,
            reason: parts[2].to_string(),
        })
    } else {
        Ok(StartLine::Request {
            method: parts[0].to_string(),
            uri: parts[1].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_request_header_block() {
        let msg = RtspMessage::request("OPTIONS", "*", 1).with_header("Require", "org.wfa.wfd1.0");
        let bytes = msg.to_bytes();
        let text = String::from_utf8(bytes).unwrap();
        let head = text.trim_end_matches("\r\n\r\n");
        let parsed = RtspMessage::parse_head(head).unwrap();
        assert_eq!(parsed.cseq(), Some(1));
        assert_eq!(parsed.method(), Some("OPTIONS"));
    }

    #[test]
    fn response_start_line_parses_status() {
        let msg = RtspMessage::response(200, "OK", 7);
        let text = String::from_utf8(msg.to_bytes()).unwrap();
        let head = text.trim_end_matches("\r\n\r\n");
        let parsed = RtspMessage::parse_head(head).unwrap();
        assert!(matches!(
            parsed.start_line,
            StartLine::Response { status: 200, .. }
        ));
    }

    #[test]
    fn content_length_reflects_body() {
        let msg = RtspMessage::request("SET_PARAMETER", "rtsp://x", 2)
            .with_body(b"wfd_video_formats: 00".to_vec());
        assert_eq!(msg.content_length(), "wfd_video_formats: 00".len());
    }
}
