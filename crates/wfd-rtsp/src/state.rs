//! Session state machine (spec §4.7): drives the M1-M7 RTSP/WFD
//! handshake for a single connected sink.

use wfd_rtp::pick_random_rtp_port;

use crate::cseq::CSeqCounter;
use crate::error::RtspError;
use crate::message::RtspMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Init,
    CapabilityExchange,
    CapabilityNegotiation,
    SessionSetup,
    SessionReady,
    Playing,
    Paused,
    Closed,
}

const WFD_REQUIRE: &str = "org.wfa.wfd1.0";
const WFD_URI: &str = "rtsp://localhost/wfd1.0";

pub struct Session {
    state: SessionState,
    cseq: CSeqCounter,
    peer_initial_cseq: Option<u32>,
    rtp_port: Option<u16>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            cseq: CSeqCounter::new(),
            peer_initial_cseq: None,
            rtp_port: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn rtp_port(&self) -> Option<u16> {
        self.rtp_port
    }

    /// Called once the Connection Manager has accepted the TCP socket
    /// for this sink (Idle -> Init).
    pub fn on_accepted(&mut self) {
        self.state = SessionState::Init;
    }

    fn remember_peer_cseq(&mut self, cseq: u32) {
        if self.peer_initial_cseq.is_none() {
            self.peer_initial_cseq = Some(cseq);
        }
    }

    /// Handles an inbound request from the sink and produces the
    /// response to write back. CSeq matching is implicit: the response
    /// always echoes the request's CSeq.
    pub fn handle_request(&mut self, request: &RtspMessage) -> Result<RtspMessage, RtspError> {
        let method = request.method().ok_or(RtspError::Malformed)?;
        let cseq = request.cseq().ok_or(RtspError::Malformed)?;
        self.remember_peer_cseq(cseq);

        match (self.state, method) {
            (SessionState::Init, "OPTIONS") => {
                self.state = SessionState::CapabilityExchange;
                Ok(RtspMessage::response(200, "OK", cseq).with_header(
                    "Public",
                    "org.wfa.wfd1.0, GET_PARAMETER, SET_PARAMETER, SETUP, PLAY, PAUSE, TEARDOWN",
                ))
            }

            (SessionState::SessionSetup, "SETUP") => {
                let port = pick_random_rtp_port();
                self.rtp_port = Some(port);
                self.state = SessionState::SessionReady;
                Ok(RtspMessage::response(200, "OK", cseq)
                    .with_header("Transport", &format!("RTP/AVP/UDP;unicast;client_port={port}")))
            }

            (SessionState::SessionReady, "PLAY") | (SessionState::Paused, "PLAY") => {
                self.state = SessionState::Playing;
                Ok(RtspMessage::response(200, "OK", cseq))
            }

            (SessionState::Playing, "PAUSE") => {
                self.state = SessionState::Paused;
                Ok(RtspMessage::response(200, "OK", cseq))
            }

            (_, "TEARDOWN") => {
                self.state = SessionState::Closed;
                Ok(RtspMessage::response(200, "OK", cseq))
            }

            _ => Err(RtspError::InvalidState),
        }
    }

    /// Builds the local M3 `GET_PARAMETER` request
    /// (CapabilityExchange -> CapabilityNegotiation).
    pub fn build_get_parameter(&mut self) -> Result<RtspMessage, RtspError> {
        if self.state != SessionState::CapabilityExchange {
            return Err(RtspError::InvalidState);
        }
        let cseq = self.cseq.next(self.peer_initial_cseq);
        self.state = SessionState::CapabilityNegotiation;
        Ok(RtspMessage::request("GET_PARAMETER", WFD_URI, cseq)
            .with_header("Require", WFD_REQUIRE)
            .with_body(b"wfd_video_formats\r\nwfd_audio_codecs\r\n".to_vec()))
    }

    /// Builds the local M4/M5 `SET_PARAMETER` request carrying the
    /// negotiated video format plus the SETUP trigger
    /// (CapabilityNegotiation -> SessionSetup).
    pub fn build_set_parameter_trigger(&mut self, wfd_video_formats: &str) -> Result<RtspMessage, RtspError> {
        if self.state != SessionState::CapabilityNegotiation {
            return Err(RtspError::InvalidState);
        }
        let cseq = self.cseq.next(self.peer_initial_cseq);
        let body = format!("wfd_video_formats: {wfd_video_formats}\r\nwfd_trigger_method: SETUP\r\n");
        self.state = SessionState::SessionSetup;
        Ok(RtspMessage::request("SET_PARAMETER", WFD_URI, cseq)
            .with_header("Require", WFD_REQUIRE)
            .with_body(body.into_bytes()))
    }

    /// Validates an IDR request against the current state; only
    /// permitted while `Playing`.
    pub fn request_idr(&self) -> Result<(), RtspError> {
        if self.state == SessionState::Playing {
            Ok(())
        } else {
            Err(RtspError::InvalidState)
        }
    }

    /// A declared response timeout, regardless of current state,
    /// closes the session.
    pub fn on_timeout(&mut self) {
        self.state = SessionState::Closed;
    }

    /// A network error from any state closes the session.
    pub fn on_network_error(&mut self) {
        self.state = SessionState::Closed;
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(method: &str, cseq: u32) -> RtspMessage {
        RtspMessage::request(method, "rtsp://localhost/wfd1.0", cseq)
    }

    #[test]
    fn walks_m1_through_setup_to_session_ready() {
        let mut session = Session::new();
        session.on_accepted();
        assert_eq!(session.state(), SessionState::Init);

        let resp = session.handle_request(&req("OPTIONS", 1)).unwrap();
        assert_eq!(resp.cseq(), Some(1));
        assert_eq!(session.state(), SessionState::CapabilityExchange);

        session.build_get_parameter().unwrap();
        assert_eq!(session.state(), SessionState::CapabilityNegotiation);

        session.build_set_parameter_trigger("00 00").unwrap();
        assert_eq!(session.state(), SessionState::SessionSetup);

        session.handle_request(&req("SETUP", 2)).unwrap();
        assert_eq!(session.state(), SessionState::SessionReady);
        assert!(session.rtp_port().unwrap() % 2 == 0);
    }

    #[test]
    fn play_only_valid_from_ready_or_paused() {
        let mut session = Session::new();
        let err = session.handle_request(&req("PLAY", 1)).unwrap_err();
        assert!(matches!(err, RtspError::InvalidState));
    }

    #[test]
    fn idr_only_valid_while_playing() {
        let mut session = Session::new();
        assert!(session.request_idr().is_err());
        session.state = SessionState::Playing;
        assert!(session.request_idr().is_ok());
    }

    #[test]
    fn pause_then_play_resumes_playing() {
        let mut session = Session::new();
        session.state = SessionState::Playing;
        session.handle_request(&req("PAUSE", 10)).unwrap();
        assert_eq!(session.state(), SessionState::Paused);
        session.handle_request(&req("PLAY", 11)).unwrap();
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn teardown_closes_from_any_state() {
        let mut session = Session::new();
        session.state = SessionState::Playing;
        session.handle_request(&req("TEARDOWN", 5)).unwrap();
        assert!(session.is_closed());
    }

    #[test]
    fn timeout_closes_session() {
        let mut session = Session::new();
        session.state = SessionState::CapabilityNegotiation;
        session.on_timeout();
        assert!(session.is_closed());
    }

    #[test]
    fn cseq_collision_with_peer_initial_doubles_local_counter() {
        let mut session = Session::new();
        session.on_accepted();
        session.handle_request(&req("OPTIONS", 1)).unwrap();
        // peer's initial CSeq was 1; our own counter would also start at 1.
        let get_param = session.build_get_parameter().unwrap();
        assert_eq!(get_param.cseq(), Some(2));
    }
}
