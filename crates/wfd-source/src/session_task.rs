//! Drives one sink's Session end-to-end over its accepted TCP socket
//! (spec §4.7-§4.9): RTSP handshake, format negotiation, and arming the
//! pipeline once `PLAY` arrives.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;

use wfd_capture::{DisplayMode, FrameSource, LiveFrameSource, OutputModeRequest, SyntheticFrameSource};
use wfd_core::wire::DEFAULT_MEDIA_CONTROL_PORT;
use wfd_core::SharedReporter;
use wfd_dbus::{ConnectionState, SourceState};
use wfd_encode::{Encoder, GstEncoder};
use wfd_pipeline::Pipeline;
use wfd_rtp::RtpSender;
use wfd_rtsp::{format, RtspError, RtspReader, RtspWriter, Session};

use crate::config::SourceConfig;
use crate::negotiation::{parse_client_port, parse_sink_capability};

/// Runs the handshake and media session for one accepted connection.
/// Returns once the sink tears down, disconnects, or an unrecoverable
/// protocol error occurs; never returns `Err` for ordinary teardown.
pub async fn run<S>(
    stream: S,
    peer_addr: SocketAddr,
    config: SourceConfig,
    reporter: SharedReporter,
    dbus_state: SourceState,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = RtspReader::new(read_half);
    let mut writer = RtspWriter::new(write_half);
    let response_timeout = Duration::from_secs(config.rtsp_timeout_secs);

    let mut session = Session::new();
    session.on_accepted();
    dbus_state.set_state(ConnectionState::Connecting).await;

    // M1: sink sends OPTIONS.
    let options = read_or_timeout(&mut reader, response_timeout).await?;
    let response = session.handle_request(&options)?;
    writer.write_message(&response).await?;

    dbus_state.set_state(ConnectionState::Configuration).await;

    // M3: we send GET_PARAMETER, sink answers with its capabilities.
    let get_parameter = session.build_get_parameter()?;
    writer.write_message(&get_parameter).await?;
    let capability_response = read_or_timeout(&mut reader, response_timeout).await?;
    let body = String::from_utf8_lossy(&capability_response.body).to_string();
    let sink_capability = parse_sink_capability(&body);

    let hardware_ceiling = format::Resolution { width: 1920, height: 1080, framerate: 30 };
    let local_offers = [(
        wfd_encode::H264Profile::ConstrainedBaseline,
        wfd_encode::H264Level::MIN,
    )];
    let (profile, level, resolution) =
        format::negotiate(&sink_capability, &local_offers, hardware_ceiling)?;
    let encoder_config = format::encoder_config_for(profile, level, resolution);

    // M4/M5: SET_PARAMETER carrying the chosen format plus the SETUP trigger.
    let formats_line = format!("{}x{}@{}", resolution.width, resolution.height, resolution.framerate);
    let trigger = session.build_set_parameter_trigger(&formats_line)?;
    writer.write_message(&trigger).await?;

    dbus_state.set_state(ConnectionState::Association).await;

    // Sink answers the trigger with SETUP, carrying its RTP client_port.
    let setup = read_or_timeout(&mut reader, response_timeout).await?;
    let remote_rtp_port = setup
        .header("Transport")
        .and_then(parse_client_port)
        .unwrap_or(DEFAULT_MEDIA_CONTROL_PORT);
    let setup_response = session.handle_request(&setup)?;
    writer.write_message(&setup_response).await?;
    let local_rtp_port = session.rtp_port().unwrap_or(0);

    let media_failed = Arc::new(AtomicBool::new(false));
    let media_failed_cb = Arc::clone(&media_failed);

    let sender = Arc::new(Mutex::new(RtpSender::new(Arc::clone(&reporter))));
    sender
        .lock()
        .unwrap()
        .set_on_remote_closed(Box::new(move || {
            media_failed_cb.store(true, Ordering::SeqCst);
        }));
    sender
        .lock()
        .unwrap()
        .start(peer_addr.ip(), remote_rtp_port, local_rtp_port)?;

    let source: Box<dyn FrameSource> = if config.static_display {
        Box::new(SyntheticFrameSource::new())
    } else {
        Box::new(LiveFrameSource::new())
    };
    let mut encoder: Box<dyn Encoder> = Box::new(GstEncoder::new());
    encoder.configure(encoder_config)?;
    let request = OutputModeRequest {
        mode: DisplayMode::Extend,
        width: resolution.width,
        height: resolution.height,
        refresh_rate: resolution.framerate,
    };
    let mut pipeline = Pipeline::build(source, encoder, Arc::clone(&sender), request);

    // Remaining session lifetime: PLAY / PAUSE / TEARDOWN loop, racing the
    // next RTSP request against a media-plane failure (remote closed the
    // RTP socket, or a pipeline stage stopped itself).
    loop {
        let incoming = tokio::select! {
            result = read_or_timeout(&mut reader, response_timeout) => {
                match result {
                    Ok(msg) => msg,
                    Err(_) => break,
                }
            }
            () = watch_media_failure(&media_failed, &pipeline) => {
                tracing::warn!("media pipeline failed, tearing down session");
                session.on_network_error();
                break;
            }
        };

        let method = incoming.method().unwrap_or_default().to_string();
        let response = match session.handle_request(&incoming) {
            Ok(resp) => resp,
            Err(RtspError::InvalidState) => {
                tracing::warn!(%method, "rejecting request invalid for current session state");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        writer.write_message(&response).await?;

        match method.as_str() {
            "PLAY" => {
                pipeline.start().ok();
                dbus_state.set_state(ConnectionState::Connected).await;
            }
            "PAUSE" => {
                pipeline.stop().ok();
            }
            "TEARDOWN" => break,
            _ => {}
        }

        if session.is_closed() {
            break;
        }
    }

    if pipeline.running() {
        pipeline.stop().ok();
    }
    sender.lock().unwrap().stop();
    dbus_state.set_state(ConnectionState::Disconnected).await;

    Ok(())
}

/// Resolves once the RTP sender has reported the remote side closed the
/// connection, or a running pipeline stage has stopped itself (spec
/// §4.4/§7: media-plane failures surface to C7 as a network error).
async fn watch_media_failure(media_failed: &AtomicBool, pipeline: &Pipeline) {
    loop {
        if media_failed.load(Ordering::SeqCst) {
            return;
        }
        if pipeline.running() && !pipeline.healthy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

async fn read_or_timeout<R: AsyncRead + Unpin>(
    reader: &mut RtspReader<R>,
    deadline: Duration,
) -> Result<wfd_rtsp::RtspMessage, RtspError> {
    match timeout(deadline, reader.read_message()).await {
        Ok(result) => result,
        Err(_) => Err(RtspError::Timeout),
    }
}
