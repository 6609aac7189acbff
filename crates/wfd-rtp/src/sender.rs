//! The RTP Sender (spec §4.4, component C4): wraps TS runs into RTP/MP2T
//! datagrams, sequences and timestamps them, and drives the UDP socket.
//!
//! Grounded directly on the reference sender's socket setup (256 KiB
//! `SO_SNDBUF`, non-blocking, bind-then-connect) and its transient-retry
//! table; `socket2` stands in for the raw `setsockopt` calls `std::net`
//! doesn't expose.

use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use socket2::{Domain, Socket, Type};

use wfd_core::wire::{RTP_PORT_RANGE_END, RTP_PORT_RANGE_START, TS_PACKET_LEN};
use wfd_core::{BufferQueue, SharedReporter};

use crate::datagram::{build_datagrams, stamp_send_timestamp, RtpDatagram};
use crate::error::RtpError;
use crate::port::pick_random_rtp_port;

const UDP_TX_BUFFER_SIZE: usize = 256 * 1024;
const TRANSIENT_ERRNOS: [i32; 6] = [
    111, // ECONNREFUSED
    92,  // ENOPROTOOPT
    71,  // EPROTO
    113, // EHOSTUNREACH
    101, // ENETUNREACH
    100, // ENETDOWN
];

pub type RemoteClosedCallback = Box<dyn FnMut() + Send>;

pub struct RtpSender {
    socket: Option<UdpSocket>,
    local_port: u16,
    sequence: u16,
    queue: Arc<BufferQueue<RtpDatagram>>,
    bytes_sent_window: u64,
    last_report_at: Option<Instant>,
    reporter: SharedReporter,
    on_remote_closed: Option<RemoteClosedCallback>,
}

impl RtpSender {
    #[must_use]
    pub fn new(reporter: SharedReporter) -> Self {
        Self {
            socket: None,
            local_port: 0,
            sequence: 0,
            queue: Arc::new(BufferQueue::unbounded()),
            bytes_sent_window: 0,
            last_report_at: None,
            reporter,
            on_remote_closed: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        "rtp-sender"
    }

    pub fn set_on_remote_closed(&mut self, cb: RemoteClosedCallback) {
        self.on_remote_closed = Some(cb);
    }

    /// Binds the local port already advertised to the sink during `SETUP`
    /// (or, if `preferred_port` is 0, an even port chosen uniformly at
    /// random in `[1024, 65534)`), tunes `SO_SNDBUF`, and connects to the
    /// sink.
    pub fn start(
        &mut self,
        remote: IpAddr,
        remote_port: u16,
        preferred_port: u16,
    ) -> Result<(), RtpError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, None).map_err(RtpError::Socket)?;
        socket
            .set_send_buffer_size(UDP_TX_BUFFER_SIZE)
            .map_err(RtpError::Socket)?;
        socket.set_nonblocking(true).map_err(RtpError::Socket)?;

        let mut local_port = if preferred_port != 0 {
            preferred_port
        } else {
            pick_random_rtp_port()
        };
        let mut bound = false;
        for attempt in 0..16 {
            let addr: SocketAddr = (IpAddr::from([0, 0, 0, 0]), local_port).into();
            if socket.bind(&addr.into()).is_ok() {
                bound = true;
                break;
            }
            if attempt == 0 && preferred_port != 0 {
                tracing::warn!(preferred_port, "advertised RTP port unavailable, picking another");
            }
            local_port = pick_random_rtp_port();
        }
        if !bound {
            let addr: SocketAddr = (IpAddr::from([0, 0, 0, 0]), 0).into();
            socket.bind(&addr.into()).map_err(RtpError::Bind)?;
        }

        let remote_addr: SocketAddr = (remote, remote_port).into();
        socket.connect(&remote_addr.into()).map_err(RtpError::Connect)?;

        self.local_port = local_port_or_ephemeral(&socket, local_port);
        self.socket = Some(socket.into());
        self.sequence = 0;
        self.bytes_sent_window = 0;
        self.last_report_at = Some(Instant::now());
        Ok(())
    }

    pub fn stop(&mut self) {
        self.socket = None;
        self.queue.drain();
    }

    #[must_use]
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Splits `ts_run` into datagrams and appends them to the send queue.
    pub fn queue(&mut self, ts_run: &[u8], parent_timestamp_us: i64) -> Result<(), RtpError> {
        if ts_run.len() % TS_PACKET_LEN != 0 {
            return Err(RtpError::InvalidRunLength(ts_run.len()));
        }
        let datagrams = build_datagrams(ts_run, parent_timestamp_us, &mut self.sequence);

        if let Some(first) = datagrams.first() {
            if first.parent_timestamp_us > 0 {
                let now = now_us();
                let diff_ms = (now - first.parent_timestamp_us) / 1000;
                self.reporter.record_rtp_buffer_queued(diff_ms);
            }
        }

        for datagram in datagrams {
            self.queue.push(datagram);
        }
        Ok(())
    }

    /// One iteration of the send worker: wait for work, drain the queue
    /// under lock, send each datagram. Returns `false` if the remote has
    /// closed the connection and the worker should stop.
    pub fn execute(&mut self) -> bool {
        let batch = self.queue.drain_wait_timeout(Duration::from_millis(50));

        let Some(socket) = self.socket.as_ref() else {
            return true;
        };

        for mut datagram in batch {
            stamp_send_timestamp(&mut datagram.bytes, now_us());

            if datagram.parent_timestamp_us > 0 {
                let now = now_us();
                let diff_ms = (now - datagram.parent_timestamp_us) / 1000;
                self.reporter.record_rtp_buffer_sent(diff_ms);
            }

            match send_with_retry(socket, &datagram.bytes) {
                Ok(0) => {
                    tracing::error!("remote has closed the RTP connection");
                    if let Some(cb) = self.on_remote_closed.as_mut() {
                        cb();
                    }
                    return false;
                }
                Ok(n) => {
                    self.bytes_sent_window += n as u64;
                }
                Err(e) => {
                    tracing::warn!("dropping RTP datagram after failed retry: {e}");
                }
            }
        }

        self.maybe_report_bandwidth();
        true
    }

    fn maybe_report_bandwidth(&mut self) {
        let Some(last) = self.last_report_at else {
            self.last_report_at = Some(Instant::now());
            return;
        };
        if last.elapsed() >= Duration::from_secs(1) {
            let mbit = (self.bytes_sent_window * 8) / 1_000_000;
            self.reporter.record_rtp_bandwidth(mbit as i64);
            self.bytes_sent_window = 0;
            self.last_report_at = Some(Instant::now());
        }
    }
}

fn send_with_retry(socket: &UdpSocket, bytes: &[u8]) -> std::io::Result<usize> {
    match socket.send(bytes) {
        Ok(n) => Ok(n),
        Err(e) if is_transient(&e) => {
            tracing::debug!("retrying send due to a possibly congested socket");
            socket.send(bytes)
        }
        Err(e) => Err(e),
    }
}

fn is_transient(e: &std::io::Error) -> bool {
    e.raw_os_error()
        .map(|code| TRANSIENT_ERRNOS.contains(&code))
        .unwrap_or(false)
}

fn local_port_or_ephemeral(socket: &Socket, requested: u16) -> u16 {
    socket
        .local_addr()
        .ok()
        .and_then(|a| a.as_socket())
        .map(|a| a.port())
        .unwrap_or(requested)
}

fn now_us() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfd_core::NullReporter;

    #[test]
    fn fresh_sender_has_no_local_port() {
        let sender = RtpSender::new(Arc::new(NullReporter));
        assert_eq!(sender.local_port(), 0);
    }

    #[test]
    fn queue_rejects_misaligned_run() {
        let mut sender = RtpSender::new(Arc::new(NullReporter));
        assert!(matches!(
            sender.queue(&[0u8; 189], 0),
            Err(RtpError::InvalidRunLength(189))
        ));
    }

    #[test]
    fn name_is_stable() {
        let sender = RtpSender::new(Arc::new(NullReporter));
        assert_eq!(sender.name(), "rtp-sender");
    }

    #[test]
    fn picked_ports_stay_in_configured_range() {
        for _ in 0..100 {
            let port = pick_random_rtp_port();
            assert!(port >= RTP_PORT_RANGE_START && port < RTP_PORT_RANGE_END);
        }
    }
}
