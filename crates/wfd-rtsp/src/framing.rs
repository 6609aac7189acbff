//! Line-buffered RTSP framing over an async byte stream (spec §4.8).
//!
//! Copes with byte-level fragmentation: accumulates bytes until a
//! `\r\n\r\n` delimits the header block, then reads exactly
//! `Content-Length` more bytes for the body.

use std::env;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::RtspError;
use crate::message::RtspMessage;

const MAX_BODY_LEN: usize = 64 * 1024;
const HEADER_DELIM: &[u8] = b"\r\n\r\n";

fn debug_enabled() -> bool {
    env::var_os("AETHERCAST_RTSP_DEBUG").is_some()
}

/// Reads complete `RtspMessage`s off an async stream, reassembling them
/// across however many reads the transport happens to deliver them in.
pub struct RtspReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> RtspReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
        }
    }

    /// Reads and returns the next complete message, blocking (in the
    /// async sense) until enough bytes have arrived.
    pub async fn read_message(&mut self) -> Result<RtspMessage, RtspError> {
        let header_end = loop {
            if let Some(pos) = find_subslice(&self.buf, HEADER_DELIM) {
                break pos;
            }
            self.fill().await?;
        };

        let head_bytes = self.buf[..header_end].to_vec();
        let head = std::str::from_utf8(&head_bytes).map_err(|_| RtspError::Malformed)?;
        let mut message = RtspMessage::parse_head(head)?;

        let body_len = message.content_length();
        if body_len > MAX_BODY_LEN {
            return Err(RtspError::BodyTooLarge);
        }

        let body_start = header_end + HEADER_DELIM.len();
        while self.buf.len() < body_start + body_len {
            self.fill().await?;
        }

        message.body = self.buf[body_start..body_start + body_len].to_vec();
        self.buf.drain(..body_start + body_len);

        if debug_enabled() {
            tracing::debug!(target: "wfd_rtsp::wire", "<< {}", String::from_utf8_lossy(&message.to_bytes()));
        }

        Ok(message)
    }

    async fn fill(&mut self) -> Result<(), RtspError> {
        let mut chunk = [0_u8; 4096];
        let n = self.inner.read(&mut chunk).await?;
        if n == 0 {
            return Err(RtspError::ConnectionClosed);
        }
        self.buf.extend_from_slice(&chunk[..n]);
        Ok(())
    }
}

/// Serializes and writes `RtspMessage`s to an async stream.
pub struct RtspWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> RtspWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub async fn write_message(&mut self, message: &RtspMessage) -> Result<(), RtspError> {
        let bytes = message.to_bytes();
        if debug_enabled() {
            tracing::debug!(target: "wfd_rtsp::wire", ">> {}", String::from_utf8_lossy(&bytes));
        }
        self.inner.write_all(&bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn reads_message_delivered_in_one_chunk() {
        let (client, server) = duplex(4096);
        let mut writer_side = server;
        let mut reader = RtspReader::new(client);

        let msg = RtspMessage::request("OPTIONS", "*", 1).with_header("Require", "org.wfa.wfd1.0");
        writer_side.write_all(&msg.to_bytes()).await.unwrap();

        let parsed = reader.read_message().await.unwrap();
        assert_eq!(parsed.cseq(), Some(1));
    }

    #[tokio::test]
    async fn reassembles_message_split_across_many_writes() {
        let (client, mut server) = duplex(4096);
        let mut reader = RtspReader::new(client);

        let msg = RtspMessage::request("SET_PARAMETER", "rtsp://x/wfd1.0", 3)
            .with_body(b"wfd_video_formats: 00".to_vec());
        let bytes = msg.to_bytes();

        let write_task = tokio::spawn(async move {
            for byte in bytes {
                server.write_all(&[byte]).await.unwrap();
            }
        });

        let parsed = reader.read_message().await.unwrap();
        assert_eq!(parsed.cseq(), Some(3));
        assert_eq!(parsed.body, b"wfd_video_formats: 00");
        write_task.await.unwrap();
    }

    #[tokio::test]
    async fn closed_stream_before_header_end_is_connection_closed() {
        let (client, server) = duplex(4096);
        drop(server);
        let mut reader = RtspReader::new(client);
        let err = reader.read_message().await.unwrap_err();
        assert!(matches!(err, RtspError::ConnectionClosed));
    }

    #[tokio::test]
    async fn round_trip_write_then_read() {
        let (client, server) = duplex(4096);
        let mut writer = RtspWriter::new(server);
        let mut reader = RtspReader::new(client);

        let msg = RtspMessage::response(200, "OK", 5);
        writer.write_message(&msg).await.unwrap();
        let parsed = reader.read_message().await.unwrap();
        assert_eq!(parsed.cseq(), Some(5));
    }
}
