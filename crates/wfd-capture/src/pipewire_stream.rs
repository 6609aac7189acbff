//! `PipeWire` video stream handler.
//!
//! Runs a dedicated OS thread with its own `PipeWire` main loop (same shape
//! as the teacher's `audio_stream.rs`), negotiates a BGRx video format, and
//! forwards frames to the capture worker over a bounded channel.
//!
//! Per buffer we try the zero-copy path first: if the dequeued buffer's
//! backing memory is a DMA-BUF we hand the fd through as
//! [`FramePayload::Native`]. If it is shared memory (`MemPtr`/`MemFd`) —
//! which is what most compositors hand back for `CursorMode::Metadata`
//! captures — we copy the rows into an owned `Vec<u8>`. This is the
//! "attempt zero-copy, fall back on failure" policy from spec §9; the
//! failure predicate is simply "the buffer wasn't a DMA-BUF".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;

use pipewire as pw;
use pw::properties::properties;
use pw::stream::{Stream, StreamFlags};

use crate::error::CaptureError;
use crate::frame::{Frame, FramePayload, PixelFormat};

/// Handle to a running `PipeWire` video capture stream. Dropping it stops
/// the capture thread.
pub struct PwCaptureHandle {
    running: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl PwCaptureHandle {
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    /// Spawn the capture thread for the given node, returning the handle
    /// and the frame receiver.
    pub fn spawn(
        node_id: u32,
        fd: std::os::fd::OwnedFd,
        width: u32,
        height: u32,
        channel_capacity: usize,
    ) -> Result<(Self, std_mpsc::Receiver<Frame>), CaptureError> {
        let (tx, rx) = std_mpsc::sync_channel(channel_capacity);
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        let thread = std::thread::Builder::new()
            .name("pw-video".into())
            .spawn(move || {
                if let Err(e) = run_video_loop(node_id, fd, width, height, tx, running_clone) {
                    tracing::error!("PipeWire video thread exited with error: {e}");
                }
            })
            .map_err(CaptureError::SpawnThread)?;

        Ok((
            Self {
                running,
                thread: Some(thread),
            },
            rx,
        ))
    }
}

impl Drop for PwCaptureHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_video_loop(
    node_id: u32,
    fd: std::os::fd::OwnedFd,
    width: u32,
    height: u32,
    frame_tx: std_mpsc::SyncSender<Frame>,
    running: Arc<AtomicBool>,
) -> Result<(), CaptureError> {
    pw::init();

    let mainloop = pw::main_loop::MainLoop::new(None).map_err(|_| CaptureError::MainLoop)?;
    let context = pw::context::Context::new(&mainloop).map_err(|_| CaptureError::Context)?;
    let core = context
        .connect_fd(fd, None)
        .map_err(|_| CaptureError::Connect)?;

    let stream = Stream::new(
        &core,
        "aethercast-video",
        properties! {
            *pw::keys::MEDIA_TYPE => "Video",
            *pw::keys::MEDIA_CATEGORY => "Capture",
            *pw::keys::MEDIA_ROLE => "Screen",
        },
    )
    .map_err(|_| CaptureError::CreateStream)?;

    let sequence = Arc::new(std::sync::atomic::AtomicU64::new(0));
    let seq_clone = Arc::clone(&sequence);

    let _listener = stream
        .add_local_listener_with_user_data(frame_tx)
        .state_changed(|_stream, _tx, old, new| {
            tracing::debug!("PipeWire video stream state: {old:?} -> {new:?}");
        })
        .process(move |stream_ref, tx| {
            process_video_buffer(stream_ref, tx, &seq_clone, width, height);
        })
        .register()
        .map_err(|_| CaptureError::CreateStream)?;

    let video_info = pw::spa::param::video::VideoInfoRaw::new();
    let values: Vec<u8> = pw::spa::pod::serialize::PodSerializer::serialize(
        std::io::Cursor::new(Vec::new()),
        &pw::spa::pod::Value::Object(pw::spa::pod::Object {
            type_: pw::spa::utils::SpaTypes::ObjectParamFormat.as_raw(),
            id: pw::spa::param::ParamType::EnumFormat.as_raw(),
            properties: video_info.into(),
        }),
    )
    .map_err(|_| CaptureError::CreateStream)?
    .0
    .into_inner();

    let mut params = [pw::spa::pod::Pod::from_bytes(&values).expect("valid pod")];

    stream
        .connect(
            pw::spa::utils::Direction::Input,
            Some(node_id),
            StreamFlags::AUTOCONNECT | StreamFlags::MAP_BUFFERS,
            &mut params,
        )
        .map_err(|_| CaptureError::StreamConnect)?;

    tracing::info!(node_id, width, height, "PipeWire video stream connected");

    while running.load(Ordering::SeqCst) {
        mainloop.loop_().iterate(std::time::Duration::from_millis(20));
    }

    tracing::info!("PipeWire video main loop exiting");
    Ok(())
}

fn process_video_buffer(
    stream: &pw::stream::StreamRef,
    tx: &mut std_mpsc::SyncSender<Frame>,
    sequence: &std::sync::atomic::AtomicU64,
    width: u32,
    height: u32,
) {
    let Some(mut buffer) = stream.dequeue_buffer() else {
        return;
    };

    let datas = buffer.datas_mut();
    if datas.is_empty() {
        return;
    }

    let data = &mut datas[0];
    let chunk = data.chunk();
    let stride = if chunk.stride() > 0 {
        chunk.stride() as u32
    } else {
        width * PixelFormat::Bgrx.bytes_per_pixel() as u32
    };
    let size = chunk.size() as usize;
    if size == 0 {
        return;
    }

    let is_dmabuf = matches!(data.type_(), pw::spa::buffer::DataType::DmaBuf);

    let payload = if is_dmabuf {
        // Zero-copy path: hand the fd through as an opaque native handle;
        // the encoder is responsible for importing it.
        let Some(fd) = data.fd() else {
            return;
        };
        FramePayload::Native(fd as u64)
    } else {
        // Fallback: shared memory buffer, copy the rows out.
        let Some(slice) = data.data() else {
            return;
        };
        if size > slice.len() {
            return;
        }
        FramePayload::Bytes(slice[..size].to_vec())
    };

    sequence.fetch_add(1, Ordering::Relaxed);
    let frame = Frame {
        format: PixelFormat::Bgrx,
        width,
        height,
        stride,
        timestamp_us: now_us(),
        payload,
        on_complete: None,
    };
    if tx.try_send(frame).is_err() {
        tracing::trace!("video channel full, dropping frame");
    }
}

fn now_us() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}
