//! Concrete `Executable`s for the three streaming-pipeline stages.

use std::sync::Arc;
use std::time::{Duration, Instant};

use wfd_capture::{Frame, FrameSource, OutputModeRequest};
use wfd_core::BufferQueue;
use wfd_encode::Encoder;
use wfd_rtp::RtpSender;

use crate::worker::Executable;

/// C1 bound to a worker: swaps buffers at the configured framerate and
/// pushes the resulting frame into the capture→encode queue.
pub struct CaptureStage {
    source: Box<dyn FrameSource>,
    queue: Arc<BufferQueue<Frame>>,
    request: OutputModeRequest,
    framerate: u32,
}

impl CaptureStage {
    #[must_use]
    pub fn new(
        source: Box<dyn FrameSource>,
        queue: Arc<BufferQueue<Frame>>,
        request: OutputModeRequest,
    ) -> Self {
        let framerate = request.refresh_rate.max(1);
        Self {
            source,
            queue,
            request,
            framerate,
        }
    }
}

impl Executable for CaptureStage {
    fn name(&self) -> &str {
        "capture"
    }

    fn start(&mut self) -> bool {
        match self.source.setup(self.request) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("capture stage failed to start: {e}");
                false
            }
        }
    }

    fn stop(&mut self) -> bool {
        self.source.teardown();
        true
    }

    fn execute(&mut self) -> bool {
        let iteration_start = Instant::now();

        if self.source.swap_buffers().is_err() {
            return false;
        }
        let Ok(frame) = self.source.current_buffer() else {
            return false;
        };

        self.queue.push(frame);

        let target = Duration::from_secs_f64(1.0 / f64::from(self.framerate));
        let actual = iteration_start.elapsed();
        if target > actual {
            std::thread::sleep(target - actual);
        }
        true
    }
}

/// C2 bound to a worker: drains the capture queue and feeds each frame
/// to the encoder. The encoder's own callbacks (registered by whoever
/// assembled the pipeline) drive the packetizer and RTP sender.
pub struct EncodeStage {
    queue: Arc<BufferQueue<Frame>>,
    encoder: Box<dyn Encoder>,
}

impl EncodeStage {
    #[must_use]
    pub fn new(queue: Arc<BufferQueue<Frame>>, encoder: Box<dyn Encoder>) -> Self {
        Self { queue, encoder }
    }
}

impl Executable for EncodeStage {
    fn name(&self) -> &str {
        "encode"
    }

    fn start(&mut self) -> bool {
        self.encoder.running()
    }

    fn stop(&mut self) -> bool {
        true
    }

    fn execute(&mut self) -> bool {
        let frame = self.queue.pop();
        if let Err(e) = self.encoder.queue_buffer(frame) {
            tracing::warn!("encoder rejected a frame: {e}");
        }
        true
    }
}

/// C4 bound to a worker: one send-loop iteration per `execute()`.
pub struct SendStage {
    sender: Arc<std::sync::Mutex<RtpSender>>,
}

impl SendStage {
    #[must_use]
    pub fn new(sender: Arc<std::sync::Mutex<RtpSender>>) -> Self {
        Self { sender }
    }
}

impl Executable for SendStage {
    fn name(&self) -> &str {
        "send"
    }

    fn start(&mut self) -> bool {
        true
    }

    fn stop(&mut self) -> bool {
        true
    }

    fn execute(&mut self) -> bool {
        self.sender.lock().expect("rtp sender mutex poisoned").execute()
    }
}
