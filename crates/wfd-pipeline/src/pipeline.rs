//! `Pipeline` (spec §3 "Pipeline"): owns a Frame Source, Encoder,
//! Packetizer and RTP Sender, and the three worker bindings that drive
//! them.

use std::sync::{Arc, Mutex};

use wfd_capture::{FrameSource, OutputModeRequest};
use wfd_core::wire::CAPTURE_QUEUE_CAPACITY;
use wfd_core::BufferQueue;
use wfd_encode::Encoder;
use wfd_mux::Packetizer;
use wfd_rtp::RtpSender;

use crate::error::PipelineError;
use crate::media_sender;
use crate::scheduler::Scheduler;
use crate::stages::{CaptureStage, EncodeStage, SendStage};

pub struct Pipeline {
    scheduler: Scheduler,
}

impl Pipeline {
    /// Assembles the three stages and wires the encoder's event
    /// interface through a fresh [`Packetizer`] into `sender`. `sender`
    /// must already have `start()` called on it by the caller (the
    /// control plane knows the remote address; this crate doesn't).
    pub fn build(
        source: Box<dyn FrameSource>,
        mut encoder: Box<dyn Encoder>,
        sender: Arc<Mutex<RtpSender>>,
        request: OutputModeRequest,
    ) -> Self {
        let capture_queue = Arc::new(BufferQueue::bounded(CAPTURE_QUEUE_CAPACITY));
        let packetizer = Arc::new(Mutex::new(Packetizer::new()));

        media_sender::wire(encoder.as_mut(), Arc::clone(&packetizer), Arc::clone(&sender));

        let mut scheduler = Scheduler::new();
        scheduler.add(Box::new(CaptureStage::new(
            source,
            Arc::clone(&capture_queue),
            request,
        )));
        scheduler.add(Box::new(EncodeStage::new(capture_queue, encoder)));
        scheduler.add(Box::new(SendStage::new(sender)));

        Self { scheduler }
    }

    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.scheduler.running() {
            return Err(PipelineError::AlreadyRunning);
        }
        if self.scheduler.start() {
            Ok(())
        } else {
            Err(PipelineError::StartFailed)
        }
    }

    pub fn stop(&mut self) -> Result<(), PipelineError> {
        if !self.scheduler.running() {
            return Err(PipelineError::NotRunning);
        }
        if self.scheduler.stop() {
            Ok(())
        } else {
            Err(PipelineError::StartFailed)
        }
    }

    #[must_use]
    pub fn running(&self) -> bool {
        self.scheduler.running()
    }

    /// `false` once any stage has stopped itself (capture source error,
    /// encoder stall); the caller should tear the session down.
    #[must_use]
    pub fn healthy(&self) -> bool {
        self.scheduler.healthy()
    }
}
