//! H.264 encoding pipeline via GStreamer: `appsrc ! videoconvert !
//! x264enc ! h264parse ! appsink`.
//!
//! `config-interval=-1` on `h264parse` makes it re-emit SPS/PPS ahead of
//! every IDR, which lines up with the "once per start, once per forced
//! IDR" contract: we force an IDR with a force-key-unit event and split
//! the resulting access unit's config NALs out in [`crate::nal`].

use std::sync::{Arc, Mutex};

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::{AppSink, AppSinkCallbacks, AppSrc};
use gstreamer_video::UpstreamForceKeyUnitEvent;

use wfd_capture::{Frame, FramePayload};

use crate::config::EncoderConfig;
use crate::encoder::{BufferAvailableCallback, BufferReturnedCallback, Encoder};
use crate::error::EncodeError;
use crate::nal::split_codec_config;
use crate::unit::EncodedUnit;

struct Callbacks {
    on_buffer_available: Option<BufferAvailableCallback>,
    on_buffer_with_codec_config: Option<BufferAvailableCallback>,
    on_buffer_returned: Option<BufferReturnedCallback>,
}

impl Default for Callbacks {
    fn default() -> Self {
        Self {
            on_buffer_available: None,
            on_buffer_with_codec_config: None,
            on_buffer_returned: None,
        }
    }
}

/// GStreamer-backed software H.264 encoder.
pub struct GstEncoder {
    config: Option<EncoderConfig>,
    pipeline: Option<gst::Pipeline>,
    appsrc: Option<AppSrc>,
    callbacks: Arc<Mutex<Callbacks>>,
    force_idr: Arc<std::sync::atomic::AtomicBool>,
}

impl GstEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            pipeline: None,
            appsrc: None,
            callbacks: Arc::new(Mutex::new(Callbacks::default())),
            force_idr: Arc::new(std::sync::atomic::AtomicBool::new(true)),
        }
    }

    fn build_pipeline(cfg: &EncoderConfig) -> Result<(gst::Pipeline, AppSrc, AppSink), EncodeError> {
        let src_caps = format!(
            "video/x-raw,format=BGRA,width={},height={},framerate={}/1",
            cfg.width, cfg.height, cfg.framerate
        );
        let description = format!(
            "appsrc name=src is-live=true format=time caps={src_caps} ! \
             videoconvert ! \
             x264enc name=enc tune=zerolatency speed-preset=ultrafast \
                 bitrate={} key-int-max={} ! \
             video/x-h264,profile={},stream-format=byte-stream,alignment=au ! \
             h264parse config-interval=-1 ! \
             appsink name=sink emit-signals=false sync=false",
            cfg.bitrate_bps / 1000,
            cfg.idr_interval_frames,
            match cfg.profile {
                crate::config::H264Profile::ConstrainedBaseline => "constrained-baseline",
                crate::config::H264Profile::ConstrainedHigh => "high",
            },
        );

        let pipeline = gst::parse::launch(&description)
            .map_err(|_| EncodeError::PipelineBuild)?
            .downcast::<gst::Pipeline>()
            .map_err(|_| EncodeError::PipelineBuild)?;

        let appsrc = pipeline
            .by_name("src")
            .and_then(|e| e.downcast::<AppSrc>().ok())
            .ok_or(EncodeError::PipelineBuild)?;
        let appsink = pipeline
            .by_name("sink")
            .and_then(|e| e.downcast::<AppSink>().ok())
            .ok_or(EncodeError::PipelineBuild)?;

        Ok((pipeline, appsrc, appsink))
    }
}

impl Default for GstEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for GstEncoder {
    fn default_configuration(&self, width: u32, height: u32) -> EncoderConfig {
        EncoderConfig::default_for(width, height)
    }

    fn configure(&mut self, cfg: EncoderConfig) -> Result<(), EncodeError> {
        if self.pipeline.is_some() {
            return Err(EncodeError::AlreadyConfigured);
        }
        if !cfg.is_valid() {
            return Err(EncodeError::InvalidConfiguration(cfg));
        }

        let (pipeline, appsrc, appsink) = Self::build_pipeline(&cfg)?;

        let callbacks = Arc::clone(&self.callbacks);
        appsink.set_callbacks(
            AppSinkCallbacks::builder()
                .new_sample(move |sink| {
                    let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;
                    let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;
                    let timestamp_us = buffer
                        .pts()
                        .map(|pts| pts.useconds() as i64)
                        .unwrap_or(0);

                    let (config_bytes, frame_bytes) = split_codec_config(&map);
                    let mut cb = callbacks.lock().expect("callbacks mutex poisoned");
                    if !config_bytes.is_empty() {
                        if let Some(f) = cb.on_buffer_with_codec_config.as_mut() {
                            f(EncodedUnit::codec_config(config_bytes, timestamp_us));
                        }
                    }
                    if !frame_bytes.is_empty() {
                        if let Some(f) = cb.on_buffer_available.as_mut() {
                            f(EncodedUnit::frame(frame_bytes, timestamp_us));
                        }
                    }
                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );

        pipeline
            .set_state(gst::State::Playing)
            .map_err(|_| EncodeError::PipelineStart)?;

        self.pipeline = Some(pipeline);
        self.appsrc = Some(appsrc);
        self.config = Some(cfg);
        self.force_idr
            .store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn queue_buffer(&mut self, frame: Frame) -> Result<(), EncodeError> {
        let appsrc = self.appsrc.as_ref().ok_or(EncodeError::NotConfigured)?;

        let data: Vec<u8> = match &frame.payload {
            FramePayload::Bytes(b) => b.clone(),
            FramePayload::Native(_) => {
                tracing::warn!("native buffer import not wired up; dropping frame");
                return Ok(());
            }
        };

        let mut buffer = gst::Buffer::from_slice(data);
        {
            let buffer_mut = buffer.get_mut().ok_or(EncodeError::PushBuffer)?;
            buffer_mut.set_pts(gst::ClockTime::from_useconds(
                frame.timestamp_us.max(0) as u64,
            ));
        }

        if self.force_idr.swap(false, std::sync::atomic::Ordering::SeqCst) {
            let event = UpstreamForceKeyUnitEvent::builder().all_headers(true).build();
            appsrc.send_event(event);
        }

        appsrc
            .push_buffer(buffer)
            .map_err(|_| EncodeError::PushBuffer)?;

        let mut cb = self.callbacks.lock().expect("callbacks mutex poisoned");
        if let Some(f) = cb.on_buffer_returned.as_mut() {
            f();
        }
        Ok(())
    }

    fn send_idr_frame(&mut self) -> Result<(), EncodeError> {
        if self.pipeline.is_none() {
            return Err(EncodeError::NotConfigured);
        }
        self.force_idr
            .store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn configuration(&self) -> Option<EncoderConfig> {
        self.config
    }

    fn running(&self) -> bool {
        self.pipeline
            .as_ref()
            .map(|p| p.current_state() == gst::State::Playing)
            .unwrap_or(false)
    }

    fn set_on_buffer_available(&mut self, cb: BufferAvailableCallback) {
        self.callbacks
            .lock()
            .expect("callbacks mutex poisoned")
            .on_buffer_available = Some(cb);
    }

    fn set_on_buffer_with_codec_config(&mut self, cb: BufferAvailableCallback) {
        self.callbacks
            .lock()
            .expect("callbacks mutex poisoned")
            .on_buffer_with_codec_config = Some(cb);
    }

    fn set_on_buffer_returned(&mut self, cb: BufferReturnedCallback) {
        self.callbacks
            .lock()
            .expect("callbacks mutex poisoned")
            .on_buffer_returned = Some(cb);
    }
}

impl Drop for GstEncoder {
    fn drop(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            let _ = pipeline.set_state(gst::State::Null);
        }
    }
}
