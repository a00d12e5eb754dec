//! Live stream decode sessions.
//!
//! A [`StreamSource`] opens one [`DecodeSession`] per camera cycle. The
//! GStreamer implementation plays the HLS manifest through `uridecodebin`
//! and scales decoded video down to the motion frame size, so a poll only
//! ever copies an 80×45 RGB buffer.

use std::sync::OnceLock;

use citycam_common::error::{CitycamError, CitycamResult};
use citycam_geo_model::CameraId;
use citycam_motion_core::frame::{FRAME_HEIGHT, FRAME_WIDTH};
use citycam_motion_core::FrameSample;
use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;

/// Elements the GStreamer source needs at runtime.
pub const REQUIRED_ELEMENTS: [&str; 5] = [
    "uridecodebin",
    "videoconvert",
    "videoscale",
    "appsink",
    "hlsdemux",
];

/// Where a camera's live stream can be played from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndpoint {
    pub camera_id: CameraId,
    pub stream_id: String,
    pub manifest_url: String,
}

impl StreamEndpoint {
    /// Manifest at `{base}/l/{stream_id}/master.m3u8`.
    pub fn resolve(base_url: &str, camera_id: CameraId, stream_id: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            camera_id,
            stream_id: stream_id.to_string(),
            manifest_url: format!("{base}/l/{stream_id}/master.m3u8"),
        }
    }
}

/// One attached live stream.
pub trait DecodeSession: Send {
    /// The most recent displayable frame, without blocking.
    ///
    /// `Ok(None)` means the stream has not produced a frame yet. Errors are
    /// terminal for the session.
    fn poll_frame(&mut self) -> CitycamResult<Option<FrameSample>>;

    /// Stop playback and release network and decoder resources.
    fn close(&mut self) -> CitycamResult<()>;

    fn is_open(&self) -> bool;
}

/// Opens decode sessions for stream endpoints.
pub trait StreamSource: Send {
    fn open(&mut self, endpoint: &StreamEndpoint) -> CitycamResult<Box<dyn DecodeSession>>;
}

/// [`StreamSource`] backed by GStreamer.
#[derive(Debug, Default, Clone, Copy)]
pub struct GstStreamSource;

impl GstStreamSource {
    pub fn new() -> CitycamResult<Self> {
        init_gstreamer()?;
        Ok(Self)
    }
}

impl StreamSource for GstStreamSource {
    fn open(&mut self, endpoint: &StreamEndpoint) -> CitycamResult<Box<dyn DecodeSession>> {
        let launch = build_decode_launch(&endpoint.manifest_url);
        tracing::debug!(camera = endpoint.camera_id, url = %endpoint.manifest_url, "Opening stream");
        let mut session =
            GstDecodeSession::from_launch(format!("camera-{}", endpoint.camera_id), &launch)?;
        session.start()?;
        Ok(Box::new(session))
    }
}

/// Launch description for one muted, downscaled HLS playback.
pub fn build_decode_launch(manifest_url: &str) -> String {
    format!(
        "uridecodebin uri=\"{manifest_url}\" expose-all-streams=false caps=video/x-raw \
         ! videoconvert ! videoscale \
         ! video/x-raw,format=RGB,width={FRAME_WIDTH},height={FRAME_HEIGHT},pixel-aspect-ratio=1/1 \
         ! appsink name=frames max-buffers=1 drop=true sync=false"
    )
}

/// A launched pipeline ending in an appsink named `frames`.
///
/// Shared by the motion decode session and the live preview. Dropping it
/// stops playback.
pub(crate) struct SinkPipeline {
    name: String,
    pipeline: gst::Pipeline,
    sink: gst_app::AppSink,
    open: bool,
}

impl SinkPipeline {
    pub(crate) fn from_launch(name: impl Into<String>, launch: &str) -> CitycamResult<Self> {
        init_gstreamer()?;

        let element = gst::parse::launch(launch)
            .map_err(|e| CitycamError::stream(format!("Failed to build pipeline: {e}")))?;
        let pipeline = element
            .dynamic_cast::<gst::Pipeline>()
            .map_err(|_| CitycamError::stream("Launch string did not produce a pipeline"))?;
        let sink = pipeline
            .by_name("frames")
            .ok_or_else(|| CitycamError::stream("Pipeline has no frames sink"))?
            .dynamic_cast::<gst_app::AppSink>()
            .map_err(|_| CitycamError::stream("frames element is not an appsink"))?;

        Ok(Self {
            name: name.into(),
            pipeline,
            sink,
            open: false,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open
    }

    /// Begin playback. Returns once the state change is requested; live
    /// sources reach Playing asynchronously.
    pub(crate) fn start(&mut self) -> CitycamResult<()> {
        self.pipeline.set_state(gst::State::Playing).map_err(|e| {
            CitycamError::stream(format!("Failed to start {} pipeline: {e:?}", self.name))
        })?;
        self.open = true;
        Ok(())
    }

    fn check_bus(&self) -> CitycamResult<()> {
        let Some(bus) = self.pipeline.bus() else {
            return Ok(());
        };
        while let Some(msg) =
            bus.pop_filtered(&[gst::MessageType::Error, gst::MessageType::Eos])
        {
            match msg.view() {
                gst::MessageView::Error(e) => {
                    return Err(CitycamError::decode(format!(
                        "{}: {} ({:?})",
                        self.name,
                        e.error(),
                        e.debug()
                    )));
                }
                gst::MessageView::Eos(_) => {
                    return Err(CitycamError::decode(format!(
                        "{}: stream ended",
                        self.name
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Newest sample queued at the sink since the last pull, without blocking.
    pub(crate) fn pull_latest(&self) -> CitycamResult<Option<gst::Sample>> {
        if !self.open {
            return Err(CitycamError::decode(format!("{} is closed", self.name)));
        }
        self.check_bus()?;
        let mut latest = None;
        while let Some(sample) = self.sink.try_pull_sample(gst::ClockTime::ZERO) {
            latest = Some(sample);
        }
        Ok(latest)
    }

    pub(crate) fn stop(&mut self) -> CitycamResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.pipeline.set_state(gst::State::Null).map_err(|e| {
            CitycamError::stream(format!("Failed to stop {} pipeline: {e:?}", self.name))
        })?;
        tracing::debug!(pipeline = %self.name, "Stream closed");
        Ok(())
    }
}

impl Drop for SinkPipeline {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(pipeline = %self.name, error = %e, "Failed to close stream on drop");
        }
    }
}

/// Motion decode session: keeps the newest 80×45 sample.
pub struct GstDecodeSession {
    inner: SinkPipeline,
    latest: Option<FrameSample>,
}

impl GstDecodeSession {
    pub fn from_launch(name: impl Into<String>, launch: &str) -> CitycamResult<Self> {
        Ok(Self {
            inner: SinkPipeline::from_launch(name, launch)?,
            latest: None,
        })
    }

    pub fn start(&mut self) -> CitycamResult<()> {
        self.inner.start()
    }
}

impl DecodeSession for GstDecodeSession {
    fn poll_frame(&mut self) -> CitycamResult<Option<FrameSample>> {
        if let Some(frame) = self.inner.pull_latest()?.and_then(|s| frame_from_sample(&s)) {
            self.latest = Some(frame);
        }
        Ok(self.latest.clone())
    }

    fn close(&mut self) -> CitycamResult<()> {
        self.latest = None;
        self.inner.stop()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}

fn frame_from_sample(sample: &gst::SampleRef) -> Option<FrameSample> {
    let buffer = sample.buffer()?;
    let map = buffer.map_readable().ok()?;
    let data = map.as_slice();
    // Row padding depends on the converter; derive stride from buffer size.
    let stride = data.len() / FRAME_HEIGHT;
    FrameSample::from_strided(data, stride)
}

/// Initialise GStreamer once per process.
pub fn init_gstreamer() -> CitycamResult<()> {
    static GST_INIT: OnceLock<Result<(), String>> = OnceLock::new();
    let init_res = GST_INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()));
    match init_res {
        Ok(()) => Ok(()),
        Err(e) => Err(CitycamError::stream(format!(
            "Failed to initialize GStreamer: {e}"
        ))),
    }
}

/// Required elements that are not installed.
pub fn missing_elements() -> CitycamResult<Vec<&'static str>> {
    init_gstreamer()?;
    Ok(REQUIRED_ELEMENTS
        .iter()
        .copied()
        .filter(|name| gst::ElementFactory::find(name).is_none())
        .collect())
}
