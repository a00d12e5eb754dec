//! Live preview of the selected camera.
//!
//! The preview is independent of the motion scheduler: it plays at most
//! one stream (the selected camera's) at display resolution, opened on
//! selection and closed on deselection or teardown.

use citycam_common::error::{CitycamError, CitycamResult};
use citycam_geo_model::{CameraId, CameraRegistry};
use gstreamer as gst;

use crate::pipeline::{init_gstreamer, SinkPipeline, StreamEndpoint};

/// Preview width in pixels.
pub const PREVIEW_WIDTH: usize = 480;

/// Preview height in pixels.
pub const PREVIEW_HEIGHT: usize = 270;

/// One packed RGBA preview frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFrame {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

impl PreviewFrame {
    /// Copy rows that are `stride` bytes apart into a packed buffer.
    pub fn from_strided(data: &[u8], width: usize, height: usize, stride: usize) -> Option<Self> {
        let row_bytes = width * 4;
        if height == 0 || stride < row_bytes || data.len() < stride * (height - 1) + row_bytes {
            return None;
        }
        let mut rgba = Vec::with_capacity(row_bytes * height);
        for row in 0..height {
            let start = row * stride;
            rgba.extend_from_slice(&data[start..start + row_bytes]);
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }
}

/// One playing preview stream.
pub trait PreviewSession: Send {
    /// A frame decoded since the last poll, without blocking.
    ///
    /// Errors are terminal for the session.
    fn poll_frame(&mut self) -> CitycamResult<Option<PreviewFrame>>;

    fn close(&mut self) -> CitycamResult<()>;

    fn is_open(&self) -> bool;
}

/// Opens preview sessions for stream endpoints.
pub trait PreviewSource: Send {
    fn open(&mut self, endpoint: &StreamEndpoint) -> CitycamResult<Box<dyn PreviewSession>>;
}

/// Launch description for a muted, real-time preview.
pub fn build_preview_launch(manifest_url: &str) -> String {
    format!(
        "uridecodebin uri=\"{manifest_url}\" expose-all-streams=false caps=video/x-raw \
         ! videoconvert ! videoscale \
         ! video/x-raw,format=RGBA,width={PREVIEW_WIDTH},height={PREVIEW_HEIGHT},pixel-aspect-ratio=1/1 \
         ! appsink name=frames max-buffers=1 drop=true sync=true"
    )
}

/// [`PreviewSource`] backed by GStreamer.
#[derive(Debug, Default, Clone, Copy)]
pub struct GstPreviewSource;

impl GstPreviewSource {
    pub fn new() -> CitycamResult<Self> {
        init_gstreamer()?;
        Ok(Self)
    }
}

impl PreviewSource for GstPreviewSource {
    fn open(&mut self, endpoint: &StreamEndpoint) -> CitycamResult<Box<dyn PreviewSession>> {
        let launch = build_preview_launch(&endpoint.manifest_url);
        let mut inner =
            SinkPipeline::from_launch(format!("preview-{}", endpoint.camera_id), &launch)?;
        inner.start()?;
        tracing::debug!(pipeline = inner.name(), url = %endpoint.manifest_url, "Preview started");
        Ok(Box::new(GstPreviewSession { inner }))
    }
}

struct GstPreviewSession {
    inner: SinkPipeline,
}

impl PreviewSession for GstPreviewSession {
    fn poll_frame(&mut self) -> CitycamResult<Option<PreviewFrame>> {
        let Some(sample) = self.inner.pull_latest()? else {
            return Ok(None);
        };
        preview_from_sample(&sample)
            .map(Some)
            .ok_or_else(|| CitycamError::decode(format!("{}: unreadable frame", self.inner.name())))
    }

    fn close(&mut self) -> CitycamResult<()> {
        self.inner.stop()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}

fn preview_from_sample(sample: &gst::SampleRef) -> Option<PreviewFrame> {
    let buffer = sample.buffer()?;
    let map = buffer.map_readable().ok()?;
    let data = map.as_slice();
    let stride = data.len() / PREVIEW_HEIGHT;
    PreviewFrame::from_strided(data, PREVIEW_WIDTH, PREVIEW_HEIGHT, stride)
}

/// What the preview is currently showing.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerStatus {
    /// Nothing selected.
    Idle,
    /// The selected camera has no stream mapping.
    NoStream,
    /// Opened, waiting for the first frame.
    Connecting,
    Live,
    /// Opening or decoding failed; not retried until the selection changes.
    Failed(String),
}

impl PlayerStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PlayerStatus::Idle => "",
            PlayerStatus::NoStream => "No live stream",
            PlayerStatus::Connecting => "Connecting...",
            PlayerStatus::Live => "LIVE",
            PlayerStatus::Failed(_) => "Stream unavailable",
        }
    }
}

/// Follows the selection and keeps at most one preview session open.
pub struct LivePlayer {
    source: Box<dyn PreviewSource>,
    base_url: String,
    camera: Option<CameraId>,
    session: Option<Box<dyn PreviewSession>>,
    status: PlayerStatus,
}

impl LivePlayer {
    pub fn new(source: Box<dyn PreviewSource>, base_url: impl Into<String>) -> Self {
        Self {
            source,
            base_url: base_url.into(),
            camera: None,
            session: None,
            status: PlayerStatus::Idle,
        }
    }

    /// Camera the preview belongs to.
    pub fn camera(&self) -> Option<CameraId> {
        self.camera
    }

    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    pub fn is_open(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_open())
    }

    /// Switch to the selected camera. The previous session is closed
    /// before the next one opens; an unchanged selection is a no-op.
    pub fn follow(&mut self, selected: Option<CameraId>, registry: &CameraRegistry) {
        if selected == self.camera {
            return;
        }
        self.close_session();
        self.camera = selected;
        self.status = PlayerStatus::Idle;

        let Some(id) = selected else {
            return;
        };
        let Some(stream_id) = registry.stream_id(id) else {
            self.status = PlayerStatus::NoStream;
            return;
        };
        let endpoint = StreamEndpoint::resolve(&self.base_url, id, stream_id);
        match self.source.open(&endpoint) {
            Ok(session) => {
                tracing::info!(camera_id = id, "Live preview opened");
                self.session = Some(session);
                self.status = PlayerStatus::Connecting;
            }
            Err(e) => {
                tracing::warn!(camera_id = id, error = %e, "Live preview failed to open");
                self.status = PlayerStatus::Failed(e.to_string());
            }
        }
    }

    /// A new frame for the current camera, if one arrived.
    pub fn poll(&mut self) -> Option<PreviewFrame> {
        let session = self.session.as_mut()?;
        match session.poll_frame() {
            Ok(Some(frame)) => {
                self.status = PlayerStatus::Live;
                Some(frame)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(camera_id = ?self.camera, error = %e, "Live preview stopped");
                self.close_session();
                self.status = PlayerStatus::Failed(e.to_string());
                None
            }
        }
    }

    /// Close the preview and forget the selection.
    pub fn close(&mut self) {
        self.close_session();
        self.camera = None;
        self.status = PlayerStatus::Idle;
    }

    fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close() {
                tracing::warn!(camera_id = ?self.camera, error = %e, "Failed to close preview");
            }
        }
    }
}

impl Drop for LivePlayer {
    fn drop(&mut self) {
        self.close_session();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use citycam_geo_model::{Camera, Category};

    use super::*;

    #[derive(Default)]
    struct Tracker {
        opened: Mutex<Vec<String>>,
        live: AtomicUsize,
    }

    impl Tracker {
        fn live(&self) -> usize {
            self.live.load(Ordering::SeqCst)
        }
    }

    struct FakePreview {
        tracker: Arc<Tracker>,
        open: bool,
        fail_poll: bool,
    }

    impl PreviewSession for FakePreview {
        fn poll_frame(&mut self) -> CitycamResult<Option<PreviewFrame>> {
            if self.fail_poll {
                return Err(CitycamError::decode("stream ended"));
            }
            Ok(Some(PreviewFrame {
                width: 1,
                height: 1,
                rgba: vec![1, 2, 3, 255],
            }))
        }

        fn close(&mut self) -> CitycamResult<()> {
            if self.open {
                self.open = false;
                self.tracker.live.fetch_sub(1, Ordering::SeqCst);
            }
            Ok(())
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    struct FakePreviewSource {
        tracker: Arc<Tracker>,
        fail_open: bool,
        fail_poll: bool,
    }

    impl PreviewSource for FakePreviewSource {
        fn open(&mut self, endpoint: &StreamEndpoint) -> CitycamResult<Box<dyn PreviewSession>> {
            self.tracker
                .opened
                .lock()
                .unwrap()
                .push(endpoint.manifest_url.clone());
            if self.fail_open {
                return Err(CitycamError::stream("refused"));
            }
            assert_eq!(self.tracker.live.fetch_add(1, Ordering::SeqCst), 0);
            Ok(Box::new(FakePreview {
                tracker: Arc::clone(&self.tracker),
                open: true,
                fail_poll: self.fail_poll,
            }))
        }
    }

    fn registry() -> CameraRegistry {
        let cameras = (1..=3)
            .map(|id| Camera::new(id, format!("Cam {id}"), 37.87, 32.49, Category::Square))
            .collect();
        let streams: BTreeMap<CameraId, String> =
            [(1, "one".to_string()), (2, "two".to_string())].into_iter().collect();
        CameraRegistry::new(cameras, streams).unwrap()
    }

    fn player(fail_open: bool, fail_poll: bool) -> (LivePlayer, Arc<Tracker>) {
        let tracker = Arc::new(Tracker::default());
        let source = FakePreviewSource {
            tracker: Arc::clone(&tracker),
            fail_open,
            fail_poll,
        };
        (
            LivePlayer::new(Box::new(source), "http://localhost:3000/stream"),
            tracker,
        )
    }

    #[test]
    fn test_selection_changes_leave_one_session() {
        let reg = registry();
        let (mut player, tracker) = player(false, false);

        player.follow(Some(1), &reg);
        assert_eq!(tracker.live(), 1);
        assert_eq!(player.status(), &PlayerStatus::Connecting);

        player.follow(Some(1), &reg);
        assert_eq!(tracker.opened.lock().unwrap().len(), 1);

        player.follow(Some(2), &reg);
        assert_eq!(tracker.live(), 1);
        assert_eq!(player.camera(), Some(2));
        assert_eq!(
            tracker.opened.lock().unwrap().as_slice(),
            [
                "http://localhost:3000/stream/l/one/master.m3u8",
                "http://localhost:3000/stream/l/two/master.m3u8",
            ]
        );

        player.follow(None, &reg);
        assert_eq!(tracker.live(), 0);
        assert!(!player.is_open());
        assert_eq!(player.status(), &PlayerStatus::Idle);
    }

    #[test]
    fn test_teardown_closes_session() {
        let reg = registry();
        let (mut player, tracker) = player(false, false);
        player.follow(Some(1), &reg);
        player.close();
        assert_eq!(tracker.live(), 0);
        assert_eq!(player.camera(), None);

        player.follow(Some(2), &reg);
        assert_eq!(tracker.live(), 1);
        drop(player);
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_camera_without_stream_opens_nothing() {
        let reg = registry();
        let (mut player, tracker) = player(false, false);
        player.follow(Some(1), &reg);
        player.follow(Some(3), &reg);
        assert_eq!(tracker.live(), 0);
        assert_eq!(tracker.opened.lock().unwrap().len(), 1);
        assert_eq!(player.status(), &PlayerStatus::NoStream);
        assert!(player.poll().is_none());
    }

    #[test]
    fn test_first_frame_goes_live() {
        let reg = registry();
        let (mut player, _tracker) = player(false, false);
        player.follow(Some(2), &reg);
        let frame = player.poll().unwrap();
        assert_eq!(frame.rgba, vec![1, 2, 3, 255]);
        assert_eq!(player.status(), &PlayerStatus::Live);
    }

    #[test]
    fn test_open_failure_is_reported_once() {
        let reg = registry();
        let (mut player, tracker) = player(true, false);
        player.follow(Some(1), &reg);
        assert!(matches!(player.status(), PlayerStatus::Failed(_)));
        player.follow(Some(1), &reg);
        assert_eq!(tracker.opened.lock().unwrap().len(), 1);
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_decode_error_closes_session() {
        let reg = registry();
        let (mut player, tracker) = player(false, true);
        player.follow(Some(1), &reg);
        assert!(player.poll().is_none());
        assert_eq!(tracker.live(), 0);
        assert!(matches!(player.status(), PlayerStatus::Failed(_)));
        assert_eq!(player.camera(), Some(1));
    }

    #[test]
    fn test_strided_preview_rows() {
        let stride = 2 * 4 + 8;
        let mut data = vec![0xEEu8; stride * 2];
        data[..8].copy_from_slice(&[1; 8]);
        data[stride..stride + 8].copy_from_slice(&[2; 8]);
        let frame = PreviewFrame::from_strided(&data, 2, 2, stride).unwrap();
        assert_eq!(frame.rgba.len(), 16);
        assert!(!frame.rgba.contains(&0xEE));
        assert!(PreviewFrame::from_strided(&data[..10], 2, 2, stride).is_none());
    }

    #[test]
    fn test_preview_launch_is_rgba_realtime() {
        let launch = build_preview_launch("http://h/l/s/master.m3u8");
        assert!(launch.contains("format=RGBA,width=480,height=270"));
        assert!(launch.contains("sync=true"));
        assert!(launch.contains("appsink name=frames"));
    }
}
