// SPDX-License-Identifier: GPL-3.0-only

//! Scan session
//!
//! ```text
//! Idle ──start()──▶ Starting ──camera ok──▶ Running ──result / cancel──▶ Stopped
//!                      │
//!                      └──camera error──▶ Errored
//! ```
//!
//! A [`Scanner`] owns one session: the camera, the detection loops, the stop
//! latch and the result sink. Sessions are single-use; start a new scanner
//! to scan again.

pub mod camera_session;
pub mod latch;
pub mod result_sink;
pub mod scheduler;

pub use camera_session::CameraSession;
pub use latch::StopLatch;
pub use result_sink::{DetectedCallback, ResultSink};
pub use scheduler::{DetectionScheduler, Strategies, Timing};

use crate::backends::camera::{self, CameraSource, VideoSink};
use crate::config::Config;
use crate::constants::DEBUG_PANEL_ENTRIES;
use crate::errors::{CameraAccessError, ScannerError, ScannerResult};
use crate::frame_processor::{
    CapabilityProvider, DecodedResult, DetectorStrategy, FrameCropDecoder, MultiFormatDecoder,
    NativeDetector, NoPlatformDetector,
};
use crate::storage::DebugLog;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// Lifecycle of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Running,
    /// Terminal: a result was reported or the session was cancelled
    Stopped,
    /// Terminal: the camera could not be acquired
    Errored,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Running => "running",
            SessionState::Stopped => "stopped",
            SessionState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Builder for [`Scanner`]
pub struct ScannerBuilder {
    config: Config,
    source: Option<Arc<dyn CameraSource>>,
    provider: Arc<dyn CapabilityProvider>,
    native: Option<Option<Arc<dyn DetectorStrategy>>>,
    crop: Option<Arc<dyn DetectorStrategy>>,
    multi: Option<Arc<dyn DetectorStrategy>>,
    on_detected: Option<DetectedCallback>,
    debug_log: Option<DebugLog>,
}

impl Default for ScannerBuilder {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ScannerBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            source: None,
            provider: Arc::new(NoPlatformDetector),
            native: None,
            crop: None,
            multi: None,
            on_detected: None,
            debug_log: None,
        }
    }

    /// Camera source; defaults to V4L2
    pub fn camera_source(mut self, source: Arc<dyn CameraSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Where to look for a native detector at session start
    pub fn capability_provider(mut self, provider: Arc<dyn CapabilityProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Use this native strategy instead of asking the capability provider
    pub fn native_strategy(mut self, strategy: Option<Arc<dyn DetectorStrategy>>) -> Self {
        self.native = Some(strategy);
        self
    }

    pub fn crop_strategy(mut self, strategy: Arc<dyn DetectorStrategy>) -> Self {
        self.crop = Some(strategy);
        self
    }

    pub fn multi_format_strategy(mut self, strategy: Arc<dyn DetectorStrategy>) -> Self {
        self.multi = Some(strategy);
        self
    }

    /// Called exactly once with the first decoded value
    pub fn on_detected<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.on_detected = Some(Box::new(callback));
        self
    }

    /// Debug log to write to when `show_debug` is set
    pub fn debug_log(mut self, log: DebugLog) -> Self {
        self.debug_log = Some(log);
        self
    }

    pub fn build(self) -> Scanner {
        let id = Uuid::new_v4();
        let source = self.source.unwrap_or_else(camera::get_backend);
        let debug_log = match self.debug_log {
            Some(log) if self.config.show_debug => log,
            Some(_) => DebugLog::disabled(),
            None if self.config.show_debug => DebugLog::persistent(true),
            None => DebugLog::disabled(),
        };

        let latch = StopLatch::new();
        let camera = Arc::new(CameraSession::new(source, VideoSink::new()));
        let results = Arc::new(ResultSink::new(
            latch.clone(),
            Arc::clone(&camera),
            self.on_detected,
        ));

        let crop = self.crop.unwrap_or_else(|| {
            Arc::new(FrameCropDecoder::new(
                self.config.crop_fraction(),
                self.config.crop_target_size(),
            ))
        });
        let multi = self.multi.unwrap_or_else(|| {
            Arc::new(MultiFormatDecoder::new(
                self.config.preferred_formats.clone(),
                self.config.multi_format_timeout(),
            ))
        });

        Scanner {
            inner: Arc::new(ScannerInner {
                id,
                config: self.config,
                state: Mutex::new(SessionState::Idle),
                latch,
                camera,
                results,
                provider: self.provider,
                native_override: self.native,
                crop,
                multi,
                scheduler: OnceLock::new(),
                error: Mutex::new(None),
                debug_log,
            }),
        }
    }

    /// Build the scanner and, with `auto_start`, start it.
    ///
    /// Camera errors leave the scanner in [`SessionState::Errored`]; see
    /// [`Scanner::error`].
    pub async fn mount(self) -> Scanner {
        let scanner = self.build();
        if scanner.inner.config.auto_start {
            if let Err(e) = scanner.start().await {
                warn!(session = %scanner.session_id(), error = %e, "Auto-start failed");
            }
        }
        scanner
    }
}

struct ScannerInner {
    id: Uuid,
    config: Config,
    state: Mutex<SessionState>,
    latch: StopLatch,
    camera: Arc<CameraSession>,
    results: Arc<ResultSink>,
    provider: Arc<dyn CapabilityProvider>,
    native_override: Option<Option<Arc<dyn DetectorStrategy>>>,
    crop: Arc<dyn DetectorStrategy>,
    multi: Arc<dyn DetectorStrategy>,
    scheduler: OnceLock<DetectionScheduler>,
    error: Mutex<Option<CameraAccessError>>,
    debug_log: DebugLog,
}

impl ScannerInner {
    fn native_strategy(&self) -> Option<Arc<dyn DetectorStrategy>> {
        match &self.native_override {
            Some(strategy) => strategy.clone(),
            None => NativeDetector::resolve(self.provider.as_ref(), &self.config.preferred_formats)
                .map(|detector| Arc::new(detector) as Arc<dyn DetectorStrategy>),
        }
    }

    fn state(&self) -> SessionState {
        let state = *self.state.lock().unwrap();
        if self.latch.is_set() && state != SessionState::Errored {
            SessionState::Stopped
        } else {
            state
        }
    }

    /// Teardown: set the latch, cancel the loops, release the camera
    fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        let closed = self.results.close();
        self.latch.set();
        if let Some(scheduler) = self.scheduler.get() {
            scheduler.stop();
        }
        self.camera.release();
        if *state != SessionState::Errored {
            *state = SessionState::Stopped;
        }
        if closed {
            info!(session = %self.id, "Scan session cancelled");
            self.debug_log.append("cancelled");
        }
        self.debug_log.flush();
    }
}

/// One scan session
pub struct Scanner {
    inner: Arc<ScannerInner>,
}

impl Scanner {
    pub fn builder(config: Config) -> ScannerBuilder {
        ScannerBuilder::new(config)
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.id
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Presentation hint, has no effect on decoding
    pub fn minimal_view(&self) -> bool {
        self.inner.config.minimal_view
    }

    pub fn state(&self) -> SessionState {
        self.inner.state()
    }

    /// Camera error that ended the session, if any
    pub fn error(&self) -> Option<CameraAccessError> {
        self.inner.error.lock().unwrap().clone()
    }

    /// Acquire the camera and start the detection loops.
    ///
    /// Only valid from [`SessionState::Idle`].
    pub async fn start(&self) -> ScannerResult<()> {
        let inner = &self.inner;
        {
            let mut state = inner.state.lock().unwrap();
            let current = if inner.latch.is_set() && *state != SessionState::Errored {
                SessionState::Stopped
            } else {
                *state
            };
            if current != SessionState::Idle {
                return Err(ScannerError::InvalidState(current));
            }
            *state = SessionState::Starting;
        }

        let span = info_span!("scan_session", session = %inner.id);
        async {
            info!("Starting scan session");
            if let Err(e) = inner.camera.acquire(inner.config.stream_constraints()).await {
                return Err(self.fail_start(e));
            }

            inner.camera.detect_torch_capability();
            let strategies = Strategies {
                native: inner.native_strategy(),
                crop: Arc::clone(&inner.crop),
                multi: Arc::clone(&inner.multi),
            };
            let scheduler = DetectionScheduler::new(
                inner.camera.sink().clone(),
                inner.latch.clone(),
                Arc::clone(&inner.results),
                strategies,
                Timing {
                    frame_interval: inner.config.frame_interval(),
                    poll_interval: inner.config.poll_interval(),
                },
                inner.debug_log.clone(),
            );

            let mut state = inner.state.lock().unwrap();
            if inner.latch.is_set() {
                // Cancelled while the camera was starting
                inner.camera.release();
                *state = SessionState::Stopped;
                return Err(ScannerError::Camera(CameraAccessError::Aborted));
            }
            scheduler.start();
            if inner.scheduler.set(scheduler).is_err() {
                return Err(ScannerError::InvalidState(*state));
            }
            *state = SessionState::Running;
            info!("Scan session running");
            Ok(())
        }
        .instrument(span)
        .await
    }

    fn fail_start(&self, error: CameraAccessError) -> ScannerError {
        let inner = &self.inner;
        let mut state = inner.state.lock().unwrap();
        inner.results.close();
        inner.latch.set();
        inner.camera.release();

        if error == CameraAccessError::Aborted {
            *state = SessionState::Stopped;
        } else {
            warn!(error = %error, "Camera acquisition failed");
            inner.debug_log.append(format!("camera error {}", error));
            inner.debug_log.flush();
            *state = SessionState::Errored;
            *inner.error.lock().unwrap() = Some(error.clone());
        }
        ScannerError::Camera(error)
    }

    /// Run the fallback chain once against the current frame
    pub async fn scan_now(&self) -> Option<DecodedResult> {
        match self.inner.scheduler.get() {
            Some(scheduler) => scheduler.scan_now().await,
            None => {
                info!(session = %self.inner.id, "Manual scan without video");
                self.inner.debug_log.append("manual no video");
                None
            }
        }
    }

    /// No-op unless the camera reported torch support
    pub fn toggle_torch(&self, on: bool) {
        self.inner.camera.toggle_torch(on);
    }

    pub fn torch_available(&self) -> bool {
        self.inner.camera.torch_available()
    }

    pub fn torch_on(&self) -> bool {
        self.inner.camera.torch_on()
    }

    /// End the session. Safe to call repeatedly and from any thread.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Handle that can cancel the session from elsewhere (e.g. a signal handler)
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// The decoded result, once there is one
    pub fn result(&self) -> Option<DecodedResult> {
        self.inner.results.result()
    }

    /// Wait until the session reports a result or ends without one
    pub async fn wait_for_result(&self) -> Option<DecodedResult> {
        self.inner.results.wait().await
    }

    /// Newest debug log entries for the on-screen panel
    pub fn debug_entries(&self) -> Vec<String> {
        if !self.inner.debug_log.is_enabled() {
            return Vec::new();
        }
        self.inner.debug_log.recent(DEBUG_PANEL_ENTRIES)
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.inner.cancel();
    }
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("session", &self.inner.id)
            .field("state", &self.state())
            .finish()
    }
}

/// Cloneable cancellation handle for a [`Scanner`]
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<ScannerInner>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.inner.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_processor::StrategyKind;
    use crate::testing::{
        CallbackRecorder, FakeProvider, FakeSource, FakeTrack, ScriptedStrategy, Step, ean13_frame,
    };
    use std::time::Duration;

    fn config() -> Config {
        Config {
            frame_interval_ms: 10,
            poll_interval_ms: 50,
            ..Default::default()
        }
    }

    async fn wait(scanner: &Scanner) -> Option<DecodedResult> {
        tokio::time::timeout(Duration::from_secs(5), scanner.wait_for_result())
            .await
            .expect("session should finish")
    }

    #[tokio::test]
    async fn test_native_detector_reports_once() {
        let track = FakeTrack::new("rear");
        let recorder = CallbackRecorder::new();
        let scanner = ScannerBuilder::new(config())
            .camera_source(Arc::new(FakeSource::with_tracks(vec![track.clone()])))
            .capability_provider(Arc::new(FakeProvider::detecting("12345")))
            .on_detected(recorder.callback())
            .mount()
            .await;

        let result = wait(&scanner).await.unwrap();
        assert_eq!(result.value, "12345");
        assert_eq!(result.strategy, StrategyKind::Native);
        assert_eq!(scanner.state(), SessionState::Stopped);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(recorder.values(), vec!["12345".to_string()]);
        assert_eq!(track.stops(), 1);
    }

    #[tokio::test]
    async fn test_crop_decoder_without_native() {
        let track = FakeTrack::new("rear");
        let recorder = CallbackRecorder::new();
        let multi = Arc::new(ScriptedStrategy::new(StrategyKind::MultiFormat));
        let scanner = ScannerBuilder::new(config())
            .camera_source(Arc::new(FakeSource::with_tracks(vec![track.clone()])))
            .crop_strategy(Arc::new(
                ScriptedStrategy::new(StrategyKind::FrameCrop).otherwise(Step::found("ABC-999")),
            ))
            .multi_format_strategy(multi.clone())
            .on_detected(recorder.callback())
            .mount()
            .await;

        let result = wait(&scanner).await.unwrap();
        assert_eq!(result.value, "ABC-999");
        assert_eq!(result.strategy, StrategyKind::FrameCrop);
        assert_eq!(recorder.values(), vec!["ABC-999".to_string()]);
        assert_eq!(multi.calls(), 0);
        assert_eq!(track.stops(), 1);
    }

    #[tokio::test]
    async fn test_multi_format_fallback_decodes_ean13() {
        let track = FakeTrack::new("rear").with_frame(ean13_frame("4006381333931"));
        let recorder = CallbackRecorder::new();
        let scanner = ScannerBuilder::new(config())
            .camera_source(Arc::new(FakeSource::with_tracks(vec![track.clone()])))
            .on_detected(recorder.callback())
            .mount()
            .await;

        let result = wait(&scanner).await.unwrap();
        assert_eq!(result.value, "4006381333931");
        assert_eq!(result.strategy, StrategyKind::MultiFormat);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(recorder.values(), vec!["4006381333931".to_string()]);
        assert_eq!(track.stops(), 1);
    }

    #[tokio::test]
    async fn test_late_multi_format_result_after_crop_misses() {
        let track = FakeTrack::new("rear");
        let recorder = CallbackRecorder::new();
        let crop = Arc::new(ScriptedStrategy::new(StrategyKind::FrameCrop).otherwise(Step::none()));
        // Three quick misses, then a slow success spanning later ticks
        let multi = Arc::new(
            ScriptedStrategy::new(StrategyKind::MultiFormat)
                .then(Step::none())
                .then(Step::none())
                .then(Step::none())
                .then(Step::found("4006381333931").after(Duration::from_millis(60)))
                .otherwise(Step::found("SHOULD-NOT-WIN")),
        );
        let scanner = ScannerBuilder::new(config())
            .camera_source(Arc::new(FakeSource::with_tracks(vec![track.clone()])))
            .crop_strategy(crop.clone())
            .multi_format_strategy(multi.clone())
            .on_detected(recorder.callback())
            .mount()
            .await;

        let result = wait(&scanner).await.unwrap();
        assert_eq!(result.value, "4006381333931");
        assert_eq!(result.strategy, StrategyKind::MultiFormat);
        assert!(crop.calls() >= 5, "crop calls: {}", crop.calls());
        assert_eq!(multi.calls(), 4);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(recorder.values(), vec!["4006381333931".to_string()]);
        assert_eq!(track.stops(), 1);
    }

    #[tokio::test]
    async fn test_camera_rejection_errors_session() {
        let crop = Arc::new(ScriptedStrategy::new(StrategyKind::FrameCrop));
        let recorder = CallbackRecorder::new();
        let scanner = ScannerBuilder::new(Config {
            auto_start: false,
            ..config()
        })
        .camera_source(Arc::new(FakeSource::failing(
            CameraAccessError::PermissionDenied("denied".into()),
        )))
        .crop_strategy(crop.clone())
        .on_detected(recorder.callback())
        .build();

        let err = scanner.start().await.unwrap_err();
        assert!(matches!(
            err,
            ScannerError::Camera(CameraAccessError::PermissionDenied(_))
        ));
        assert_eq!(scanner.state(), SessionState::Errored);
        assert!(scanner.error().is_some());
        assert!(wait(&scanner).await.is_none());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(crop.calls(), 0);
        assert!(recorder.values().is_empty());

        // Errored is terminal
        scanner.cancel();
        assert_eq!(scanner.state(), SessionState::Errored);
        assert!(matches!(
            scanner.start().await,
            Err(ScannerError::InvalidState(SessionState::Errored))
        ));
    }

    #[tokio::test]
    async fn test_cancel_mid_scan_discards_late_result() {
        let tracks = vec![FakeTrack::new("rear"), FakeTrack::new("aux")];
        let recorder = CallbackRecorder::new();
        let multi = Arc::new(
            ScriptedStrategy::new(StrategyKind::MultiFormat)
                .otherwise(Step::found("4006381333931").after(Duration::from_millis(150))),
        );
        let scanner = ScannerBuilder::new(config())
            .camera_source(Arc::new(FakeSource::with_tracks(tracks.clone())))
            .crop_strategy(Arc::new(
                ScriptedStrategy::new(StrategyKind::FrameCrop).otherwise(Step::none()),
            ))
            .multi_format_strategy(multi.clone())
            .on_detected(recorder.callback())
            .mount()
            .await;
        assert_eq!(scanner.state(), SessionState::Running);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(multi.calls(), 1);
        scanner.cancel();
        assert_eq!(scanner.state(), SessionState::Stopped);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(recorder.values().is_empty());
        assert!(scanner.result().is_none());
        assert!(wait(&scanner).await.is_none());

        scanner.cancel();
        drop(scanner);
        for track in &tracks {
            assert_eq!(track.stops(), 1);
        }
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let track = FakeTrack::new("rear");
        let source = Arc::new(FakeSource::with_tracks(vec![track.clone()]));
        let scanner = ScannerBuilder::new(Config {
            auto_start: false,
            ..config()
        })
        .camera_source(source.clone())
        .build();

        assert_eq!(scanner.state(), SessionState::Idle);
        scanner.cancel();
        assert_eq!(scanner.state(), SessionState::Stopped);
        assert!(matches!(
            scanner.start().await,
            Err(ScannerError::InvalidState(SessionState::Stopped))
        ));
        assert_eq!(source.opens(), 0);
        assert_eq!(track.stops(), 0);
    }

    #[tokio::test]
    async fn test_cancel_while_camera_opening() {
        let track = FakeTrack::new("rear");
        let source = Arc::new(
            FakeSource::with_tracks(vec![track.clone()])
                .with_open_delay(Duration::from_millis(100)),
        );
        let scanner = Arc::new(
            ScannerBuilder::new(Config {
                auto_start: false,
                ..config()
            })
            .camera_source(source)
            .build(),
        );

        let starting = {
            let scanner = Arc::clone(&scanner);
            tokio::spawn(async move { scanner.start().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(scanner.state(), SessionState::Starting);
        scanner.cancel_handle().cancel();

        let result = starting.await.unwrap();
        assert!(matches!(
            result,
            Err(ScannerError::Camera(CameraAccessError::Aborted))
        ));
        assert_eq!(scanner.state(), SessionState::Stopped);
        assert_eq!(track.stops(), 1);
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let scanner = ScannerBuilder::new(config())
            .camera_source(Arc::new(FakeSource::with_tracks(vec![FakeTrack::new("rear")])))
            .crop_strategy(Arc::new(
                ScriptedStrategy::new(StrategyKind::FrameCrop).otherwise(Step::none()),
            ))
            .multi_format_strategy(Arc::new(ScriptedStrategy::new(StrategyKind::MultiFormat)))
            .mount()
            .await;

        assert!(matches!(
            scanner.start().await,
            Err(ScannerError::InvalidState(SessionState::Running))
        ));
    }

    #[tokio::test]
    async fn test_scan_now_reports_through_sink() {
        let recorder = CallbackRecorder::new();
        let crop = Arc::new(
            ScriptedStrategy::new(StrategyKind::FrameCrop)
                .then(Step::none())
                .otherwise(Step::found("MANUAL")),
        );
        let scanner = ScannerBuilder::new(Config {
            frame_interval_ms: 60_000,
            ..config()
        })
        .camera_source(Arc::new(FakeSource::with_tracks(vec![FakeTrack::new("rear")])))
        .crop_strategy(crop.clone())
        .multi_format_strategy(Arc::new(ScriptedStrategy::new(StrategyKind::MultiFormat)))
        .on_detected(recorder.callback())
        .mount()
        .await;

        // The first loop tick consumes the scripted miss
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(crop.calls(), 1);

        let result = scanner.scan_now().await.unwrap();
        assert_eq!(result.value, "MANUAL");
        assert_eq!(recorder.values(), vec!["MANUAL".to_string()]);
        assert_eq!(scanner.state(), SessionState::Stopped);
    }

    #[tokio::test]
    async fn test_scan_now_before_start() {
        let log = DebugLog::in_memory(true);
        let scanner = ScannerBuilder::new(Config {
            auto_start: false,
            show_debug: true,
            ..config()
        })
        .camera_source(Arc::new(FakeSource::with_tracks(vec![FakeTrack::new("rear")])))
        .debug_log(log.clone())
        .build();

        assert!(scanner.scan_now().await.is_none());
        assert_eq!(log.entries().len(), 1);
        assert!(log.entries()[0].ends_with("manual no video"));
        assert_eq!(scanner.debug_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_torch_controls() {
        let track = FakeTrack::new("rear").with_torch(Some(true));
        let scanner = ScannerBuilder::new(config())
            .camera_source(Arc::new(FakeSource::with_tracks(vec![track.clone()])))
            .crop_strategy(Arc::new(
                ScriptedStrategy::new(StrategyKind::FrameCrop).otherwise(Step::none()),
            ))
            .multi_format_strategy(Arc::new(ScriptedStrategy::new(StrategyKind::MultiFormat)))
            .mount()
            .await;

        assert!(scanner.torch_available());
        scanner.toggle_torch(true);
        assert!(scanner.torch_on());

        scanner.cancel();
        assert!(!scanner.torch_on());
        assert_eq!(track.torch_requests(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_debug_log_disabled_by_default() {
        let log = DebugLog::in_memory(true);
        let scanner = ScannerBuilder::new(config())
            .camera_source(Arc::new(FakeSource::with_tracks(vec![FakeTrack::new("rear")])))
            .crop_strategy(Arc::new(
                ScriptedStrategy::new(StrategyKind::FrameCrop).otherwise(Step::found("X")),
            ))
            .debug_log(log.clone())
            .mount()
            .await;

        wait(&scanner).await.unwrap();
        assert!(log.entries().is_empty());
        assert!(scanner.debug_entries().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_persists_buffered_attempts() {
        use crate::constants::DEBUG_LOG_KEY;
        use crate::storage::{LogStore, MemoryStore};

        let store = Arc::new(MemoryStore::new());
        let log = DebugLog::new(store.clone(), true);
        let scanner = ScannerBuilder::new(Config {
            show_debug: true,
            ..config()
        })
        .camera_source(Arc::new(FakeSource::with_tracks(vec![FakeTrack::new("rear")])))
        .crop_strategy(Arc::new(
            ScriptedStrategy::new(StrategyKind::FrameCrop).otherwise(Step::none()),
        ))
        .multi_format_strategy(Arc::new(ScriptedStrategy::new(StrategyKind::MultiFormat)))
        .debug_log(log.clone())
        .mount()
        .await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        // Attempts since the first one are still only in memory
        assert!(log.entries().len() > store.load(DEBUG_LOG_KEY).unwrap().len());

        scanner.cancel();
        let persisted = store.load(DEBUG_LOG_KEY).unwrap();
        assert!(persisted.len() > 2);
        assert!(persisted[0].ends_with(" cancelled"));
    }
}
