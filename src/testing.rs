// SPDX-License-Identifier: GPL-3.0-only

//! Test doubles for cameras and decoding strategies

use crate::backends::camera::{
    CameraDevice, CameraSource, MediaStream, StreamConstraints, TrackCapabilities, VideoFrame,
    VideoSink, VideoTrack,
};
use crate::constants::CodeFormat;
use crate::errors::{CameraAccessError, DecodeError, TrackError};
use crate::frame_processor::tasks::linear::{
    code128_set_b, encode_code128, encode_ean13, render_row,
};
use crate::frame_processor::tasks::native::RawDetection;
use crate::frame_processor::tasks::{
    CapabilityProvider, DecodeOutcome, Detect, DetectorStrategy, PlatformDetector,
};
use crate::frame_processor::StrategyKind;
use crate::session::DetectedCallback;
use futures::future::{BoxFuture, FutureExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Video track that counts lifecycle calls
pub struct FakeTrack {
    label: String,
    torch: Mutex<Option<bool>>,
    torch_fails: AtomicBool,
    frame: Mutex<Arc<VideoFrame>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
    torch_requests: Mutex<Vec<bool>>,
}

impl FakeTrack {
    pub fn new(label: &str) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            torch: Mutex::new(None),
            torch_fails: AtomicBool::new(false),
            frame: Mutex::new(Arc::new(VideoFrame::from_luma(64, 64, vec![128; 64 * 64]))),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            torch_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn with_torch(self: Arc<Self>, torch: Option<bool>) -> Arc<Self> {
        *self.torch.lock().unwrap() = torch;
        self
    }

    pub fn with_torch_failure(self: Arc<Self>) -> Arc<Self> {
        self.torch_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Frame pushed into the sink on start
    pub fn with_frame(self: Arc<Self>, frame: VideoFrame) -> Arc<Self> {
        *self.frame.lock().unwrap() = Arc::new(frame);
        self
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn torch_requests(&self) -> Vec<bool> {
        self.torch_requests.lock().unwrap().clone()
    }
}

impl VideoTrack for FakeTrack {
    fn label(&self) -> &str {
        &self.label
    }

    fn capabilities(&self) -> Result<TrackCapabilities, TrackError> {
        Ok(TrackCapabilities {
            torch: *self.torch.lock().unwrap(),
            width: Some(640),
            height: Some(480),
        })
    }

    fn apply_torch(&self, on: bool) -> Result<(), TrackError> {
        self.torch_requests.lock().unwrap().push(on);
        if self.torch_fails.load(Ordering::SeqCst) {
            return Err(TrackError::Rejected("torch constraint rejected".into()));
        }
        if *self.torch.lock().unwrap() != Some(true) {
            return Err(TrackError::Unsupported);
        }
        Ok(())
    }

    fn start(&self, sink: VideoSink) -> Result<(), TrackError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        sink.push_frame(self.frame.lock().unwrap().clone());
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Camera source handing out fixed tracks, or failing
pub struct FakeSource {
    tracks: Vec<Arc<FakeTrack>>,
    failure: Option<CameraAccessError>,
    open_delay: Option<Duration>,
    opens: AtomicUsize,
}

impl FakeSource {
    pub fn with_tracks(tracks: Vec<Arc<FakeTrack>>) -> Self {
        Self {
            tracks,
            failure: None,
            open_delay: None,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: CameraAccessError) -> Self {
        Self {
            failure: Some(error),
            ..Self::with_tracks(Vec::new())
        }
    }

    /// Block `open` for `delay`, like a slow device
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl CameraSource for FakeSource {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.tracks
            .iter()
            .enumerate()
            .map(|(i, track)| CameraDevice {
                name: track.label.clone(),
                path: format!("/dev/video{}", i),
                driver: None,
            })
            .collect()
    }

    fn open(&self, _constraints: &StreamConstraints) -> Result<MediaStream, CameraAccessError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.open_delay {
            std::thread::sleep(delay);
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(MediaStream::new(
            self.tracks
                .iter()
                .map(|track| Arc::clone(track) as Arc<dyn VideoTrack>)
                .collect(),
        ))
    }
}

/// One scripted detect answer
#[derive(Debug, Clone)]
pub struct Step {
    outcome: DecodeOutcome,
    delay: Option<Duration>,
}

impl Step {
    pub fn none() -> Self {
        Self {
            outcome: Ok(None),
            delay: None,
        }
    }

    pub fn found(value: &str) -> Self {
        Self {
            outcome: Ok(Some(value.to_string())),
            delay: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            outcome: Err(DecodeError::Unexpected(message.to_string())),
            delay: None,
        }
    }

    /// Resolve asynchronously after `delay`
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Strategy replaying scripted steps, then repeating a fallback step
pub struct ScriptedStrategy {
    kind: StrategyKind,
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
}

impl ScriptedStrategy {
    pub fn new(kind: StrategyKind) -> Self {
        Self {
            kind,
            steps: Mutex::new(VecDeque::new()),
            fallback: Step::none(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn then(self, step: Step) -> Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    pub fn otherwise(mut self, step: Step) -> Self {
        self.fallback = step;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DetectorStrategy for ScriptedStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn detect(&self, _sink: &VideoSink) -> Detect {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match step.delay {
            None => Detect::Ready(step.outcome),
            Some(delay) => Detect::Pending(
                async move {
                    tokio::time::sleep(delay).await;
                    step.outcome
                }
                .boxed(),
            ),
        }
    }
}

/// Platform detector that always sees the same value
struct FixedDetector(String);

impl PlatformDetector for FixedDetector {
    fn detect(
        &self,
        _frame: Arc<VideoFrame>,
    ) -> BoxFuture<'static, Result<Vec<RawDetection>, DecodeError>> {
        let detection = RawDetection::new(self.0.clone());
        async move { Ok(vec![detection]) }.boxed()
    }
}

/// Capability provider offering a [`FixedDetector`]
pub struct FakeProvider {
    value: String,
}

impl FakeProvider {
    pub fn detecting(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

impl CapabilityProvider for FakeProvider {
    fn supported_formats(&self) -> Option<Vec<CodeFormat>> {
        Some(vec![CodeFormat::QrCode, CodeFormat::Ean13])
    }

    fn barcode_detector(
        &self,
        _formats: &[CodeFormat],
    ) -> Result<Option<Arc<dyn PlatformDetector>>, DecodeError> {
        Ok(Some(Arc::new(FixedDetector(self.value.clone()))))
    }
}

/// Collects every value passed to the detection callback
#[derive(Clone, Default)]
pub struct CallbackRecorder {
    values: Arc<Mutex<Vec<String>>>,
}

impl CallbackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> DetectedCallback {
        let values = Arc::clone(&self.values);
        Box::new(move |value| values.lock().unwrap().push(value))
    }

    pub fn values(&self) -> Vec<String> {
        self.values.lock().unwrap().clone()
    }
}

/// 640x480 frame with an EAN-13 barcode across the middle
pub fn ean13_frame(text: &str) -> VideoFrame {
    barcode_frame(&render_row(&encode_ean13(text), 3, 10))
}

/// 640x480 frame with a Code 128 (code set B) barcode across the middle
pub fn code128_frame(text: &str) -> VideoFrame {
    barcode_frame(&render_row(&encode_code128(&code128_set_b(text)), 2, 10))
}

fn barcode_frame(row: &[u8]) -> VideoFrame {
    let (width, height) = (640usize, 480usize);
    let offset = (width - row.len()) / 2;

    let mut data = vec![255u8; width * height];
    for y in 120..360 {
        let start = y * width + offset;
        data[start..start + row.len()].copy_from_slice(row);
    }
    VideoFrame::from_luma(width as u32, height as u32, data)
}

/// 640x480 frame with a real QR code whose quiet zone starts at `origin`.
/// `inverted` draws light modules on a dark frame.
pub fn qr_frame(text: &str, origin: (usize, usize), inverted: bool) -> VideoFrame {
    const MODULE_PX: usize = 4;
    const QUIET_MODULES: usize = 4;
    let (width, height) = (640usize, 480usize);
    let (light, dark) = if inverted { (0u8, 255u8) } else { (255u8, 0u8) };

    let code = qrcode::QrCode::new(text.as_bytes()).unwrap();
    let modules = code.width();
    let mut data = vec![light; width * height];
    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color != qrcode::Color::Dark {
            continue;
        }
        let x0 = origin.0 + (QUIET_MODULES + i % modules) * MODULE_PX;
        let y0 = origin.1 + (QUIET_MODULES + i / modules) * MODULE_PX;
        for y in y0..y0 + MODULE_PX {
            data[y * width + x0..y * width + x0 + MODULE_PX].fill(dark);
        }
    }
    VideoFrame::from_luma(width as u32, height as u32, data)
}

/// Origin that centers the QR code of `qr_frame` in the frame
pub fn centered_qr_origin(text: &str) -> (usize, usize) {
    let side = (qrcode::QrCode::new(text.as_bytes()).unwrap().width() + 8) * 4;
    ((640 - side) / 2, (480 - side) / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_processor::tasks::linear::LinearReader;

    #[test]
    fn test_ean13_frame_decodes() {
        let frame = ean13_frame("4006381333931");
        let found = LinearReader::new(&[CodeFormat::Ean13])
            .decode(640, 480, &frame.to_luma())
            .unwrap();
        assert_eq!(found.text, "4006381333931");
    }

    #[test]
    fn test_qr_frame_places_code() {
        let frame = qr_frame("ABC-999", (8, 8), false);
        // Top-left finder pattern corner is dark, the quiet zone light
        assert_eq!(frame.luma(8 + 16, 8 + 16), 0);
        assert_eq!(frame.luma(8, 8), 255);
        assert_eq!(qr_frame("ABC-999", (8, 8), true).luma(8 + 16, 8 + 16), 255);
    }
}
