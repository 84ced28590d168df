// SPDX-License-Identifier: GPL-3.0-only

//! Camera stream ownership
//!
//! The session is the only place that touches the acquired stream. Release
//! may be requested from several completion paths at once (a decoded result,
//! an explicit cancel, a drop) and only the first request has any effect.

use crate::backends::camera::{CameraSource, MediaStream, StreamConstraints, VideoSink};
use crate::errors::CameraAccessError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub struct CameraSession {
    source: Arc<dyn CameraSource>,
    sink: VideoSink,
    stream: Mutex<Option<MediaStream>>,
    released: AtomicBool,
    torch_available: AtomicBool,
    torch_on: AtomicBool,
}

impl CameraSession {
    pub fn new(source: Arc<dyn CameraSource>, sink: VideoSink) -> Self {
        Self {
            source,
            sink,
            stream: Mutex::new(None),
            released: AtomicBool::new(false),
            torch_available: AtomicBool::new(false),
            torch_on: AtomicBool::new(false),
        }
    }

    /// The sink frames are delivered into
    pub fn sink(&self) -> &VideoSink {
        &self.sink
    }

    /// Open a stream, attach it to the sink and start playback.
    ///
    /// If the session is released while the device is being opened, the new
    /// stream is stopped right away and [`CameraAccessError::Aborted`] is
    /// returned.
    pub async fn acquire(&self, constraints: StreamConstraints) -> Result<(), CameraAccessError> {
        if self.is_released() {
            return Err(CameraAccessError::Aborted);
        }

        let source = Arc::clone(&self.source);
        let stream = tokio::task::spawn_blocking(move || source.open(&constraints))
            .await
            .map_err(|e| CameraAccessError::InitializationFailed(e.to_string()))??;

        if stream.video_tracks().is_empty() {
            return Err(CameraAccessError::NoCameraFound);
        }

        self.sink.attach();
        for track in stream.video_tracks() {
            if let Err(e) = track.start(self.sink.clone()) {
                stream.stop_all();
                self.sink.detach();
                return Err(e.into());
            }
        }

        *self.stream.lock().unwrap() = Some(stream);

        // A release that ran while the device was opening found no stream
        if self.is_released() {
            if let Some(stream) = self.stream.lock().unwrap().take() {
                stream.stop_all();
            }
            self.sink.detach();
            debug!("Camera released during acquisition");
            return Err(CameraAccessError::Aborted);
        }

        info!("Camera stream acquired");
        Ok(())
    }

    /// Query the primary track for torch support.
    ///
    /// Only an explicit `torch: Some(true)` counts; errors yield `false`.
    pub fn detect_torch_capability(&self) -> bool {
        let available = self
            .stream
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|stream| stream.primary_track().cloned())
            .and_then(|track| track.capabilities().ok())
            .is_some_and(|caps| caps.torch == Some(true));

        self.torch_available.store(available, Ordering::SeqCst);
        debug!(available, "Torch capability detected");
        available
    }

    /// Best-effort torch request. No-op without torch support; a rejected
    /// request disables the torch for the rest of the session.
    pub fn toggle_torch(&self, on: bool) {
        if !self.torch_available() {
            return;
        }
        let track = self
            .stream
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|stream| stream.primary_track().cloned());
        let Some(track) = track else {
            return;
        };

        match track.apply_torch(on) {
            Ok(()) => self.torch_on.store(on, Ordering::SeqCst),
            Err(e) => {
                debug!(error = %e, "Torch request rejected, disabling torch");
                self.torch_available.store(false, Ordering::SeqCst);
                self.torch_on.store(false, Ordering::SeqCst);
            }
        }
    }

    pub fn torch_available(&self) -> bool {
        self.torch_available.load(Ordering::SeqCst)
    }

    pub fn torch_on(&self) -> bool {
        self.torch_on.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Stop every track and detach the sink. Only the first call does
    /// anything; returns whether this call released the camera.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }

        let stream = self.stream.lock().unwrap().take();
        if let Some(stream) = stream {
            if let Some(track) = stream.primary_track() {
                if let Err(e) = track.apply_torch(false) {
                    debug!(error = %e, "Ignoring torch-off failure during release");
                }
            }
            stream.stop_all();
            info!("Camera stream released");
        }
        self.sink.detach();
        self.torch_on.store(false, Ordering::SeqCst);
        self.torch_available.store(false, Ordering::SeqCst);
        true
    }
}
