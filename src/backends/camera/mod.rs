// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │    CameraSession    │  ← Acquire / release, torch state
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraSource Trait │  ← Opens a MediaStream
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  VideoTrack Trait   │  ← Frames into the VideoSink, torch, stop
//! └──────────┬──────────┘
//!            │
//!            ▼
//!        ┌──────┐
//!        │ V4L2 │  ← Concrete implementation
//!        └──────┘
//! ```

pub mod frame_loop;
pub mod types;
pub mod v4l2;
pub mod video_sink;

pub use types::*;
pub use video_sink::VideoSink;

use crate::errors::{CameraAccessError, TrackError};
use std::sync::Arc;

/// A single video track of an acquired stream
pub trait VideoTrack: Send + Sync {
    /// Human readable label (device name)
    fn label(&self) -> &str;

    /// Capabilities of the underlying device
    fn capabilities(&self) -> Result<TrackCapabilities, TrackError>;

    /// Switch the torch (continuous flash) on or off
    fn apply_torch(&self, on: bool) -> Result<(), TrackError>;

    /// Begin delivering frames into `sink`
    fn start(&self, sink: VideoSink) -> Result<(), TrackError>;

    /// Stop frame delivery and release the device
    fn stop(&self);
}

/// An acquired camera stream
pub struct MediaStream {
    tracks: Vec<Arc<dyn VideoTrack>>,
}

impl MediaStream {
    pub fn new(tracks: Vec<Arc<dyn VideoTrack>>) -> Self {
        Self { tracks }
    }

    /// All video tracks of the stream
    pub fn video_tracks(&self) -> &[Arc<dyn VideoTrack>] {
        &self.tracks
    }

    /// First video track, the one torch requests go to
    pub fn primary_track(&self) -> Option<&Arc<dyn VideoTrack>> {
        self.tracks.first()
    }

    /// Stop every track of the stream
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self.tracks.iter().map(|t| t.label()).collect();
        f.debug_struct("MediaStream").field("tracks", &labels).finish()
    }
}

/// Something that can open camera streams
pub trait CameraSource: Send + Sync {
    /// Enumerate available cameras
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Open a stream matching `constraints`.
    ///
    /// May block while the device is opened.
    fn open(&self, constraints: &StreamConstraints) -> Result<MediaStream, CameraAccessError>;
}

/// Get the default camera source (V4L2)
pub fn get_backend() -> Arc<dyn CameraSource> {
    Arc::new(v4l2::V4l2Source::new())
}
