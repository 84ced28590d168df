// SPDX-License-Identifier: GPL-3.0-only

//! Latest-frame slot shared between a capture thread and the detectors
//!
//! The sink only ever holds the most recent frame. Tracks push into it while
//! attached; detectors read the current frame or subscribe to new ones.

use super::types::VideoFrame;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::debug;

struct SinkInner {
    slot: watch::Sender<Option<Arc<VideoFrame>>>,
    attached: AtomicBool,
}

/// Cloneable handle to the live video output
#[derive(Clone)]
pub struct VideoSink {
    inner: Arc<SinkInner>,
}

impl Default for VideoSink {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSink {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            inner: Arc::new(SinkInner {
                slot,
                attached: AtomicBool::new(false),
            }),
        }
    }

    /// Start accepting frames
    pub fn attach(&self) {
        debug!("Video sink attached");
        self.inner.attached.store(true, Ordering::SeqCst);
    }

    /// Stop accepting frames and drop the current one
    pub fn detach(&self) {
        if self.inner.attached.swap(false, Ordering::SeqCst) {
            debug!("Video sink detached");
        }
        self.inner.slot.send_replace(None);
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached.load(Ordering::SeqCst)
    }

    /// Publish a frame. Ignored while detached.
    ///
    /// Returns whether the frame was accepted.
    pub fn push_frame(&self, frame: Arc<VideoFrame>) -> bool {
        if !self.is_attached() {
            return false;
        }
        self.inner.slot.send_replace(Some(frame));
        true
    }

    /// Whether a frame is available to decode
    pub fn is_ready(&self) -> bool {
        self.is_attached() && self.inner.slot.borrow().is_some()
    }

    /// The most recent frame, if any
    pub fn current_frame(&self) -> Option<Arc<VideoFrame>> {
        if !self.is_attached() {
            return None;
        }
        self.inner.slot.borrow().clone()
    }

    /// Receiver observing every published frame.
    ///
    /// The current frame counts as already seen.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<VideoFrame>>> {
        self.inner.slot.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(seq: u64) -> Arc<VideoFrame> {
        Arc::new(VideoFrame::from_luma(2, 2, vec![0; 4]).with_sequence(seq))
    }

    #[test]
    fn test_detached_sink_drops_frames() {
        let sink = VideoSink::new();
        assert!(!sink.push_frame(frame(1)));
        assert!(!sink.is_ready());

        sink.attach();
        assert!(sink.push_frame(frame(2)));
        assert!(sink.is_ready());
        assert_eq!(sink.current_frame().map(|f| f.sequence), Some(2));

        sink.detach();
        assert!(!sink.is_ready());
        assert!(sink.current_frame().is_none());
    }

    #[test]
    fn test_subscriber_sees_new_frames_and_detach() {
        let sink = VideoSink::new();
        sink.attach();
        sink.push_frame(frame(1));

        let mut rx = sink.subscribe();
        assert!(!rx.has_changed().unwrap());

        sink.push_frame(frame(2));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|f| f.sequence), Some(2));

        sink.detach();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
    }
}
