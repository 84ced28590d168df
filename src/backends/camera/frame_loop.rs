// SPDX-License-Identifier: GPL-3.0-only
//! Capture threads feeding a [`VideoSink`]
//!
//! A capture thread owns the device stream and pushes every grabbed frame
//! into the sink. It ends when stopped, when the grab callback reports the
//! end of the stream, or when the sink is detached.
//!
//! Stopping never waits for the thread: a grab may be blocked in the driver,
//! so the thread notices the stop flag after its current grab returns and
//! then drops its state on its own.

use super::types::VideoFrame;
use super::video_sink::VideoSink;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// Result of one grab from the device
#[derive(Debug)]
pub enum Grab {
    /// A frame to publish
    Frame(VideoFrame),
    /// Nothing this time (timeout, transient error)
    Skip,
    /// The stream is gone
    End,
}

/// Handle to a running capture thread
pub struct CaptureThread {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    name: String,
}

impl CaptureThread {
    /// Spawn a thread that calls `grab` until stopped and publishes frames.
    ///
    /// `state` is moved into the thread, so device handles never cross
    /// back to the caller.
    pub fn spawn<S, F>(name: &str, mut state: S, sink: VideoSink, mut grab: F) -> Self
    where
        S: Send + 'static,
        F: FnMut(&mut S) -> Grab + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread_name = name.to_string();

        info!(name = %name, "Starting capture thread");

        let handle = thread::spawn(move || {
            let mut published = 0u64;
            while !thread_stop.load(Ordering::SeqCst) {
                match grab(&mut state) {
                    Grab::Frame(frame) => {
                        if !sink.push_frame(Arc::new(frame)) {
                            debug!(name = %thread_name, "Sink detached");
                            break;
                        }
                        published += 1;
                    }
                    Grab::Skip => {}
                    Grab::End => {
                        debug!(name = %thread_name, "Stream ended");
                        break;
                    }
                }
            }
            info!(name = %thread_name, frames = published, "Capture thread exiting");
        });

        Self {
            handle: Some(handle),
            stop,
            name: name.to_string(),
        }
    }

    /// Whether the thread is still inside its grab loop. Always false once
    /// stopped.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Ask the thread to stop and detach from it
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!(name = %self.name, "Capture thread detached while grabbing");
            }
        }
    }
}

impl Drop for CaptureThread {
    fn drop(&mut self) {
        self.stop();
    }
}
