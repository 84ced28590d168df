// SPDX-License-Identifier: GPL-3.0-only

//! Exactly-once result delivery
//!
//! The first successful decode wins: it stops everything, releases the
//! camera and reaches the caller's callback. Everything after that is
//! discarded.

use super::camera_session::CameraSession;
use super::latch::StopLatch;
use crate::frame_processor::tasks::frame_crop::panic_message;
use crate::frame_processor::{DecodedResult, StrategyKind};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Callback receiving the decoded text
pub type DetectedCallback = Box<dyn FnOnce(String) + Send + 'static>;

pub struct ResultSink {
    terminal: AtomicBool,
    latch: StopLatch,
    camera: Arc<CameraSession>,
    result: Mutex<Option<DecodedResult>>,
    callback: Mutex<Option<DetectedCallback>>,
    done: watch::Sender<bool>,
}

impl ResultSink {
    pub fn new(
        latch: StopLatch,
        camera: Arc<CameraSession>,
        callback: Option<DetectedCallback>,
    ) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            terminal: AtomicBool::new(false),
            latch,
            camera,
            result: Mutex::new(None),
            callback: Mutex::new(callback),
            done,
        }
    }

    /// Hand in a decoded value.
    ///
    /// Returns `true` if this report ended the session. Empty values and
    /// reports after the session ended are ignored.
    pub fn report(&self, value: &str, strategy: StrategyKind) -> bool {
        let Some(result) = DecodedResult::new(value, strategy) else {
            debug!(strategy = %strategy, "Ignoring empty decode result");
            return false;
        };
        if self
            .terminal
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(strategy = %strategy, "Discarding result after session end");
            return false;
        }

        self.latch.set();
        self.camera.release();
        *self.result.lock().unwrap() = Some(result.clone());
        info!(strategy = %strategy, value = %result.value, "Code detected");

        let callback = self.callback.lock().unwrap().take();
        if let Some(callback) = callback {
            let value = result.value;
            if let Err(panic) = catch_unwind(AssertUnwindSafe(move || callback(value))) {
                warn!(error = %panic_message(panic.as_ref()), "Detection callback panicked");
            }
        }

        self.done.send_replace(true);
        true
    }

    /// End the session without a result. Later reports become no-ops.
    ///
    /// Returns `true` if the sink was still open.
    pub fn close(&self) -> bool {
        let was_open = !self.terminal.swap(true, Ordering::SeqCst);
        if was_open {
            self.callback.lock().unwrap().take();
            self.done.send_replace(true);
        }
        was_open
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.load(Ordering::SeqCst)
    }

    pub fn result(&self) -> Option<DecodedResult> {
        self.result.lock().unwrap().clone()
    }

    /// Wait until a result was reported or the sink was closed
    pub async fn wait(&self) -> Option<DecodedResult> {
        let mut done = self.done.subscribe();
        // The sender lives as long as `self`
        let _ = done.wait_for(|finished| *finished).await;
        self.result()
    }
}
