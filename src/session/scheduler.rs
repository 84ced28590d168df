// SPDX-License-Identifier: GPL-3.0-only

//! Detection loops
//!
//! Two independently timed loops read the same sink:
//!
//! - the primary loop runs at frame pace. With a native detector every tick
//!   asks only the native detector. Without one, the crop decoder runs and
//!   on a miss the multi-format decoder is started in the background.
//! - the poll loop, started only with a native detector, re-asks the native
//!   detector at a slower fixed interval.
//!
//! Completions re-check the stop latch before acting, so results arriving
//! after the session ended are dropped.

use super::latch::StopLatch;
use super::result_sink::ResultSink;
use crate::backends::camera::VideoSink;
use crate::errors::DecodeError;
use crate::frame_processor::tasks::{DecodeOutcome, DetectorStrategy};
use crate::frame_processor::{AttemptOutcome, DecodedResult, DetectionAttempt, StrategyKind};
use crate::storage::DebugLog;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// The strategies available to a session
#[derive(Clone)]
pub struct Strategies {
    pub native: Option<Arc<dyn DetectorStrategy>>,
    pub crop: Arc<dyn DetectorStrategy>,
    pub multi: Arc<dyn DetectorStrategy>,
}

/// Loop timing
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub frame_interval: Duration,
    pub poll_interval: Duration,
}

/// Clears the busy flag however the decode ends
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Shared {
    sink: VideoSink,
    latch: StopLatch,
    results: Arc<ResultSink>,
    strategies: Strategies,
    busy: Arc<AtomicBool>,
    debug_log: DebugLog,
}

impl Shared {
    /// Record an attempt and report a success. Returns `true` if this outcome
    /// ended the session.
    fn handle_outcome(&self, strategy: StrategyKind, tick: u64, outcome: DecodeOutcome) -> bool {
        if self.latch.is_set() {
            debug!(strategy = %strategy, tick, "Discarding outcome after stop");
            return false;
        }

        let attempt = match outcome {
            Ok(Some(value)) => {
                DetectionAttempt::new(strategy, tick, AttemptOutcome::Success(value))
            }
            Ok(None) => DetectionAttempt::new(strategy, tick, AttemptOutcome::NoResult),
            Err(e) => {
                if let DecodeError::Unexpected(_) = e {
                    warn!(strategy = %strategy, tick, error = %e, "Decoder failed unexpectedly");
                }
                DetectionAttempt::new(strategy, tick, AttemptOutcome::Error(e.to_string()))
            }
        };
        debug!(strategy = %strategy, tick, attempt = %attempt, "Detection attempt");
        self.debug_log.append(attempt.to_string());

        match attempt.outcome {
            AttemptOutcome::Success(value) => self.results.report(&value, strategy),
            _ => false,
        }
    }

    /// Start the multi-format decoder in the background unless one is
    /// already running. Dropped requests are not queued.
    fn try_start_multi(self: &Arc<Self>, tick: u64) -> Option<JoinHandle<()>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(tick, "Multi-format decoder busy, request dropped");
            return None;
        }
        let guard = BusyGuard(Arc::clone(&self.busy));
        let detect = self.strategies.multi.detect(&self.sink);
        let shared = Arc::clone(self);
        Some(tokio::spawn(async move {
            let _guard = guard;
            let outcome = detect.resolve().await;
            shared.handle_outcome(StrategyKind::MultiFormat, tick, outcome);
        }))
    }

    /// Issue a native detect whose completion is handled on its own task
    fn spawn_native(
        self: &Arc<Self>,
        native: &Arc<dyn DetectorStrategy>,
        tick: u64,
    ) -> JoinHandle<()> {
        let detect = native.detect(&self.sink);
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = detect.resolve().await;
            shared.handle_outcome(StrategyKind::Native, tick, outcome);
        })
    }

    async fn primary_tick(self: &Arc<Self>, tick: u64) {
        if let Some(native) = &self.strategies.native {
            // At most one native detect per primary loop. The pending task is
            // detached rather than aborted if the session stops meanwhile.
            let pending = self.spawn_native(native, tick);
            tokio::select! {
                biased;
                _ = self.latch.stopped() => {}
                _ = pending => {}
            }
            return;
        }

        let outcome = self.strategies.crop.detect(&self.sink).resolve().await;
        if self.handle_outcome(StrategyKind::FrameCrop, tick, outcome) || self.latch.is_set() {
            return;
        }
        self.try_start_multi(tick);
    }

    async fn run_primary(self: Arc<Self>, frame_interval: Duration) {
        let mut interval = tokio::time::interval(frame_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tick = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = self.latch.stopped() => break,
                _ = interval.tick() => {}
            }
            if self.latch.is_set() {
                break;
            }
            if !self.sink.is_ready() {
                trace!("Video not ready, waiting for next frame");
                continue;
            }
            tick += 1;
            let start = std::time::Instant::now();
            self.primary_tick(tick).await;
            trace!(tick, elapsed_ms = start.elapsed().as_millis(), "Primary tick done");
        }
        debug!(ticks = tick, "Primary loop stopped");
    }

    async fn run_poll(self: Arc<Self>, native: Arc<dyn DetectorStrategy>, poll_interval: Duration) {
        let mut interval = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tick = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = self.latch.stopped() => break,
                _ = interval.tick() => {}
            }
            if self.latch.is_set() {
                break;
            }
            if !self.sink.is_ready() {
                continue;
            }
            tick += 1;
            self.spawn_native(&native, tick);
        }
        debug!(polls = tick, "Poll loop stopped");
    }

    /// One pass of the full fallback chain against the current frame
    async fn scan_once(self: &Arc<Self>) -> Option<DecodedResult> {
        if self.latch.is_set() {
            return None;
        }
        if !self.sink.is_ready() {
            debug!("Manual scan without video");
            self.debug_log.append("manual no video");
            return None;
        }

        if let Some(native) = &self.strategies.native {
            let outcome = native.detect(&self.sink).resolve().await;
            if self.handle_outcome(StrategyKind::Native, 0, outcome) {
                return self.results.result();
            }
        }

        let outcome = self.strategies.crop.detect(&self.sink).resolve().await;
        if self.handle_outcome(StrategyKind::FrameCrop, 0, outcome) {
            return self.results.result();
        }
        if self.latch.is_set() {
            return None;
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Multi-format decoder busy, manual request dropped");
            return None;
        }
        let _guard = BusyGuard(Arc::clone(&self.busy));
        let outcome = self.strategies.multi.detect(&self.sink).resolve().await;
        if self.handle_outcome(StrategyKind::MultiFormat, 0, outcome) {
            return self.results.result();
        }
        None
    }
}

/// Owner of the detection loops and the multi-format busy flag
pub struct DetectionScheduler {
    shared: Arc<Shared>,
    timing: Timing,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl DetectionScheduler {
    pub fn new(
        sink: VideoSink,
        latch: StopLatch,
        results: Arc<ResultSink>,
        strategies: Strategies,
        timing: Timing,
        debug_log: DebugLog,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                sink,
                latch,
                results,
                strategies,
                busy: Arc::new(AtomicBool::new(false)),
                debug_log,
            }),
            timing,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the loops. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut handles = self.handles.lock().unwrap();
        if !handles.is_empty() || self.shared.latch.is_set() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        handles.push(tokio::spawn(shared.run_primary(self.timing.frame_interval)));

        if let Some(native) = self.shared.strategies.native.clone() {
            let shared = Arc::clone(&self.shared);
            handles.push(tokio::spawn(shared.run_poll(native, self.timing.poll_interval)));
        }
        info!(
            native = self.shared.strategies.native.is_some(),
            loops = handles.len(),
            "Detection loops started"
        );
    }

    /// Set the latch and cancel both loops. In-flight detector calls are left
    /// to finish; their results are discarded.
    pub fn stop(&self) {
        self.shared.latch.set();
        let handles: Vec<_> = self.handles.lock().unwrap().drain(..).collect();
        if !handles.is_empty() {
            for handle in handles {
                handle.abort();
            }
            info!("Detection loops cancelled");
        }
    }

    /// Run the fallback chain once, independent of the loops
    pub async fn scan_now(&self) -> Option<DecodedResult> {
        self.shared.scan_once().await
    }

    /// Whether a multi-format decode is in flight
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::SeqCst)
    }

    /// Request a background multi-format decode; `None` if one is running
    pub fn request_multi_format(&self) -> Option<JoinHandle<()>> {
        self.shared.try_start_multi(0)
    }
}

impl Drop for DetectionScheduler {
    fn drop(&mut self) {
        for handle in self.handles.get_mut().unwrap().drain(..) {
            handle.abort();
        }
    }
}
