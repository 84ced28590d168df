// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame processing results
//!
//! These types describe which decoding strategy ran, what it produced, and
//! where in the frame it looked.

use std::fmt;
use std::time::SystemTime;

/// The decoding strategies, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Platform-provided detector
    Native,
    /// Synchronous QR decode of the centered crop window
    FrameCrop,
    /// Slower asynchronous decoder with 1D barcode support
    MultiFormat,
}

impl StrategyKind {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Native => "native",
            StrategyKind::FrameCrop => "frame-crop",
            StrategyKind::MultiFormat => "multi-format",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one detection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A code was decoded
    Success(String),
    /// Nothing found in the frame
    NoResult,
    /// The strategy failed
    Error(String),
}

/// One strategy run, used for branching and debug logging only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionAttempt {
    pub strategy: StrategyKind,
    /// Scheduler tick that issued the attempt (0 for manual scans)
    pub tick: u64,
    pub outcome: AttemptOutcome,
}

impl DetectionAttempt {
    pub fn new(strategy: StrategyKind, tick: u64, outcome: AttemptOutcome) -> Self {
        Self {
            strategy,
            tick,
            outcome,
        }
    }
}

impl fmt::Display for DetectionAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Success(value) => {
                write!(f, "{} #{} detected {}", self.strategy, self.tick, value)
            }
            AttemptOutcome::NoResult => write!(f, "{} #{} none", self.strategy, self.tick),
            AttemptOutcome::Error(e) => write!(f, "{} #{} err {}", self.strategy, self.tick, e),
        }
    }
}

/// The final decoded value of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResult {
    /// Decoded text, never empty
    pub value: String,
    /// Strategy that produced the value
    pub strategy: StrategyKind,
    /// When the value was reported
    pub decoded_at: SystemTime,
}

impl DecodedResult {
    /// Create a result, rejecting empty values
    pub fn new(value: impl Into<String>, strategy: StrategyKind) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            return None;
        }
        Some(Self {
            value,
            strategy,
            decoded_at: SystemTime::now(),
        })
    }
}

/// A centered square region of a frame, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl CropWindow {
    /// Centered square covering `fraction` of the smaller frame dimension
    pub fn centered(frame_width: u32, frame_height: u32, fraction: f32) -> Self {
        let min_dim = frame_width.min(frame_height);
        let size = ((min_dim as f32 * fraction).floor() as u32).clamp(1.min(min_dim), min_dim);
        Self {
            x: (frame_width - size) / 2,
            y: (frame_height - size) / 2,
            size,
        }
    }
}
