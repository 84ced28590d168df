// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing for code detection
//!
//! Three interchangeable strategies read from the live [`VideoSink`]:
//! the platform detector, the synchronous crop decoder and the slower
//! multi-format decoder. The session decides when each one runs.
//!
//! [`VideoSink`]: crate::backends::camera::VideoSink

pub mod tasks;
pub mod types;

pub use tasks::{
    CapabilityProvider, Detect, DetectorStrategy, FrameCropDecoder, MultiFormatDecoder,
    NativeDetector, NoPlatformDetector, PlatformDetector,
};
pub use types::{AttemptOutcome, CropWindow, DecodedResult, DetectionAttempt, StrategyKind};
