// SPDX-License-Identifier: GPL-3.0-only

//! Synchronous QR decode of the centered crop window
//!
//! The crop is always resampled to a fixed square buffer so the decode cost
//! does not grow with the camera resolution.

use super::qr_detector::{decode_luma_both, sample_window};
use super::{Detect, DetectorStrategy};
use crate::backends::camera::{VideoFrame, VideoSink};
use crate::constants::{DEFAULT_CROP_FRACTION, DEFAULT_CROP_TARGET_SIZE};
use crate::errors::DecodeError;
use crate::frame_processor::types::{CropWindow, StrategyKind};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;
use tracing::{trace, warn};

#[derive(Debug, Clone)]
pub struct FrameCropDecoder {
    crop_fraction: f32,
    target_size: u32,
}

impl Default for FrameCropDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_CROP_FRACTION, DEFAULT_CROP_TARGET_SIZE)
    }
}

impl FrameCropDecoder {
    pub fn new(crop_fraction: f32, target_size: u32) -> Self {
        Self {
            crop_fraction,
            target_size: target_size.max(1),
        }
    }

    /// Crop window used for a frame of the given size
    pub fn window_for(&self, width: u32, height: u32) -> CropWindow {
        CropWindow::centered(width, height, self.crop_fraction)
    }

    /// Decode a single frame
    pub fn decode_frame(&self, frame: &VideoFrame) -> Result<Option<String>, DecodeError> {
        let start = Instant::now();
        let window = self.window_for(frame.width, frame.height);
        if window.size == 0 {
            return Ok(None);
        }

        let target = self.target_size;
        let result = catch_decode("Crop decoder", || {
            let buffer = sample_window(frame, window, target);
            decode_luma_both(target as usize, target as usize, buffer)
        });

        trace!(
            window = ?window,
            elapsed_ms = start.elapsed().as_millis(),
            "Crop decode finished"
        );
        result
    }
}

impl DetectorStrategy for FrameCropDecoder {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FrameCrop
    }

    fn detect(&self, sink: &VideoSink) -> Detect {
        match sink.current_frame() {
            Some(frame) => Detect::Ready(self.decode_frame(&frame)),
            None => Detect::Ready(Ok(None)),
        }
    }
}

/// Run a synchronous decode, turning a panic inside the decoder into
/// [`DecodeError::Unexpected`]
pub(crate) fn catch_decode<F>(decoder: &str, decode: F) -> Result<Option<String>, DecodeError>
where
    F: FnOnce() -> Option<String>,
{
    catch_unwind(AssertUnwindSafe(decode)).map_err(|panic| {
        let message = panic_message(panic.as_ref());
        warn!(decoder, error = %message, "Decoder failed unexpectedly");
        DecodeError::Unexpected(message)
    })
}

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
