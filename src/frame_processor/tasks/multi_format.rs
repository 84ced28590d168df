// SPDX-License-Identifier: GPL-3.0-only

//! Asynchronous multi-format decoder
//!
//! Slower than the crop decoder but covers the whole frame and linear
//! barcodes. Each invocation builds its own short-lived reader which watches
//! the live sink until it decodes something or gives up.

use super::frame_crop::catch_decode;
use super::linear::LinearReader;
use super::qr_detector::{decode_luma_both, downscale_frame};
use super::{DecodeOutcome, Detect, DetectorStrategy};
use crate::backends::camera::{VideoFrame, VideoSink};
use crate::constants::{CodeFormat, DEFAULT_MULTI_FORMAT_TIMEOUT, FULL_FRAME_MAX_DIMENSION};
use crate::errors::DecodeError;
use crate::frame_processor::types::StrategyKind;
use futures::future::FutureExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Strategy handle; cheap to share between the loops and manual scans
#[derive(Debug, Clone)]
pub struct MultiFormatDecoder {
    formats: Vec<CodeFormat>,
    timeout: Duration,
    max_dimension: u32,
}

impl Default for MultiFormatDecoder {
    fn default() -> Self {
        Self::new(
            CodeFormat::DEFAULT_PREFERRED.to_vec(),
            DEFAULT_MULTI_FORMAT_TIMEOUT,
        )
    }
}

impl MultiFormatDecoder {
    /// Decoder for `formats`. UPC-A is implied by EAN-13. Formats no
    /// reader can decode are dropped with a warning.
    pub fn new(mut formats: Vec<CodeFormat>, timeout: Duration) -> Self {
        if formats.contains(&CodeFormat::Ean13) && !formats.contains(&CodeFormat::UpcA) {
            formats.push(CodeFormat::UpcA);
        }
        let (formats, unsupported): (Vec<_>, Vec<_>) = formats
            .into_iter()
            .partition(|f| *f == CodeFormat::QrCode || LinearReader::supports(*f));
        if !unsupported.is_empty() {
            warn!(formats = ?unsupported, "Ignoring formats the decoder cannot read");
        }
        Self {
            formats,
            timeout,
            max_dimension: FULL_FRAME_MAX_DIMENSION,
        }
    }

    /// Decode a still frame on the current thread
    pub fn decode_still(&self, frame: &VideoFrame) -> DecodeOutcome {
        let reader = MultiFormatReader::new(&self.formats, self.max_dimension);
        catch_decode("Multi-format decoder", || reader.decode_frame(frame))
    }
}

impl DetectorStrategy for MultiFormatDecoder {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MultiFormat
    }

    fn detect(&self, sink: &VideoSink) -> Detect {
        let sink = sink.clone();
        let timeout = self.timeout;
        let mut reader = MultiFormatReader::new(&self.formats, self.max_dimension);
        Detect::Pending(
            async move {
                let outcome = reader.decode_once(&sink, timeout).await;
                reader.reset();
                outcome
            }
            .boxed(),
        )
    }
}

/// One-shot reader over a live sink
#[derive(Debug, Clone)]
pub struct MultiFormatReader {
    qr: bool,
    linear: LinearReader,
    max_dimension: u32,
    frames_tried: u32,
}

impl MultiFormatReader {
    pub fn new(formats: &[CodeFormat], max_dimension: u32) -> Self {
        Self {
            qr: formats.contains(&CodeFormat::QrCode),
            linear: LinearReader::new(formats),
            max_dimension: max_dimension.max(1),
            frames_tried: 0,
        }
    }

    /// Try the current frame, then every new frame, until something decodes
    /// or `timeout` elapses. A timeout is not an error.
    pub async fn decode_once(&mut self, sink: &VideoSink, timeout: Duration) -> DecodeOutcome {
        let start = Instant::now();
        match tokio::time::timeout(timeout, self.watch(sink)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                debug!(
                    frames = self.frames_tried,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Multi-format decode timed out"
                );
                Ok(None)
            }
        }
    }

    async fn watch(&mut self, sink: &VideoSink) -> DecodeOutcome {
        // Subscribe first so frames published during a decode are not missed
        let mut frames = sink.subscribe();
        loop {
            if !sink.is_attached() {
                return Ok(None);
            }
            let frame = frames.borrow_and_update().clone();
            if let Some(frame) = frame {
                if let Some(value) = self.try_frame(frame).await? {
                    return Ok(Some(value));
                }
            }
            if frames.changed().await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn try_frame(&mut self, frame: Arc<VideoFrame>) -> DecodeOutcome {
        self.frames_tried += 1;
        let reader = self.clone();
        tokio::task::spawn_blocking(move || reader.decode_frame(&frame))
            .await
            .map_err(|e| DecodeError::Unexpected(format!("decode task failed: {}", e)))
    }

    /// Linear barcodes first, then full-frame QR
    pub fn decode_frame(&self, frame: &VideoFrame) -> Option<String> {
        let (luma, width, height) = downscale_frame(frame, self.max_dimension);
        let (width, height) = (width as usize, height as usize);

        if self.linear.is_enabled() {
            if let Some(found) = self.linear.decode(width, height, &luma) {
                trace!(format = %found.format, "Multi-format reader found linear code");
                return Some(found.text);
            }
        }
        if self.qr {
            return decode_luma_both(width, height, luma);
        }
        None
    }

    /// Release per-attempt state
    pub fn reset(&mut self) {
        trace!(frames = self.frames_tried, "Multi-format reader reset");
        self.frames_tried = 0;
    }

    pub fn frames_tried(&self) -> u32 {
        self.frames_tried
    }
}
