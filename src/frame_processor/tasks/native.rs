// SPDX-License-Identifier: GPL-3.0-only

//! Platform-provided barcode detection
//!
//! A [`CapabilityProvider`] is asked once per session whether the platform
//! offers a detector. Absence is normal: the session then runs without the
//! native strategy and goes straight to the crop decoder.

use super::{Detect, DetectorStrategy};
use crate::backends::camera::{VideoFrame, VideoSink};
use crate::constants::CodeFormat;
use crate::errors::DecodeError;
use crate::frame_processor::types::StrategyKind;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, info};

/// One detection reported by a platform detector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDetection {
    pub raw_value: Option<String>,
    /// Some platforms only fill in the text field
    pub raw_text: Option<String>,
    pub format: Option<CodeFormat>,
}

impl RawDetection {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            raw_value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Decoded text, preferring `raw_value`. Empty strings count as nothing.
    pub fn value(&self) -> Option<&str> {
        self.raw_value
            .as_deref()
            .or(self.raw_text.as_deref())
            .filter(|v| !v.is_empty())
    }
}

/// A detector offered by the platform
pub trait PlatformDetector: Send + Sync {
    /// Detect codes in a frame
    fn detect(&self, frame: Arc<VideoFrame>)
    -> BoxFuture<'static, Result<Vec<RawDetection>, DecodeError>>;
}

/// Platform capability lookup, resolved once at session start
pub trait CapabilityProvider: Send + Sync {
    /// Formats the platform detector supports, if it can tell
    fn supported_formats(&self) -> Option<Vec<CodeFormat>> {
        None
    }

    /// Construct a detector for `formats`. `Ok(None)` means no detector exists.
    fn barcode_detector(
        &self,
        formats: &[CodeFormat],
    ) -> Result<Option<Arc<dyn PlatformDetector>>, DecodeError>;
}

/// Capability provider for platforms without a native detector
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlatformDetector;

impl CapabilityProvider for NoPlatformDetector {
    fn barcode_detector(
        &self,
        _formats: &[CodeFormat],
    ) -> Result<Option<Arc<dyn PlatformDetector>>, DecodeError> {
        Ok(None)
    }
}

/// Native detection strategy
pub struct NativeDetector {
    inner: Arc<dyn PlatformDetector>,
    formats: Vec<CodeFormat>,
}

impl NativeDetector {
    /// Wrap an already constructed platform detector
    pub fn new(inner: Arc<dyn PlatformDetector>, formats: Vec<CodeFormat>) -> Self {
        Self { inner, formats }
    }

    /// Ask `provider` for a detector.
    ///
    /// The provider's own format list wins over `preferred`. Construction
    /// failures are treated like a missing detector.
    pub fn resolve(provider: &dyn CapabilityProvider, preferred: &[CodeFormat]) -> Option<Self> {
        let formats = provider
            .supported_formats()
            .unwrap_or_else(|| preferred.to_vec());

        match provider.barcode_detector(&formats) {
            Ok(Some(inner)) => {
                info!(formats = ?formats, "Native barcode detector available");
                Some(Self::new(inner, formats))
            }
            Ok(None) => {
                debug!("No native barcode detector on this platform");
                None
            }
            Err(e) => {
                debug!(error = %e, "Native barcode detector unavailable");
                None
            }
        }
    }

    /// Formats the detector was constructed with
    pub fn formats(&self) -> &[CodeFormat] {
        &self.formats
    }
}

impl std::fmt::Debug for NativeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeDetector")
            .field("formats", &self.formats)
            .finish()
    }
}

impl DetectorStrategy for NativeDetector {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Native
    }

    fn detect(&self, sink: &VideoSink) -> Detect {
        let Some(frame) = sink.current_frame() else {
            return Detect::Ready(Ok(None));
        };
        let request = self.inner.detect(frame);
        Detect::Pending(
            async move {
                let detections = request.await?;
                Ok(detections
                    .iter()
                    .find_map(|d| d.value().map(str::to_string)))
            }
            .boxed(),
        )
    }
}
