// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! Every decoding strategy implements [`DetectorStrategy`]. Synchronous
//! strategies answer with [`Detect::Ready`]; asynchronous ones hand back a
//! future the scheduler can await or spawn.

pub mod frame_crop;
pub mod linear;
pub mod multi_format;
pub mod native;
pub mod qr_detector;

pub use frame_crop::FrameCropDecoder;
pub use multi_format::MultiFormatDecoder;
pub use native::{CapabilityProvider, NativeDetector, NoPlatformDetector, PlatformDetector};

use super::types::StrategyKind;
use crate::backends::camera::VideoSink;
use crate::errors::DecodeError;
use futures::future::BoxFuture;

/// Result of one decode attempt: a value, nothing, or an error
pub type DecodeOutcome = Result<Option<String>, DecodeError>;

/// Answer of a strategy to a detect request
pub enum Detect {
    /// Decoded synchronously
    Ready(DecodeOutcome),
    /// Still running
    Pending(BoxFuture<'static, DecodeOutcome>),
}

impl Detect {
    /// Wait for the outcome. Ready answers resolve without yielding.
    pub async fn resolve(self) -> DecodeOutcome {
        match self {
            Detect::Ready(outcome) => outcome,
            Detect::Pending(future) => future.await,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Detect::Ready(_))
    }
}

impl std::fmt::Debug for Detect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detect::Ready(outcome) => f.debug_tuple("Ready").field(outcome).finish(),
            Detect::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Common capability interface of all decoding strategies
pub trait DetectorStrategy: Send + Sync {
    /// Which strategy this is
    fn kind(&self) -> StrategyKind;

    /// Try to decode a code from the live video sink
    fn detect(&self, sink: &VideoSink) -> Detect;
}
