// SPDX-License-Identifier: GPL-3.0-only

//! Barcode Scanner - camera based QR and barcode scanning
//!
//! Decodes a machine-readable code from a live camera feed and hands the
//! text to the caller exactly once.
//!
//! # Architecture
//!
//! - [`backends`]: Camera sources, video tracks and the frame sink
//! - [`frame_processor`]: Decoding strategies (native, crop, multi-format)
//! - [`session`]: Camera lifecycle, detection loops and result delivery
//! - [`config`]: User configuration handling
//! - [`storage`]: Persistent debug log
//!
//! # Example
//!
//! ```ignore
//! let scanner = Scanner::builder(Config::load())
//!     .on_detected(|code| println!("{}", code))
//!     .mount()
//!     .await;
//! let result = scanner.wait_for_result().await;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod frame_processor;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Config;
pub use constants::CodeFormat;
pub use errors::{CameraAccessError, ScannerError, ScannerResult};
pub use frame_processor::{DecodedResult, StrategyKind};
pub use session::{Scanner, ScannerBuilder, SessionState};
