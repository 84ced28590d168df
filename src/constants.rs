// SPDX-License-Identifier: GPL-3.0-only

//! Scanner-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application identifier used for config and data directories
pub const APP_DIR_NAME: &str = "barcode-scanner";

/// Fixed storage key of the persisted debug log
pub const DEBUG_LOG_KEY: &str = "scanner_debug_logs";

/// Maximum number of persisted debug log entries
pub const DEBUG_LOG_CAPACITY: usize = 200;

/// Minimum time between two writes of the debug log to its store
pub const DEBUG_LOG_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Number of debug entries shown in the on-screen debug panel
pub const DEBUG_PANEL_ENTRIES: usize = 20;

/// Fraction of the smaller frame dimension covered by the crop window
pub const DEFAULT_CROP_FRACTION: f32 = 0.6;

/// Side length of the buffer the crop window is scaled into
pub const DEFAULT_CROP_TARGET_SIZE: u32 = 320;

/// Longest side used when decoding whole frames
pub const FULL_FRAME_MAX_DIMENSION: u32 = 640;

/// Frame-paced loop interval (roughly one display refresh)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Redundant native-detector poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// How long a single multi-format decode keeps watching the sink
pub const DEFAULT_MULTI_FORMAT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Default capture resolution requested from the camera
pub const DEFAULT_RESOLUTION: (u32, u32) = (640, 480);

/// Machine-readable code formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeFormat {
    QrCode,
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "ean_8")]
    Ean8,
    UpcA,
    UpcE,
    #[serde(rename = "code_128")]
    Code128,
    #[serde(rename = "code_39")]
    Code39,
    DataMatrix,
}

impl CodeFormat {
    /// Preferred formats when the platform does not report its own list
    pub const DEFAULT_PREFERRED: [CodeFormat; 4] = [
        CodeFormat::QrCode,
        CodeFormat::Ean13,
        CodeFormat::Code128,
        CodeFormat::Ean8,
    ];

    /// Wire name of the format (e.g. `qr_code`)
    pub fn name(&self) -> &'static str {
        match self {
            CodeFormat::QrCode => "qr_code",
            CodeFormat::Ean13 => "ean_13",
            CodeFormat::Ean8 => "ean_8",
            CodeFormat::UpcA => "upc_a",
            CodeFormat::UpcE => "upc_e",
            CodeFormat::Code128 => "code_128",
            CodeFormat::Code39 => "code_39",
            CodeFormat::DataMatrix => "data_matrix",
        }
    }

    /// Whether this is a linear (1D) barcode format
    pub fn is_linear(&self) -> bool {
        !matches!(self, CodeFormat::QrCode | CodeFormat::DataMatrix)
    }
}

impl std::fmt::Display for CodeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
