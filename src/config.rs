// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{FacingMode, StreamConstraints};
use crate::constants::{
    APP_DIR_NAME, CodeFormat, DEFAULT_CROP_FRACTION, DEFAULT_CROP_TARGET_SIZE,
    DEFAULT_FRAME_INTERVAL, DEFAULT_MULTI_FORMAT_TIMEOUT, DEFAULT_POLL_INTERVAL,
    DEFAULT_RESOLUTION,
};
use crate::errors::{ScannerError, ScannerResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Requested capture resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: DEFAULT_RESOLUTION.0,
            height: DEFAULT_RESOLUTION.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Begin camera acquisition as soon as the scanner is mounted
    pub auto_start: bool,
    /// Presentation only, never changes decode behavior
    pub minimal_view: bool,
    /// Record attempts in the persistent debug log
    pub show_debug: bool,
    /// Preferred camera facing
    pub facing_mode: FacingMode,
    /// Explicit device path, overrides `facing_mode`
    pub device: Option<String>,
    pub resolution: Resolution,
    /// Primary loop period
    pub frame_interval_ms: u64,
    /// Native detector poll period
    pub poll_interval_ms: u64,
    /// Crop window side relative to the smaller frame dimension
    pub crop_fraction: f32,
    /// Side of the buffer the crop window is scaled into
    pub crop_target_size: u32,
    /// How long one multi-format decode watches the sink
    pub multi_format_timeout_ms: u64,
    /// Formats requested from the native detector
    pub preferred_formats: Vec<CodeFormat>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_start: true,
            minimal_view: false,
            show_debug: false,
            facing_mode: FacingMode::Environment,
            device: None,
            resolution: Resolution::default(),
            frame_interval_ms: DEFAULT_FRAME_INTERVAL.as_millis() as u64,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            crop_fraction: DEFAULT_CROP_FRACTION,
            crop_target_size: DEFAULT_CROP_TARGET_SIZE,
            multi_format_timeout_ms: DEFAULT_MULTI_FORMAT_TIMEOUT.as_millis() as u64,
            preferred_formats: CodeFormat::DEFAULT_PREFERRED.to_vec(),
        }
    }
}

impl Config {
    /// Default config file location (`~/.config/barcode-scanner/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("config.json"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`. Missing or invalid files yield the defaults.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    fn try_load_from(path: &Path) -> ScannerResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)
            .map_err(|e| ScannerError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(Some(config))
    }

    pub fn save_to(&self, path: &Path) -> ScannerResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Crop fraction clamped to (0.1, 1.0]
    pub fn crop_fraction(&self) -> f32 {
        if self.crop_fraction.is_nan() {
            return DEFAULT_CROP_FRACTION;
        }
        self.crop_fraction.clamp(0.1, 1.0)
    }

    pub fn crop_target_size(&self) -> u32 {
        self.crop_target_size.max(1)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn multi_format_timeout(&self) -> Duration {
        Duration::from_millis(self.multi_format_timeout_ms.max(1))
    }

    /// Camera constraints derived from this config
    pub fn stream_constraints(&self) -> StreamConstraints {
        StreamConstraints {
            facing_mode: self.facing_mode,
            device: self.device.clone(),
            width: self.resolution.width,
            height: self.resolution.height,
        }
    }
}
