// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Pixel layouts a [`VideoFrame`] can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Gray8 - 8-bit luma (1 byte per pixel)
    Gray8,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved, 2 bytes per pixel)
    YUYV,
}

impl PixelFormat {
    /// Bytes per pixel in the packed row
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::YUYV => 2,
        }
    }
}

/// A single frame delivered by a video track
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel data, `stride` bytes per row
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Monotonic sequence number assigned by the track
    pub sequence: u64,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl VideoFrame {
    /// Create a tightly packed grayscale frame
    pub fn from_luma(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data),
            format: PixelFormat::Gray8,
            stride: width,
            sequence: 0,
            captured_at: Instant::now(),
        }
    }

    /// Set the sequence number (builder style)
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Luma of a single pixel, 0 for out-of-range coordinates
    pub fn luma(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let row = y as usize * self.stride as usize;
        let x = x as usize;
        match self.format {
            PixelFormat::Gray8 => self.data.get(row + x).copied().unwrap_or(0),
            PixelFormat::YUYV => self.data.get(row + x * 2).copied().unwrap_or(0),
        }
    }

    /// Copy the frame into a tightly packed luma buffer
    pub fn to_luma(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                result.push(self.luma(x, y));
            }
        }
        result
    }
}

/// Which way the requested camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera, pointing away from the user
    #[default]
    Environment,
    /// Front camera, pointing at the user
    User,
}

impl FacingMode {
    /// Name fragments that suggest a device faces this way
    pub fn name_hints(&self) -> &'static [&'static str] {
        match self {
            FacingMode::Environment => &["back", "rear", "world", "environment"],
            FacingMode::User => &["front", "user", "integrated", "facetime"],
        }
    }
}

/// Constraints used when requesting a camera stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Preferred camera facing
    pub facing_mode: FacingMode,
    /// Explicit device path (overrides facing preference)
    pub device: Option<String>,
    /// Requested frame width
    pub width: u32,
    /// Requested frame height
    pub height: u32,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        let (width, height) = crate::constants::DEFAULT_RESOLUTION;
        Self {
            facing_mode: FacingMode::Environment,
            device: None,
            width,
            height,
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Human readable name (V4L2 card)
    pub name: String,
    /// Device path (e.g., /dev/video0)
    pub path: String,
    /// Driver name, if known
    pub driver: Option<String>,
}

/// Capabilities reported by a video track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackCapabilities {
    /// `Some(true)` only when the platform explicitly reports torch support
    pub torch: Option<bool>,
    /// Negotiated frame width
    pub width: Option<u32>,
    /// Negotiated frame height
    pub height: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_respects_stride() {
        // 2x2 gray frame with 2 bytes of row padding
        let frame = VideoFrame {
            width: 2,
            height: 2,
            data: Arc::from(vec![10u8, 20, 0, 0, 30, 40, 0, 0]),
            format: PixelFormat::Gray8,
            stride: 4,
            sequence: 0,
            captured_at: Instant::now(),
        };

        assert_eq!(frame.to_luma(), vec![10, 20, 30, 40]);
        assert_eq!(frame.luma(5, 5), 0);
    }

    #[test]
    fn test_luma_from_yuyv() {
        let yuyv = VideoFrame {
            width: 2,
            height: 1,
            data: Arc::from(vec![100u8, 128, 200, 128]),
            format: PixelFormat::YUYV,
            stride: 4,
            sequence: 0,
            captured_at: Instant::now(),
        };
        assert_eq!(yuyv.to_luma(), vec![100, 200]);
        assert_eq!(yuyv.luma(1, 0), 200);
    }
}
