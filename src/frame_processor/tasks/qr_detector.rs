// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection helpers
//!
//! Wraps `rqrr` for 8-bit luma buffers and provides the resampling used to
//! bound decode cost independently of the camera resolution.

use crate::backends::camera::VideoFrame;
use crate::frame_processor::types::CropWindow;
use tracing::{debug, trace};

/// Decode a tightly packed luma buffer with `rqrr`
pub fn decode_luma(width: usize, height: usize, data: &[u8]) -> Option<String> {
    if width == 0 || height == 0 || data.len() < width * height {
        return None;
    }

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
        data[y * width + x]
    });
    let grids = prepared.detect_grids();
    trace!(count = grids.len(), "QR grids located");

    for grid in grids {
        match grid.decode() {
            Ok((_meta, content)) if !content.is_empty() => return Some(content),
            Ok(_) => {}
            Err(e) => debug!(error = ?e, "Failed to decode QR grid"),
        }
    }
    None
}

/// Decode normally, then with the luma bit-inverted (light-on-dark codes)
pub fn decode_luma_both(width: usize, height: usize, mut data: Vec<u8>) -> Option<String> {
    if let Some(content) = decode_luma(width, height, &data) {
        return Some(content);
    }
    invert(&mut data);
    decode_luma(width, height, &data)
}

/// Bit-invert a luma buffer in place
pub fn invert(data: &mut [u8]) {
    for v in data.iter_mut() {
        *v = 255 - *v;
    }
}

/// Render a square window of the frame into a `target`×`target` luma buffer
/// using bilinear interpolation
pub fn sample_window(frame: &VideoFrame, window: CropWindow, target: u32) -> Vec<u8> {
    let mut result = Vec::with_capacity((target * target) as usize);
    if window.size == 0 || target == 0 {
        return result;
    }

    let ratio = window.size as f32 / target as f32;
    let max_x = window.x + window.size - 1;
    let max_y = window.y + window.size - 1;

    for ty in 0..target {
        for tx in 0..target {
            let src_x = window.x as f32 + tx as f32 * ratio;
            let src_y = window.y as f32 + ty as f32 * ratio;
            result.push(bilinear(frame, src_x, src_y, max_x, max_y));
        }
    }

    result
}

/// Downscale a whole frame so neither side exceeds `max_dimension`
///
/// Returns the luma buffer and its dimensions.
pub fn downscale_frame(frame: &VideoFrame, max_dimension: u32) -> (Vec<u8>, u32, u32) {
    let width = frame.width;
    let height = frame.height;
    if width <= max_dimension && height <= max_dimension {
        return (frame.to_luma(), width, height);
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let dst_width = ((width as f32 / scale) as u32).max(1);
    let dst_height = ((height as f32 / scale) as u32).max(1);

    let x_ratio = width as f32 / dst_width as f32;
    let y_ratio = height as f32 / dst_height as f32;

    let mut result = Vec::with_capacity((dst_width * dst_height) as usize);
    for y in 0..dst_height {
        for x in 0..dst_width {
            result.push(bilinear(
                frame,
                x as f32 * x_ratio,
                y as f32 * y_ratio,
                width - 1,
                height - 1,
            ));
        }
    }
    (result, dst_width, dst_height)
}

fn bilinear(frame: &VideoFrame, src_x: f32, src_y: f32, max_x: u32, max_y: u32) -> u8 {
    let x0 = (src_x as u32).min(max_x);
    let y0 = (src_y as u32).min(max_y);
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);

    let x_frac = (src_x - x0 as f32).clamp(0.0, 1.0);
    let y_frac = (src_y - y0 as f32).clamp(0.0, 1.0);

    let p00 = frame.luma(x0, y0) as f32;
    let p01 = frame.luma(x1, y0) as f32;
    let p10 = frame.luma(x0, y1) as f32;
    let p11 = frame.luma(x1, y1) as f32;

    let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
        + p01 * x_frac * (1.0 - y_frac)
        + p10 * (1.0 - x_frac) * y_frac
        + p11 * x_frac * y_frac;

    value.round().clamp(0.0, 255.0) as u8
}
