// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera source
//!
//! Opens `/dev/video*` capture nodes with the `v4l` crate and streams YUYV
//! (or GREY) frames into a [`VideoSink`] from a dedicated capture thread.
//! Torch support comes from sysfs flash LEDs, see [`crate::flash`].

use super::frame_loop::{CaptureThread, Grab};
use super::types::*;
use super::{CameraSource, MediaStream, VideoSink, VideoTrack};
use crate::errors::{CameraAccessError, TrackError};
use crate::flash::{self, FlashDevice, FlashHardware};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::io::ErrorKind;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::Device;
use v4l::video::Capture;
use v4l::{Format, FourCC};

const FOURCC_YUYV: &[u8; 4] = b"YUYV";
const FOURCC_GREY: &[u8; 4] = b"GREY";

/// Longest a single dequeue may block, bounding how long a stopped capture
/// thread lingers on a stalled device
const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(500);

/// Camera source backed by Video4Linux2
#[derive(Debug, Default)]
pub struct V4l2Source;

impl V4l2Source {
    pub fn new() -> Self {
        Self
    }

    /// Pick the device to open for the given constraints
    fn select_device(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<CameraDevice, CameraAccessError> {
        if let Some(path) = &constraints.device {
            let dev = Device::with_path(path)?;
            let caps = dev.query_caps()?;
            return Ok(CameraDevice {
                name: caps.card,
                path: path.clone(),
                driver: Some(caps.driver),
            });
        }

        let cameras = self.enumerate_cameras();
        select_by_facing(&cameras, constraints.facing_mode)
            .cloned()
            .ok_or(CameraAccessError::NoCameraFound)
    }
}

/// Prefer a device whose name hints at the requested facing, else the first one
fn select_by_facing(cameras: &[CameraDevice], facing: FacingMode) -> Option<&CameraDevice> {
    cameras
        .iter()
        .find(|camera| {
            let name = camera.name.to_lowercase();
            facing.name_hints().iter().any(|hint| name.contains(hint))
        })
        .or_else(|| cameras.first())
}

impl CameraSource for V4l2Source {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let mut cameras = Vec::new();

        for node in v4l::context::enum_devices() {
            let path = node.path().to_string_lossy().to_string();
            let dev = match Device::with_path(&path) {
                Ok(dev) => dev,
                Err(e) => {
                    debug!(path = %path, error = %e, "Skipping unopenable V4L2 node");
                    continue;
                }
            };
            let caps = match dev.query_caps() {
                Ok(caps) => caps,
                Err(e) => {
                    debug!(path = %path, error = %e, "Skipping V4L2 node without caps");
                    continue;
                }
            };
            // Metadata nodes share the card name but cannot capture video
            if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                continue;
            }
            cameras.push(CameraDevice {
                name: caps.card,
                path,
                driver: Some(caps.driver),
            });
        }

        cameras.sort_by(|a, b| a.path.cmp(&b.path));
        cameras
    }

    fn open(&self, constraints: &StreamConstraints) -> Result<MediaStream, CameraAccessError> {
        let device = self.select_device(constraints)?;
        info!(name = %device.name, path = %device.path, "Opening V4L2 camera");

        let track = V4l2Track::new(device, constraints.width, constraints.height);
        Ok(MediaStream::new(vec![Arc::new(track)]))
    }
}

/// Capture state moved into the capture thread
struct CaptureState {
    stream: Stream<'static>,
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: u32,
    sequence: u64,
}

/// Video track for one V4L2 device
pub struct V4l2Track {
    device: CameraDevice,
    width: u32,
    height: u32,
    flash: Vec<FlashDevice>,
    capture: Mutex<Option<CaptureThread>>,
    ended: AtomicBool,
}

impl V4l2Track {
    fn new(device: CameraDevice, width: u32, height: u32) -> Self {
        let flash = FlashHardware::detect().devices;
        Self {
            device,
            width,
            height,
            flash,
            capture: Mutex::new(None),
            ended: AtomicBool::new(false),
        }
    }

    /// Open the device and negotiate a format the decoders understand
    fn open_stream(&self) -> Result<CaptureState, String> {
        let dev = Device::with_path(&self.device.path)
            .map_err(|e| format!("Failed to open {}: {}", self.device.path, e))?;

        let requested = Format::new(self.width, self.height, FourCC::new(FOURCC_YUYV));
        let actual = match dev.set_format(&requested) {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "Could not set YUYV format, using current device format");
                dev.format()
                    .map_err(|e| format!("Failed to query format: {}", e))?
            }
        };

        let format = if actual.fourcc == FourCC::new(FOURCC_YUYV) {
            PixelFormat::YUYV
        } else if actual.fourcc == FourCC::new(FOURCC_GREY) {
            PixelFormat::Gray8
        } else {
            return Err(format!("Unsupported pixel format {}", actual.fourcc));
        };

        info!(
            width = actual.width,
            height = actual.height,
            fourcc = %actual.fourcc,
            "V4L2 format configured"
        );

        let mut stream = Stream::with_buffers(&dev, Type::VideoCapture, 4)
            .map_err(|e| format!("Failed to create buffer stream: {}", e))?;
        stream.set_timeout(DEQUEUE_TIMEOUT);

        let stride = if actual.stride > 0 {
            actual.stride
        } else {
            actual.width * format.bytes_per_pixel() as u32
        };

        Ok(CaptureState {
            stream,
            format,
            width: actual.width,
            height: actual.height,
            stride,
            sequence: 0,
        })
    }
}

impl VideoTrack for V4l2Track {
    fn label(&self) -> &str {
        &self.device.name
    }

    fn capabilities(&self) -> Result<TrackCapabilities, TrackError> {
        if self.ended.load(Ordering::SeqCst) {
            return Err(TrackError::Ended);
        }
        Ok(TrackCapabilities {
            torch: (!self.flash.is_empty()).then_some(true),
            width: Some(self.width),
            height: Some(self.height),
        })
    }

    fn apply_torch(&self, on: bool) -> Result<(), TrackError> {
        if self.flash.is_empty() {
            return Err(TrackError::Unsupported);
        }
        flash::set_torch(&self.flash, on).map_err(|e| TrackError::Rejected(e.to_string()))
    }

    fn start(&self, sink: VideoSink) -> Result<(), TrackError> {
        if self.ended.load(Ordering::SeqCst) {
            return Err(TrackError::Ended);
        }
        let state = self.open_stream().map_err(TrackError::Rejected)?;

        let name = format!("v4l2-capture:{}", self.device.path);
        let controller = CaptureThread::spawn(&name, state, sink, |state| {
            let captured_at = Instant::now();
            match state.stream.next() {
                Ok((buf, _meta)) => {
                    state.sequence += 1;
                    Grab::Frame(VideoFrame {
                        width: state.width,
                        height: state.height,
                        data: Arc::from(buf),
                        format: state.format,
                        stride: state.stride,
                        sequence: state.sequence,
                        captured_at,
                    })
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    debug!("No frame within dequeue timeout");
                    Grab::Skip
                }
                // ENODEV
                Err(e) if e.raw_os_error() == Some(19) => {
                    warn!(error = %e, "Camera disconnected");
                    Grab::End
                }
                Err(e) => {
                    warn!(error = %e, "Failed to capture frame");
                    std::thread::sleep(Duration::from_millis(10));
                    Grab::Skip
                }
            }
        });

        *self.capture.lock().unwrap() = Some(controller);
        Ok(())
    }

    /// Signals the capture thread and returns without joining it. The
    /// thread closes the device once its pending dequeue returns, at most
    /// `DEQUEUE_TIMEOUT` later.
    fn stop(&self) {
        self.ended.store(true, Ordering::SeqCst);
        if let Some(mut controller) = self.capture.lock().unwrap().take() {
            let grabbing = controller.is_running();
            controller.stop();
            info!(path = %self.device.path, grabbing, "V4L2 capture stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(name: &str, path: &str) -> CameraDevice {
        CameraDevice {
            name: name.to_string(),
            path: path.to_string(),
            driver: None,
        }
    }

    #[test]
    fn test_select_by_facing_prefers_hint() {
        let cameras = vec![
            camera("Front Camera", "/dev/video0"),
            camera("Rear Camera", "/dev/video2"),
        ];
        let selected = select_by_facing(&cameras, FacingMode::Environment).unwrap();
        assert_eq!(selected.path, "/dev/video2");

        let selected = select_by_facing(&cameras, FacingMode::User).unwrap();
        assert_eq!(selected.path, "/dev/video0");
    }

    #[test]
    fn test_select_by_facing_falls_back_to_first() {
        let cameras = vec![camera("USB Webcam", "/dev/video0")];
        let selected = select_by_facing(&cameras, FacingMode::Environment).unwrap();
        assert_eq!(selected.path, "/dev/video0");
        assert!(select_by_facing(&[], FacingMode::Environment).is_none());
    }
}
