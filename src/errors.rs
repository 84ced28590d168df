// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner
//!
//! Only [`CameraAccessError`] is ever surfaced to callers of
//! [`Scanner::start`](crate::session::Scanner::start). Track and decode errors
//! are absorbed inside the session and only show up in logs.

use crate::session::SessionState;
use std::fmt;

/// Result type alias using ScannerError
pub type ScannerResult<T> = Result<T, ScannerError>;

/// Top-level scanner error type
#[derive(Debug, Clone)]
pub enum ScannerError {
    /// Camera could not be acquired
    Camera(CameraAccessError),
    /// Operation not valid in the current session state
    InvalidState(SessionState),
    /// Configuration errors
    Config(String),
    /// Debug log / filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera acquisition errors (terminal for the session)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraAccessError {
    /// Permission to open the camera was denied
    PermissionDenied(String),
    /// No camera devices found
    NoCameraFound,
    /// Camera is busy or in use by another process
    Busy,
    /// Camera opened but could not be configured or started
    InitializationFailed(String),
    /// The session was torn down while the camera was being opened
    Aborted,
}

/// Errors reported by a video track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    /// The track does not support the requested operation
    Unsupported,
    /// The platform rejected the request
    Rejected(String),
    /// The track was already stopped
    Ended,
}

/// Errors raised by a single decode attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The platform detector failed
    Platform(String),
    /// Unexpected failure inside a decoder
    Unexpected(String),
}

impl fmt::Display for ScannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerError::Camera(e) => write!(f, "Could not access camera: {}", e),
            ScannerError::InvalidState(state) => {
                write!(f, "Operation not allowed while session is {}", state)
            }
            ScannerError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ScannerError::Storage(msg) => write!(f, "Storage error: {}", msg),
            ScannerError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraAccessError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            CameraAccessError::NoCameraFound => write!(f, "No camera devices found"),
            CameraAccessError::Busy => write!(f, "Camera is busy"),
            CameraAccessError::InitializationFailed(msg) => {
                write!(f, "Initialization failed: {}", msg)
            }
            CameraAccessError::Aborted => write!(f, "Camera acquisition aborted"),
        }
    }
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::Unsupported => write!(f, "Operation not supported by track"),
            TrackError::Rejected(msg) => write!(f, "Track request rejected: {}", msg),
            TrackError::Ended => write!(f, "Track already ended"),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Platform(msg) => write!(f, "Platform detector error: {}", msg),
            DecodeError::Unexpected(msg) => write!(f, "Unexpected decoder error: {}", msg),
        }
    }
}

impl std::error::Error for ScannerError {}
impl std::error::Error for CameraAccessError {}
impl std::error::Error for TrackError {}
impl std::error::Error for DecodeError {}

impl From<CameraAccessError> for ScannerError {
    fn from(err: CameraAccessError) -> Self {
        ScannerError::Camera(err)
    }
}

impl From<String> for ScannerError {
    fn from(msg: String) -> Self {
        ScannerError::Other(msg)
    }
}

impl From<&str> for ScannerError {
    fn from(msg: &str) -> Self {
        ScannerError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for ScannerError {
    fn from(err: std::io::Error) -> Self {
        ScannerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ScannerError {
    fn from(err: serde_json::Error) -> Self {
        ScannerError::Config(err.to_string())
    }
}

impl From<std::io::Error> for CameraAccessError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                CameraAccessError::PermissionDenied(err.to_string())
            }
            std::io::ErrorKind::NotFound => CameraAccessError::NoCameraFound,
            // EBUSY
            _ if err.raw_os_error() == Some(16) => CameraAccessError::Busy,
            _ => CameraAccessError::InitializationFailed(err.to_string()),
        }
    }
}

impl From<TrackError> for CameraAccessError {
    fn from(err: TrackError) -> Self {
        CameraAccessError::InitializationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mapping() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            CameraAccessError::from(denied),
            CameraAccessError::PermissionDenied(_)
        ));

        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert_eq!(
            CameraAccessError::from(missing),
            CameraAccessError::NoCameraFound
        );

        let busy = std::io::Error::from_raw_os_error(16);
        assert_eq!(CameraAccessError::from(busy), CameraAccessError::Busy);
    }

    #[test]
    fn test_scanner_error_display() {
        let err = ScannerError::from(CameraAccessError::NoCameraFound);
        assert_eq!(
            err.to_string(),
            "Could not access camera: No camera devices found"
        );
    }
}
