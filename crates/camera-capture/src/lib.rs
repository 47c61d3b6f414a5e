//! Camera Capture Library for SafeDrive
//!
//! Turns "take a still image from the active camera" into a JPEG buffer.
//! Supports:
//! - Directory-backed sources (desktop stand-in for the device camera)
//! - Static sources for tests and demos
//! - RGB to JPEG encoding at the capture quality

pub mod frame;
pub mod source;

pub use frame::CaptureFrame;
pub use source::{DirectoryFrameSource, FrameSource, StaticFrameSource};

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    #[error("Frame capture failed: {0}")]
    Capture(String),

    #[error("JPEG encoding failed: {0}")]
    Encode(String),
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Capture(err.to_string())
    }
}

/// Camera configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Directory of JPEG stills replayed as the camera feed
    pub frames_dir: PathBuf,
    /// JPEG quality used when encoding raw frames (1-100)
    pub jpeg_quality: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("frames"),
            jpeg_quality: source::DEFAULT_JPEG_QUALITY,
        }
    }
}
