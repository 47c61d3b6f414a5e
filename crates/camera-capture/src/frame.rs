//! Captured frame type and JPEG encoding

use crate::CaptureError;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

/// JPEG start-of-image marker
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// A still frame taken from the active camera
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    /// JPEG-encoded image bytes
    pub jpeg: Vec<u8>,
    /// Wall-clock capture time
    pub captured_at: DateTime<Utc>,
    /// Frame sequence number (per source)
    pub sequence: u64,
}

impl CaptureFrame {
    /// Wrap an already-encoded JPEG buffer
    pub fn new(jpeg: Vec<u8>, sequence: u64) -> Self {
        Self {
            jpeg,
            captured_at: Utc::now(),
            sequence,
        }
    }

    /// Encode raw RGB pixel data (width * height * 3) into a JPEG frame
    pub fn from_rgb(
        data: &[u8],
        width: u32,
        height: u32,
        quality: u8,
        sequence: u64,
    ) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(CaptureError::Encode(format!(
                "expected {} RGB bytes for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }

        let mut jpeg = Vec::with_capacity(expected / 8);
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
        encoder
            .encode(data, width, height, ExtendedColorType::Rgb8)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;

        Ok(Self::new(jpeg, sequence))
    }

    /// Whether the buffer starts like a JPEG
    pub fn looks_like_jpeg(&self) -> bool {
        self.jpeg.starts_with(&JPEG_SOI)
    }

    /// Decode just enough to report the image dimensions
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        image::load_from_memory(&self.jpeg)
            .ok()
            .map(|img| (img.width(), img.height()))
    }

    /// Encoded size in bytes
    pub fn len(&self) -> usize {
        self.jpeg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jpeg.is_empty()
    }
}
