//! Frame sources

use crate::{CaptureError, CaptureFrame};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// Something that can take a still image from the active camera
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Precondition check before a capture loop may start
    /// (permission granted, device present).
    async fn ensure_ready(&self) -> Result<(), CaptureError>;

    /// Take one still frame
    async fn capture(&self) -> Result<CaptureFrame, CaptureError>;
}

/// Returns the same JPEG on every capture
pub struct StaticFrameSource {
    jpeg: Vec<u8>,
    permission_granted: bool,
    sequence: AtomicU64,
}

impl StaticFrameSource {
    pub fn new(jpeg: Vec<u8>) -> Self {
        Self {
            jpeg,
            permission_granted: true,
            sequence: AtomicU64::new(0),
        }
    }

    /// A source whose camera permission was refused
    pub fn denied() -> Self {
        Self {
            jpeg: Vec::new(),
            permission_granted: false,
            sequence: AtomicU64::new(0),
        }
    }

    /// Number of frames handed out so far
    pub fn captured(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FrameSource for StaticFrameSource {
    async fn ensure_ready(&self) -> Result<(), CaptureError> {
        if self.permission_granted {
            Ok(())
        } else {
            Err(CaptureError::PermissionDenied)
        }
    }

    async fn capture(&self) -> Result<CaptureFrame, CaptureError> {
        if !self.permission_granted {
            return Err(CaptureError::PermissionDenied);
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(CaptureFrame::new(self.jpeg.clone(), sequence))
    }
}

/// Default JPEG quality for re-encoded stills
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// Replays the still images of a directory in name order, wrapping around.
///
/// JPEG files are sent as they are; PNG files are re-encoded as JPEG.
pub struct DirectoryFrameSource {
    dir: PathBuf,
    files: RwLock<Vec<PathBuf>>,
    sequence: AtomicU64,
    jpeg_quality: u8,
}

impl DirectoryFrameSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(0),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Quality used when re-encoding non-JPEG stills
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn scan(&self) -> Result<Vec<PathBuf>, CaptureError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            CaptureError::Unavailable(format!("{}: {}", self.dir.display(), e))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if still_kind(&path).is_some() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl FrameSource for DirectoryFrameSource {
    async fn ensure_ready(&self) -> Result<(), CaptureError> {
        let files = self.scan().await?;
        if files.is_empty() {
            return Err(CaptureError::Unavailable(format!(
                "no still frames in {}",
                self.dir.display()
            )));
        }

        info!("Frame source ready: {} frames in {}", files.len(), self.dir.display());
        *self.files.write().unwrap_or_else(PoisonError::into_inner) = files;
        Ok(())
    }

    async fn capture(&self) -> Result<CaptureFrame, CaptureError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let path = {
            let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
            if files.is_empty() {
                return Err(CaptureError::Unavailable("frame source not ready".to_string()));
            }
            files[((sequence - 1) % files.len() as u64) as usize].clone()
        };

        debug!("Capturing frame {} from {}", sequence, path.display());
        let bytes = tokio::fs::read(&path).await?;

        match still_kind(&path) {
            Some(StillKind::Png) => {
                let rgb = image::load_from_memory(&bytes)
                    .map_err(|e| CaptureError::Capture(format!("{}: {}", path.display(), e)))?
                    .to_rgb8();
                let (width, height) = rgb.dimensions();
                CaptureFrame::from_rgb(rgb.as_raw(), width, height, self.jpeg_quality, sequence)
            }
            _ => Ok(CaptureFrame::new(bytes, sequence)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StillKind {
    Jpeg,
    Png,
}

fn still_kind(path: &Path) -> Option<StillKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some(StillKind::Jpeg),
        "png" => Some(StillKind::Png),
        _ => None,
    }
}
