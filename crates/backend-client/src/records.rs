//! Driving session records

use crate::RequestError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use storage::ArtifactId;

/// Uploaded driving video as recorded by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivingSession {
    pub id: i64,
    pub user_id: i64,
    pub file_path: String,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub total_points: i64,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
}

impl DrivingSession {
    /// Identity used for the scored-artifact guard
    pub fn artifact_id(&self) -> ArtifactId {
        ArtifactId::from(self.id)
    }
}

/// MIME type for the video formats the backend accepts
pub(crate) fn video_mime(path: &Path) -> Result<&'static str, RequestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" => Ok("video/mp4"),
        "mov" => Ok("video/quicktime"),
        "avi" => Ok("video/x-msvideo"),
        "mkv" => Ok("video/x-matroska"),
        _ => Err(RequestError::UnsupportedFormat(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_mime() {
        assert_eq!(video_mime(Path::new("drive.MP4")).unwrap(), "video/mp4");
        assert_eq!(video_mime(Path::new("a/b/c.mov")).unwrap(), "video/quicktime");
        assert!(matches!(
            video_mime(Path::new("photo.jpg")),
            Err(RequestError::UnsupportedFormat(_))
        ));
        assert!(video_mime(Path::new("noext")).is_err());
    }

    #[test]
    fn test_parse_naive_timestamps() {
        let session: DrivingSession = serde_json::from_str(
            r#"{"id": 9, "user_id": 3, "file_path": "/uploads/drive_3_1.mp4",
                "start_time": "2025-06-01T12:30:00.123456", "end_time": null,
                "total_points": 0, "duration": null}"#,
        )
        .unwrap();

        assert_eq!(session.artifact_id(), ArtifactId::new("9"));
        assert!(session.end_time.is_none());
    }
}
