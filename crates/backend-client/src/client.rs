//! Backend HTTP Client

use crate::records::video_mime;
use crate::{
    ApiConfig, CommitError, DepthInference, DepthResult, DriveRecordUploader, DrivingSession,
    OverlayInference, OverlayResult, PointsLedger, RedLineSource, RemoteInferenceError,
    RequestError,
};
use async_trait::async_trait;
use camera_capture::CaptureFrame;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use storage::{ArtifactId, CredentialStore};
use tracing::{debug, info};

/// Client for the SafeDrive backend
pub struct BackendClient {
    http: reqwest::Client,
    config: ApiConfig,
    credentials: Arc<dyn CredentialStore>,
}

impl BackendClient {
    /// Create a new backend client
    pub fn new(config: ApiConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, RequestError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| RequestError::Client(e.to_string()))?;

        info!("Created backend client for {}", config.base_url);
        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Attach the bearer token when one is stored; otherwise send no Authorization header
    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.credentials.access_token().await {
            Some(token) => builder.bearer_auth(token),
            None => {
                debug!("No access token stored, sending request without credentials");
                builder
            }
        }
    }

    fn frame_form(frame: &CaptureFrame) -> Result<Form, reqwest::Error> {
        let part = Part::bytes(frame.jpeg.clone())
            .file_name(format!("frame_{}.jpg", frame.sequence))
            .mime_str("image/jpeg")?;
        Ok(Form::new().part("file", part))
    }

    fn inference_error(&self, err: reqwest::Error) -> RemoteInferenceError {
        if err.is_timeout() {
            RemoteInferenceError::Timeout(self.config.request_timeout_ms)
        } else {
            RemoteInferenceError::Network(err.to_string())
        }
    }

    /// POST a frame as multipart `file` and return the successful response
    async fn post_frame(&self, path: &str, frame: &CaptureFrame) -> Result<Response, RemoteInferenceError> {
        let url = self.config.url(path);
        let form = Self::frame_form(frame).map_err(|e| self.inference_error(e))?;

        debug!("POST frame {} ({} bytes) to {}", frame.sequence, frame.len(), url);
        let response = self
            .authorized(self.http.post(&url).multipart(form))
            .await
            .send()
            .await
            .map_err(|e| self.inference_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(RemoteInferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

async fn check_status(response: Response) -> Result<Response, RequestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    Err(RequestError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl OverlayInference for BackendClient {
    async fn infer_overlay(&self, frame: &CaptureFrame) -> Result<OverlayResult, RemoteInferenceError> {
        let response = self.post_frame(&self.config.overlay_path, frame).await?;

        let header = &self.config.lane_count_header;
        let count = response
            .headers()
            .get(header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| self.inference_error(e))?;

        OverlayResult::from_response(header, count.as_deref(), body.to_vec())
    }
}

#[async_trait]
impl DepthInference for BackendClient {
    async fn infer_depth(&self, frame: &CaptureFrame) -> Result<DepthResult, RemoteInferenceError> {
        let response = self.post_frame(&self.config.depth_path, frame).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| self.inference_error(e))?;
        DepthResult::from_json(&body)
    }
}

#[async_trait]
impl PointsLedger for BackendClient {
    async fn add_points(&self, user_id: i64, points: u32) -> Result<(), CommitError> {
        let url = self.config.url(&self.config.commit_points_path);
        info!("Committing {} points to user {}", points, user_id);

        let response = self
            .authorized(
                self.http
                    .post(&url)
                    .query(&[("user_id", user_id), ("points", i64::from(points))]),
            )
            .await
            .send()
            .await
            .map_err(|e| CommitError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        Err(CommitError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RedLineSource for BackendClient {
    async fn red_line_timestamps(&self, artifact: &ArtifactId) -> Result<Vec<f64>, RequestError> {
        let path = format!(
            "{}/{}/red_lines",
            self.config.drive_records_path.trim_end_matches('/'),
            artifact
        );
        let url = self.config.url(&path);
        debug!("GET red lines for artifact {} from {}", artifact, url);

        let response = self
            .authorized(self.http.get(&url))
            .await
            .send()
            .await
            .map_err(|e| RequestError::Network(e.to_string()))?;

        check_status(response)
            .await?
            .json::<Vec<f64>>()
            .await
            .map_err(|e| RequestError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl DriveRecordUploader for BackendClient {
    async fn upload_drive_record(
        &self,
        user_id: i64,
        video: &Path,
    ) -> Result<DrivingSession, RequestError> {
        let mime = video_mime(video)?;
        let bytes = tokio::fs::read(video)
            .await
            .map_err(|e| RequestError::Io(format!("{}: {}", video.display(), e)))?;
        let file_name = video
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| RequestError::Client(e.to_string()))?;

        let url = self.config.url(&self.config.drive_records_path);
        info!("Uploading driving video {} for user {}", video.display(), user_id);

        let response = self
            .authorized(
                self.http
                    .post(&url)
                    .query(&[("user_id", user_id)])
                    .multipart(Form::new().part("file", part)),
            )
            .await
            .send()
            .await
            .map_err(|e| RequestError::Network(e.to_string()))?;

        let response = check_status(response).await?;
        let session = response
            .json::<DrivingSession>()
            .await
            .map_err(|e| RequestError::MalformedResponse(e.to_string()))?;

        info!("Driving session {} created", session.id);
        Ok(session)
    }
}
