//! Dashboard router tests

use api::{create_router, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use backend_client::{
    CommitError, DepthInference, DepthResult, DriveRecordUploader, DrivingSession,
    OverlayInference, OverlayResult, PointsLedger, RedLineSource, RemoteInferenceError,
    RequestError,
};
use camera_capture::{CaptureFrame, StaticFrameSource};
use capture_loop::{CaptureLoop, CaptureServices, LoopConfig};
use lane_scoring::ScoringConfig;
use proximity::ProximityConfig;
use reconciler::{AlertBoard, SessionReconciler};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use storage::{ArtifactId, LocalStore, SessionUser};
use tower::ServiceExt;

struct InLane;

#[async_trait]
impl OverlayInference for InLane {
    async fn infer_overlay(&self, _frame: &CaptureFrame) -> Result<OverlayResult, RemoteInferenceError> {
        Ok(OverlayResult {
            annotated_image: vec![0xFF, 0xD8, 0xFF, 0xD9],
            lane_indicator_count: 2,
        })
    }
}

struct FlatDepth;

#[async_trait]
impl DepthInference for FlatDepth {
    async fn infer_depth(&self, _frame: &CaptureFrame) -> Result<DepthResult, RemoteInferenceError> {
        Ok(DepthResult::new(ndarray::Array2::from_elem((12, 12), 12.0)))
    }
}

#[derive(Default)]
struct Ledger {
    calls: Mutex<Vec<(i64, u32)>>,
    fail: bool,
}

#[async_trait]
impl PointsLedger for Ledger {
    async fn add_points(&self, user_id: i64, points: u32) -> Result<(), CommitError> {
        self.calls.lock().unwrap().push((user_id, points));
        if self.fail {
            return Err(CommitError::Status {
                status: 500,
                body: "ledger down".to_string(),
            });
        }
        Ok(())
    }
}

struct Marks;

#[async_trait]
impl RedLineSource for Marks {
    async fn red_line_timestamps(&self, artifact: &ArtifactId) -> Result<Vec<f64>, RequestError> {
        match artifact.as_str() {
            "missing" => Err(RequestError::Status {
                status: 404,
                body: "Drive record not found".to_string(),
            }),
            _ => Ok(vec![1.0, 4.5]),
        }
    }
}

/// Accepts `.mp4` uploads as driving session 21
struct Uploads;

#[async_trait]
impl DriveRecordUploader for Uploads {
    async fn upload_drive_record(
        &self,
        user_id: i64,
        video: &Path,
    ) -> Result<DrivingSession, RequestError> {
        if video.extension().and_then(|e| e.to_str()) != Some("mp4") {
            return Err(RequestError::UnsupportedFormat(video.display().to_string()));
        }
        Ok(serde_json::from_value(serde_json::json!({
            "id": 21,
            "user_id": user_id,
            "file_path": "uploads/drive_21.mp4",
            "start_time": "2025-06-01T12:30:00"
        }))
        .unwrap())
    }
}

struct Dashboard {
    app: Router,
    ledger: Arc<Ledger>,
    store: Arc<LocalStore>,
}

fn dashboard_with(permitted: bool, ledger_fails: bool) -> Dashboard {
    let store = Arc::new(LocalStore::in_memory());
    let ledger = Arc::new(Ledger {
        fail: ledger_fails,
        ..Default::default()
    });
    let alerts = Arc::new(AlertBoard::default());
    let reconciler = Arc::new(SessionReconciler::new(
        ledger.clone(),
        store.clone(),
        alerts.clone(),
    ));

    let source = if permitted {
        StaticFrameSource::new(vec![0xFF, 0xD8, 0xFF])
    } else {
        StaticFrameSource::denied()
    };

    let capture = CaptureLoop::new(
        LoopConfig::default(),
        ScoringConfig::default(),
        ProximityConfig::default(),
        CaptureServices {
            source: Arc::new(source),
            overlay: Arc::new(InLane),
            depth: Arc::new(FlatDepth),
            reconciler: reconciler.clone(),
        },
    )
    .unwrap();

    let state = Arc::new(AppState::new(
        capture,
        store.clone(),
        Arc::new(Marks),
        Arc::new(Uploads),
        reconciler,
        alerts,
        ScoringConfig::default(),
    ));

    Dashboard {
        app: create_router(state),
        ledger,
        store,
    }
}

fn dashboard() -> Dashboard {
    dashboard_with(true, false)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn login(app: &Router) {
    let (status, _) = send_json(
        app,
        "POST",
        "/api/v1/session",
        Some(serde_json::json!({
            "access_token": "token-abc",
            "user": { "id": 5, "firstname": "Noa", "points": 10 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let d = dashboard();
    let (status, json) = send_json(&d.app, "GET", "/api/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["live"], false);
    assert_eq!(json["logged_in"], false);
}

#[tokio::test]
async fn test_session_login_and_logout() {
    let d = dashboard();
    login(&d.app).await;

    assert_eq!(d.store.token().as_deref(), Some("token-abc"));
    assert_eq!(
        d.store.session_user(),
        Some(SessionUser {
            id: 5,
            firstname: "Noa".to_string(),
            points: 10
        })
    );

    let (status, _) = send(&d.app, "DELETE", "/api/v1/session", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(d.store.token(), None);
}

#[tokio::test(start_paused = true)]
async fn test_live_episode_round_trip() {
    let d = dashboard();
    login(&d.app).await;

    let (status, json) = send_json(&d.app, "POST", "/api/v1/live/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["started"], true);
    assert_eq!(json["view"]["live"], true);

    let (_, again) = send_json(&d.app, "POST", "/api/v1/live/start", None).await;
    assert_eq!(again["started"], false);

    tokio::time::sleep(std::time::Duration::from_millis(4500)).await;

    let (_, view) = send_json(&d.app, "GET", "/api/v1/live", None).await;
    assert_eq!(view["points"], 6);
    assert_eq!(view["lane_state"], "in_lane_qualified");
    assert_eq!(view["proximity"], "clear");
    assert_eq!(view["elapsed"], "00:04");

    let (status, overlay) = send(&d.app, "GET", "/api/v1/live/overlay", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overlay, vec![0xFF, 0xD8, 0xFF, 0xD9]);

    let (_, outcome) = send_json(&d.app, "POST", "/api/v1/live/stop", None).await;
    assert_eq!(outcome, serde_json::json!({ "status": "committed", "points": 6 }));
    assert_eq!(d.ledger.calls.lock().unwrap().clone(), vec![(5, 6)]);

    let (_, outcome) = send_json(&d.app, "POST", "/api/v1/live/stop", None).await;
    assert_eq!(outcome["status"], "nothing_to_commit");
}

#[tokio::test]
async fn test_overlay_empty_before_first_result() {
    let d = dashboard();
    let (status, body) = send(&d.app, "GET", "/api/v1/live/overlay", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_start_refused_without_camera_permission() {
    let d = dashboard_with(false, false);
    let (status, json) = send_json(&d.app, "POST", "/api/v1/live/start", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("permission denied"));
}

#[tokio::test(start_paused = true)]
async fn test_commit_failure_raises_one_alert() {
    let d = dashboard_with(true, true);
    login(&d.app).await;

    send_json(&d.app, "POST", "/api/v1/live/start", None).await;
    tokio::time::sleep(std::time::Duration::from_millis(2500)).await;

    let (_, outcome) = send_json(&d.app, "POST", "/api/v1/live/stop", None).await;
    assert_eq!(outcome["status"], "failed");
    assert_eq!(outcome["points"], 3);

    let (_, alerts) = send_json(&d.app, "GET", "/api/v1/alerts", None).await;
    assert_eq!(alerts["count"], 1);
    assert_eq!(alerts["data"][0]["kind"], "commit_failed");
}

#[tokio::test]
async fn test_recorded_playback_scores_once() {
    let d = dashboard();
    login(&d.app).await;

    let (status, json) = send_json(&d.app, "POST", "/api/v1/recorded/42/open", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["artifact"], "42");
    assert_eq!(json["red_lines"], 2);

    for (seconds, awarded) in [(0.5, 0), (1.1, 3), (1.2, 0), (4.4, 3)] {
        let (_, json) = send_json(
            &d.app,
            "POST",
            "/api/v1/recorded/42/position",
            Some(serde_json::json!({ "seconds": seconds })),
        )
        .await;
        assert_eq!(json["awarded"], awarded);
    }

    let (_, outcome) = send_json(&d.app, "POST", "/api/v1/recorded/42/finished", None).await;
    assert_eq!(outcome, serde_json::json!({ "status": "committed", "points": 6 }));

    let (status, _) = send_json(&d.app, "POST", "/api/v1/recorded/42/open", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, outcome) = send_json(&d.app, "POST", "/api/v1/recorded/42/finished", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["status"], "already_committed");

    let (_, json) = send_json(
        &d.app,
        "POST",
        "/api/v1/recorded/42/position",
        Some(serde_json::json!({ "seconds": 1.0 })),
    )
    .await;
    assert_eq!(json["awarded"], 0);
    assert_eq!(json["points"], 6);

    assert_eq!(d.ledger.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_upload_yields_playable_artifact() {
    let d = dashboard();
    let video = serde_json::json!({ "path": "/data/drives/morning.mp4" });

    let (status, _) = send_json(&d.app, "POST", "/api/v1/recorded/upload", Some(video.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    login(&d.app).await;
    let (status, json) = send_json(&d.app, "POST", "/api/v1/recorded/upload", Some(video)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["artifact"], "21");
    assert_eq!(json["session"]["user_id"], 5);

    let (status, json) = send_json(&d.app, "POST", "/api/v1/recorded/21/open", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["red_lines"], 2);

    let (status, _) = send_json(
        &d.app,
        "POST",
        "/api/v1/recorded/upload",
        Some(serde_json::json!({ "path": "/data/drives/notes.txt" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recorded_errors() {
    let d = dashboard();

    let (status, _) = send_json(&d.app, "POST", "/api/v1/recorded/missing/open", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, _) = send_json(
        &d.app,
        "POST",
        "/api/v1/recorded/7/position",
        Some(serde_json::json!({ "seconds": 1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
