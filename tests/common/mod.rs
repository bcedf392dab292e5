//! In-process mock of the camera backend and streaming service.
//!
//! Serves the same `{success, data, error}` envelopes as the real backend on
//! `127.0.0.1` with a random port. Tests flip the failure switches on
//! [`MockData`] to exercise error paths.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use camwatch::model::{Alert, Camera, CameraDraft, CameraPatch, Recording};
use camwatch::seed;
use camwatch::streaming::{ActiveStream, StreamStatus};

#[derive(Debug, Default)]
pub struct MockData {
    pub cameras: Vec<Camera>,
    pub recordings: Vec<Recording>,
    pub alerts: Vec<Alert>,
    pub next_id: u32,

    /// List endpoints answer 500.
    pub fail_lists: bool,
    /// Only the named list answers 500.
    pub fail_cameras: bool,
    pub fail_recordings: bool,
    pub fail_alerts: bool,
    /// Write endpoints answer 500.
    pub fail_mutations: bool,
    /// Added before every list answer.
    pub list_delay: Option<Duration>,

    pub streams: Vec<ActiveStream>,
    /// Number of stream starts to reject before accepting one.
    pub stream_start_failures: u32,
    pub stream_start_calls: u32,

    /// `METHOD path` of every request, in order.
    pub requests: Vec<String>,
}

impl MockData {
    /// The seed dataset, ids continuing at 100.
    pub fn seeded() -> Self {
        Self {
            cameras: seed::cameras(),
            recordings: seed::recordings(),
            alerts: seed::alerts(),
            next_id: 100,
            ..Self::default()
        }
    }
}

pub type Shared = Arc<Mutex<MockData>>;

pub struct MockBackend {
    pub addr: String,
    pub data: Shared,
}

impl MockBackend {
    /// Base URL of the REST backend.
    pub fn api_url(&self) -> String {
        format!("{}/api", self.addr)
    }

    /// Root of the streaming service.
    pub fn stream_url(&self) -> String {
        self.addr.clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockData) -> R) -> R {
        f(&mut self.data.lock().unwrap())
    }

    pub fn requests(&self) -> Vec<String> {
        self.with(|d| d.requests.clone())
    }
}

pub async fn spawn(data: MockData) -> MockBackend {
    let data: Shared = Arc::new(Mutex::new(data));

    let app = Router::new()
        .route("/api/cameras", get(list_cameras).post(create_camera))
        .route("/api/cameras/onvif/discover", get(discover))
        .route("/api/cameras/onvif/test", post(test_connection))
        .route(
            "/api/cameras/:id",
            get(get_camera).put(update_camera).delete(delete_camera),
        )
        .route("/api/cameras/:id/onvif/capabilities", get(capabilities))
        .route("/api/cameras/:id/onvif/ptz", post(ptz))
        .route("/api/recordings", get(list_recordings))
        .route("/api/alerts", get(list_alerts))
        .route("/api/alerts/:id", put(update_alert))
        .route("/api/dashboard/stats", get(stats))
        .route("/api/v1/streams", get(list_streams))
        .route("/api/v1/streams/start", post(start_stream))
        .route("/api/v1/streams/:id", axum::routing::delete(stop_stream))
        .route("/api/v1/streams/recording/start", post(start_recording))
        .route("/api/v1/streams/recording/:id", axum::routing::delete(stop_stream))
        .route("/api/v1/streams/thumbnail/:id", post(thumbnail))
        .route("/api/v1/streams/test", post(test_stream))
        .with_state(data.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        addr: format!("http://{}", addr),
        data,
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

fn record(data: &Shared, entry: String) {
    data.lock().unwrap().requests.push(entry);
}

async fn list_delay(data: &Shared) {
    let delay = data.lock().unwrap().list_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

// ============================================================================
// Backend
// ============================================================================

async fn list_cameras(State(data): State<Shared>) -> Response {
    record(&data, "GET /cameras".to_string());
    list_delay(&data).await;
    let d = data.lock().unwrap();
    if d.fail_lists || d.fail_cameras {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    ok(&d.cameras)
}

async fn list_recordings(State(data): State<Shared>) -> Response {
    record(&data, "GET /recordings".to_string());
    list_delay(&data).await;
    let d = data.lock().unwrap();
    if d.fail_lists || d.fail_recordings {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    ok(&d.recordings)
}

async fn list_alerts(State(data): State<Shared>) -> Response {
    record(&data, "GET /alerts".to_string());
    list_delay(&data).await;
    let d = data.lock().unwrap();
    if d.fail_lists || d.fail_alerts {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    ok(&d.alerts)
}

async fn get_camera(State(data): State<Shared>, Path(id): Path<String>) -> Response {
    record(&data, format!("GET /cameras/{}", id));
    let d = data.lock().unwrap();
    match d.cameras.iter().find(|c| c.id == id) {
        Some(camera) => ok(camera),
        None => fail(StatusCode::NOT_FOUND, "Camera not found"),
    }
}

async fn create_camera(State(data): State<Shared>, Json(draft): Json<CameraDraft>) -> Response {
    record(&data, "POST /cameras".to_string());
    let mut d = data.lock().unwrap();
    if d.fail_mutations {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "insert failed");
    }

    d.next_id += 1;
    let now = Utc::now();
    let camera = Camera {
        id: d.next_id.to_string(),
        name: draft.name,
        location: draft.location,
        stream_url: draft.stream_url,
        is_online: false,
        recording_enabled: draft.recording_enabled,
        resolution: draft.resolution,
        camera_type: draft.camera_type,
        onvif: draft.onvif,
        last_motion_detected: None,
        created_at: now,
        updated_at: now,
    };
    d.cameras.push(camera.clone());
    (StatusCode::CREATED, Json(json!({ "success": true, "data": camera }))).into_response()
}

async fn update_camera(
    State(data): State<Shared>,
    Path(id): Path<String>,
    Json(patch): Json<CameraPatch>,
) -> Response {
    record(&data, format!("PUT /cameras/{}", id));
    let mut d = data.lock().unwrap();
    if d.fail_mutations {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "update failed");
    }
    match d.cameras.iter_mut().find(|c| c.id == id) {
        Some(camera) => {
            patch.apply_to(camera, Utc::now());
            ok(&*camera)
        }
        None => fail(StatusCode::NOT_FOUND, "Camera not found"),
    }
}

async fn delete_camera(State(data): State<Shared>, Path(id): Path<String>) -> Response {
    record(&data, format!("DELETE /cameras/{}", id));
    let mut d = data.lock().unwrap();
    if d.fail_mutations {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "delete failed");
    }
    let before = d.cameras.len();
    d.cameras.retain(|c| c.id != id);
    if d.cameras.len() == before {
        return fail(StatusCode::NOT_FOUND, "Camera not found");
    }
    Json(json!({ "success": true })).into_response()
}

async fn update_alert(
    State(data): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    record(&data, format!("PUT /alerts/{} {}", id, body));
    let mut d = data.lock().unwrap();
    if d.fail_mutations {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "update failed");
    }
    match d.alerts.iter_mut().find(|a| a.id == id) {
        Some(alert) => {
            if body["isRead"] == json!(true) {
                alert.is_read = true;
            }
            ok(&*alert)
        }
        None => fail(StatusCode::NOT_FOUND, "Alert not found"),
    }
}

#[derive(Debug, Deserialize)]
struct DiscoverQuery {
    timeout: Option<u64>,
}

async fn discover(State(data): State<Shared>, Query(query): Query<DiscoverQuery>) -> Response {
    record(&data, format!("GET /cameras/onvif/discover?timeout={:?}", query.timeout));
    ok(json!({
        "devices": [{
            "urn": "urn:uuid:cam-1",
            "name": "Lobby PTZ",
            "host": "192.168.1.64",
            "port": 80,
            "xaddrs": ["http://192.168.1.64/onvif/device_service"]
        }],
        "error": "one interface could not be scanned"
    }))
}

async fn test_connection(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&data, "POST /cameras/onvif/test".to_string());
    if body["password"] == json!("secret") {
        ok(json!({
            "success": true,
            "profiles": [{
                "token": "profile_1",
                "name": "MainStream",
                "videoSourceConfiguration": {},
                "videoEncoderConfiguration": {}
            }],
            "streamUri": "rtsp://192.168.1.64:554/stream1"
        }))
    } else {
        fail(StatusCode::UNAUTHORIZED, "Authentication failed")
    }
}

async fn capabilities(State(data): State<Shared>, Path(id): Path<String>) -> Response {
    record(&data, format!("GET /cameras/{}/onvif/capabilities", id));
    let d = data.lock().unwrap();
    if !d.cameras.iter().any(|c| c.id == id) {
        return fail(StatusCode::NOT_FOUND, "Camera not found");
    }
    ok(json!({
        "capabilities": { "ptz": { "xaddr": "http://192.168.1.64/onvif/ptz" } },
        "profiles": []
    }))
}

async fn ptz(State(data): State<Shared>, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    record(&data, format!("POST /cameras/{}/onvif/ptz {}", id, body));
    Json(json!({ "success": body["action"] == json!("move") || body["action"] == json!("stop") }))
        .into_response()
}

async fn stats(State(data): State<Shared>) -> Response {
    record(&data, "GET /dashboard/stats".to_string());
    let d = data.lock().unwrap();
    ok(camwatch::aggregation::compute_stats(
        &d.cameras,
        &d.recordings,
        &d.alerts,
        1000.0,
    ))
}

// ============================================================================
// Streaming service
// ============================================================================

async fn list_streams(State(data): State<Shared>) -> Response {
    record(&data, "GET /v1/streams".to_string());
    let d = data.lock().unwrap();
    if d.fail_lists {
        return fail(StatusCode::SERVICE_UNAVAILABLE, "streaming service down");
    }
    ok(&d.streams)
}

async fn start_stream(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&data, format!("POST /v1/streams/start {}", body));
    let mut d = data.lock().unwrap();
    d.stream_start_calls += 1;
    if d.stream_start_failures > 0 {
        d.stream_start_failures -= 1;
        return fail(StatusCode::SERVICE_UNAVAILABLE, "transcoder busy");
    }

    let camera_id = body["cameraId"].as_str().unwrap_or_default().to_string();
    let stream = ActiveStream {
        id: format!("stream-{}", camera_id),
        rtsp_url: format!("rtsp://cam-{}/live", camera_id),
        status: StreamStatus::Running,
        start_time: Utc::now(),
        output_path: None,
        viewers: 1,
    };
    d.streams.push(stream.clone());
    ok(json!({
        "streamId": stream.id,
        "streamUrl": format!("/hls/{}/index.m3u8", stream.id),
        "status": "running",
        "startedAt": stream.start_time
    }))
}

async fn stop_stream(State(data): State<Shared>, Path(id): Path<String>) -> Response {
    record(&data, format!("DELETE /v1/streams/{}", id));
    let mut d = data.lock().unwrap();
    d.streams.retain(|s| s.id != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn start_recording(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&data, format!("POST /v1/streams/recording/start {}", body));
    ok(json!({
        "recordingId": "rec-1",
        "camera": { "id": body["cameraId"], "name": "Front Door", "location": "Main Entrance" },
        "outputPath": "/recordings/rec-1.mp4",
        "duration": body["duration"],
        "format": body["format"],
        "quality": body["quality"],
        "startedAt": Utc::now()
    }))
}

async fn thumbnail(State(data): State<Shared>, Path(id): Path<String>) -> Response {
    record(&data, format!("POST /v1/streams/thumbnail/{}", id));
    ok(json!({ "thumbnailUrl": format!("/thumbnails/{}.jpg", id) }))
}

async fn test_stream(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&data, format!("POST /v1/streams/test {}", body));
    let accessible = body["rtspUrl"]
        .as_str()
        .is_some_and(|url| url.starts_with("rtsp://"));
    ok(json!({ "accessible": accessible, "responseTime": 42 }))
}
