//! HTTP API handlers for camwatch.
//!
//! The view server is a thin JSON layer over the [`Dashboard`] controller.
//! Reads render controller state (filtered, with display labels); writes are
//! user intents forwarded to the controller, which talks to the backend.
//!
//! Errors render as `{"error": "..."}` with the status picked by
//! [`crate::error::Error`]: 400 for validation, 404 for unknown ids, 502 when
//! the backend rejects a request and 504 when it cannot be reached.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::{Mutex, watch};
use tracing::{info, instrument, warn};

use crate::aggregation::{
    StorageUsage, cameras_by_type, recording_enabled_count, total_recording_duration,
};
use crate::client::{CctvClient, DEFAULT_DISCOVERY_TIMEOUT_MS};
use crate::dashboard::{Dashboard, DashboardStatus};
use crate::error::{Error, Result};
use crate::filter::{
    AlertTab, DateRange, RecordingFilter, Selection, SortOrder, filter_by_severity,
};
use crate::format::{
    format_date, format_date_time, format_duration, format_duration_short, format_file_size,
    format_time, format_time_ago,
};
use crate::model::{
    Alert, AlertSeverity, Camera, CameraDraft, CameraPatch, CameraType, ConnectionTestResult,
    DashboardStats, DiscoveryResult, OnvifCredentials, Recording, RecordingType, SettingsPatch,
    SystemSettings,
};
use crate::streaming::ActiveStream;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Mutex<Dashboard>>,
    /// Lock-free view of phases and stats.
    pub status: watch::Receiver<DashboardStatus>,
    /// Latest active stream list, when a poller runs.
    pub streams: Option<watch::Receiver<Vec<ActiveStream>>>,
    /// For ONVIF calls that bypass the controller.
    pub client: CctvClient,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        let status = dashboard.subscribe();
        let client = dashboard.client().clone();
        Self {
            dashboard: Arc::new(Mutex::new(dashboard)),
            status,
            streams: None,
            client,
        }
    }

    pub fn with_streams(mut self, streams: watch::Receiver<Vec<ActiveStream>>) -> Self {
        self.streams = Some(streams);
        self
    }
}

/// Build the view server router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .route("/status/error", delete(dismiss_error))
        .route("/stats", get(get_stats))
        .route("/cameras", get(get_cameras).post(create_camera))
        .route("/cameras/:id", put(update_camera).delete(delete_camera))
        .route("/recordings", get(get_recordings))
        .route("/alerts", get(get_alerts))
        .route("/alerts/read-all", post(mark_all_alerts_read))
        .route("/alerts/:id/read", post(mark_alert_read))
        .route("/settings", get(get_settings).put(save_settings))
        .route("/refresh", post(refresh))
        .route("/onvif/discover", get(discover_devices))
        .route("/onvif/test", post(test_device_connection))
        .route("/streams", get(get_streams))
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /status - Collection phases, stats and the last error.
///
/// Served from the watch channel, so it answers even while a load or
/// refresh holds the controller.
pub async fn get_status(State(state): State<AppState>) -> Json<DashboardStatus> {
    Json(state.status.borrow().clone())
}

/// DELETE /status/error - Dismiss the last error.
pub async fn dismiss_error(State(state): State<AppState>) -> StatusCode {
    state.dashboard.lock().await.dismiss_error();
    StatusCode::NO_CONTENT
}

/// Overview figures plus the storage gauge and camera breakdown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub storage: StorageUsage,
    pub recording_enabled_cameras: usize,
    pub indoor_cameras: usize,
    pub outdoor_cameras: usize,
    /// Total recorded time, e.g. `3h 30m`.
    pub recorded_label: String,
}

/// GET /stats
#[instrument(skip(state))]
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let dashboard = state.dashboard.lock().await;
    let cameras = dashboard.cameras().items();
    Json(StatsResponse {
        stats: dashboard.stats().clone(),
        storage: dashboard.storage_usage(),
        recording_enabled_cameras: recording_enabled_count(cameras),
        indoor_cameras: cameras_by_type(cameras, CameraType::Indoor).len(),
        outdoor_cameras: cameras_by_type(cameras, CameraType::Outdoor).len(),
        recorded_label: format_duration_short(total_recording_duration(
            dashboard.recordings().items(),
        )),
    })
}

// ============================================================================
// Cameras
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CamerasQuery {
    #[serde(default)]
    pub search: String,
    #[serde(rename = "type")]
    pub camera_type: Option<CameraType>,
}

/// GET /cameras?search=&type=
#[instrument(skip(state))]
pub async fn get_cameras(
    State(state): State<AppState>,
    Query(query): Query<CamerasQuery>,
) -> Json<Vec<Camera>> {
    let dashboard = state.dashboard.lock().await;
    Json(dashboard.visible_cameras(&query.search, &query.camera_type.into()))
}

/// POST /cameras
///
/// Returns `201 Created` with the backend's record.
#[instrument(skip(state, draft), fields(name = %draft.name))]
pub async fn create_camera(
    State(state): State<AppState>,
    Json(draft): Json<CameraDraft>,
) -> Result<(StatusCode, Json<Camera>)> {
    let camera = state.dashboard.lock().await.create_camera(draft).await?;
    Ok((StatusCode::CREATED, Json(camera)))
}

/// PUT /cameras/:id
#[instrument(skip(state, patch))]
pub async fn update_camera(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<CameraPatch>,
) -> Result<Json<Camera>> {
    if patch.is_empty() {
        return Err(Error::validation("update carries no changes"));
    }
    let camera = state.dashboard.lock().await.update_camera(&id, patch).await?;
    Ok(Json(camera))
}

/// DELETE /cameras/:id
#[instrument(skip(state))]
pub async fn delete_camera(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.dashboard.lock().await.delete_camera(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Recordings
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct RecordingsQuery {
    #[serde(default)]
    pub search: String,
    /// Camera id, or `all`.
    pub camera: Option<String>,
    #[serde(rename = "type")]
    pub recording_type: Option<RecordingType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub order: Option<SortOrder>,
}

impl RecordingsQuery {
    fn to_filter(&self) -> Result<RecordingFilter> {
        let date_range = match (self.from, self.to) {
            (None, None) => None,
            (from, to) => {
                let start = from.unwrap_or(DateTime::<Utc>::MIN_UTC);
                let end = to.unwrap_or(DateTime::<Utc>::MAX_UTC);
                if start > end {
                    return Err(Error::validation("'from' must not be after 'to'"));
                }
                Some(DateRange::new(start, end))
            }
        };

        let owner = match self.camera.as_deref() {
            None | Some("all") | Some("") => Selection::All,
            Some(id) => Selection::Only(id.to_string()),
        };

        Ok(RecordingFilter {
            search: self.search.clone(),
            owner,
            category: self.recording_type.into(),
            date_range,
            order: self.order,
        })
    }
}

/// A recording with its display labels.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingRow {
    #[serde(flatten)]
    pub recording: Recording,
    pub duration_label: String,
    pub size_label: String,
    pub started_label: String,
}

impl From<Recording> for RecordingRow {
    fn from(recording: Recording) -> Self {
        Self {
            duration_label: format_duration(recording.duration),
            size_label: format_file_size(recording.size),
            started_label: format_date_time(recording.start_time),
            recording,
        }
    }
}

/// GET /recordings?search=&camera=&type=&from=&to=&order=
#[instrument(skip(state))]
pub async fn get_recordings(
    State(state): State<AppState>,
    Query(query): Query<RecordingsQuery>,
) -> Result<Json<Vec<RecordingRow>>> {
    let filter = query.to_filter()?;
    let dashboard = state.dashboard.lock().await;
    let rows = dashboard
        .visible_recordings(&filter)
        .into_iter()
        .map(RecordingRow::from)
        .collect();
    Ok(Json(rows))
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AlertsQuery {
    #[serde(default)]
    pub tab: AlertTab,
    pub severity: Option<AlertSeverity>,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRow {
    #[serde(flatten)]
    pub alert: Alert,
    pub time_ago: String,
    /// `12:00`
    pub time_label: String,
    /// `Jun 11, 2024`
    pub date_label: String,
}

impl AlertRow {
    fn new(alert: Alert, now: DateTime<Utc>) -> Self {
        Self {
            time_ago: format_time_ago(alert.timestamp, now),
            time_label: format_time(alert.timestamp),
            date_label: format_date(alert.timestamp),
            alert,
        }
    }
}

/// GET /alerts?tab=&severity=&order=
#[instrument(skip(state))]
pub async fn get_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Json<Vec<AlertRow>> {
    let alerts = state
        .dashboard
        .lock()
        .await
        .visible_alerts(query.tab, query.order);
    let now = Utc::now();

    let rows = filter_by_severity(&alerts, &query.severity.into())
        .into_iter()
        .map(|alert| AlertRow::new(alert, now))
        .collect();
    Json(rows)
}

/// POST /alerts/:id/read
#[instrument(skip(state))]
pub async fn mark_alert_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Alert>> {
    let alert = state.dashboard.lock().await.mark_alert_read(&id).await?;
    Ok(Json(alert))
}

/// POST /alerts/read-all
#[instrument(skip(state))]
pub async fn mark_all_alerts_read(State(state): State<AppState>) -> Result<Json<Value>> {
    let marked = state.dashboard.lock().await.mark_all_alerts_read().await?;
    Ok(Json(json!({ "marked": marked })))
}

// ============================================================================
// Settings and refresh
// ============================================================================

/// GET /settings
pub async fn get_settings(State(state): State<AppState>) -> Json<SystemSettings> {
    Json(state.dashboard.lock().await.settings().clone())
}

/// PUT /settings
///
/// Accepts any subset of the settings fields; unknown fields are rejected.
#[instrument(skip(state))]
pub async fn save_settings(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<SystemSettings>> {
    let settings = state.dashboard.lock().await.save_settings(patch).await?;
    Ok(Json(settings))
}

/// POST /refresh - Re-fetch every collection from the backend.
#[instrument(skip(state))]
pub async fn refresh(State(state): State<AppState>) -> Result<Json<DashboardStatus>> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.refresh().await?;
    info!(stats = ?dashboard.stats(), "Dashboard refreshed");
    Ok(Json(dashboard.status()))
}

// ============================================================================
// ONVIF and streams
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct DiscoverQuery {
    /// Scan window in milliseconds.
    pub timeout: Option<u64>,
}

/// GET /onvif/discover?timeout=
#[instrument(skip(state))]
pub async fn discover_devices(
    State(state): State<AppState>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<DiscoveryResult>> {
    let timeout_ms = query.timeout.unwrap_or(DEFAULT_DISCOVERY_TIMEOUT_MS);
    let result = state.client.discover_devices(timeout_ms).await?;

    if let Some(error) = &result.error {
        warn!(error = %error, found = result.devices.len(), "Discovery finished with errors");
    } else {
        info!(found = result.devices.len(), "Discovery finished");
    }
    Ok(Json(result))
}

/// POST /onvif/test
#[instrument(skip(state, credentials), fields(host = %credentials.host))]
pub async fn test_device_connection(
    State(state): State<AppState>,
    Json(credentials): Json<OnvifCredentials>,
) -> Result<Json<ConnectionTestResult>> {
    credentials.validate()?;
    let result = state.client.test_device_connection(&credentials).await?;
    info!(success = result.success, "Connection test finished");
    Ok(Json(result))
}

/// GET /streams - Latest polled stream list.
pub async fn get_streams(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<ActiveStream>>, StatusCode> {
    let streams = state.streams.as_ref().ok_or_else(|| {
        warn!("Stream poller not configured");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok(Json(streams.borrow().clone()))
}
