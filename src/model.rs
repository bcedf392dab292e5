//! Data models for camwatch.
//!
//! These types mirror the backend's JSON records. Field names are camelCase on
//! the wire and timestamps are RFC 3339 UTC strings.
//!
//! Besides the entities themselves, this module holds the explicit patch
//! records used to change them ([`CameraPatch`], [`OnvifConfigPatch`],
//! [`SettingsPatch`]). Each patch enumerates the fields it may touch and has
//! its own merge function, so an unknown key can never slip into a record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Resolutions accepted by the camera form.
pub const SUPPORTED_RESOLUTIONS: [&str; 3] = ["720p", "1080p", "4K"];

/// Mounting position of a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraType {
    Indoor,
    Outdoor,
}

impl CameraType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraType::Indoor => "indoor",
            CameraType::Outdoor => "outdoor",
        }
    }
}

/// ONVIF device-control settings for a camera.
///
/// On the wire these fields sit directly on the camera record
/// (`onvifEnabled`, `onvifHost`, ...); in Rust they are grouped so that a
/// camera without ONVIF is simply `OnvifConfig::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnvifConfig {
    #[serde(rename = "onvifEnabled", default)]
    pub enabled: bool,

    #[serde(rename = "onvifHost", default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(rename = "onvifPort", default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(
        rename = "onvifUsername",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub username: Option<String>,

    #[serde(
        rename = "onvifPassword",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<String>,

    /// Media profile selected after a successful connection test.
    #[serde(
        rename = "onvifProfileToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_token: Option<String>,
}

impl OnvifConfig {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.host.as_deref().is_none_or(|h| h.trim().is_empty()) {
            return Err(Error::validation("ONVIF host is required when ONVIF is enabled"));
        }
        if self.port == Some(0) {
            return Err(Error::validation("ONVIF port must be between 1 and 65535"));
        }
        Ok(())
    }
}

/// A camera as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    /// Server-assigned identifier. Never changes after creation.
    pub id: String,

    pub name: String,

    pub location: String,

    /// RTSP or HTTP(S) URL of the camera feed.
    pub stream_url: String,

    pub is_online: bool,

    pub recording_enabled: bool,

    /// Free-form resolution label such as "1080p".
    pub resolution: String,

    #[serde(rename = "type")]
    pub camera_type: CameraType,

    #[serde(flatten)]
    pub onvif: OnvifConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_motion_detected: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    /// Bumped by the backend on every mutation.
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a camera.
///
/// Carries every camera field except the ones the backend assigns (id,
/// timestamps, online status, last motion). New cameras always start
/// offline. Unknown keys are rejected on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CameraDraftFields")]
pub struct CameraDraft {
    pub name: String,
    pub location: String,
    pub stream_url: String,
    #[serde(default = "default_true")]
    pub recording_enabled: bool,
    #[serde(default = "default_resolution")]
    pub resolution: String,
    #[serde(rename = "type")]
    pub camera_type: CameraType,
    #[serde(flatten)]
    pub onvif: OnvifConfig,
}

fn default_true() -> bool {
    true
}

fn default_resolution() -> String {
    "1080p".to_string()
}

impl CameraDraft {
    /// Start a draft with the form defaults: recording on, 1080p, no ONVIF.
    pub fn new(name: &str, location: &str, stream_url: &str, camera_type: CameraType) -> Self {
        Self {
            name: name.to_string(),
            location: location.to_string(),
            stream_url: stream_url.to_string(),
            recording_enabled: true,
            resolution: default_resolution(),
            camera_type,
            onvif: OnvifConfig::default(),
        }
    }

    pub fn with_resolution(mut self, resolution: &str) -> Self {
        self.resolution = resolution.to_string();
        self
    }

    pub fn with_onvif(mut self, onvif: OnvifConfig) -> Self {
        self.onvif = onvif;
        self
    }

    /// Check every field before the draft is sent to the backend.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_location(&self.location)?;
        validate_stream_url(&self.stream_url)?;
        validate_resolution(&self.resolution)?;
        self.onvif.validate()
    }
}

/// Flat wire form of [`CameraDraft`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CameraDraftFields {
    name: String,
    location: String,
    stream_url: String,
    #[serde(default = "default_true")]
    recording_enabled: bool,
    #[serde(default = "default_resolution")]
    resolution: String,
    #[serde(rename = "type")]
    camera_type: CameraType,
    #[serde(default)]
    onvif_enabled: bool,
    onvif_host: Option<String>,
    onvif_port: Option<u16>,
    onvif_username: Option<String>,
    onvif_password: Option<String>,
    onvif_profile_token: Option<String>,
}

impl From<CameraDraftFields> for CameraDraft {
    fn from(f: CameraDraftFields) -> Self {
        Self {
            name: f.name,
            location: f.location,
            stream_url: f.stream_url,
            recording_enabled: f.recording_enabled,
            resolution: f.resolution,
            camera_type: f.camera_type,
            onvif: OnvifConfig {
                enabled: f.onvif_enabled,
                host: f.onvif_host,
                port: f.onvif_port,
                username: f.onvif_username,
                password: f.onvif_password,
                profile_token: f.onvif_profile_token,
            },
        }
    }
}

/// Partial camera update. Only fields that are `Some` are sent, and unknown
/// keys are rejected on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CameraPatchFields")]
pub struct CameraPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub camera_type: Option<CameraType>,
    #[serde(flatten)]
    pub onvif: OnvifConfigPatch,
}

impl CameraPatch {
    pub fn is_empty(&self) -> bool {
        *self == CameraPatch::default()
    }

    /// Validate only the fields this patch carries.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(location) = &self.location {
            validate_location(location)?;
        }
        if let Some(url) = &self.stream_url {
            validate_stream_url(url)?;
        }
        if let Some(resolution) = &self.resolution {
            validate_resolution(resolution)?;
        }
        if self.onvif.port == Some(0) {
            return Err(Error::validation("ONVIF port must be between 1 and 65535"));
        }
        Ok(())
    }

    /// Merge this patch into `camera` and stamp `updated_at`.
    pub fn apply_to(&self, camera: &mut Camera, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            camera.name = name.clone();
        }
        if let Some(location) = &self.location {
            camera.location = location.clone();
        }
        if let Some(url) = &self.stream_url {
            camera.stream_url = url.clone();
        }
        if let Some(online) = self.is_online {
            camera.is_online = online;
        }
        if let Some(enabled) = self.recording_enabled {
            camera.recording_enabled = enabled;
        }
        if let Some(resolution) = &self.resolution {
            camera.resolution = resolution.clone();
        }
        if let Some(camera_type) = self.camera_type {
            camera.camera_type = camera_type;
        }
        self.onvif.apply_to(&mut camera.onvif);
        camera.updated_at = now.max(camera.updated_at);
    }
}

/// Flat wire form of [`CameraPatch`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CameraPatchFields {
    name: Option<String>,
    location: Option<String>,
    stream_url: Option<String>,
    is_online: Option<bool>,
    recording_enabled: Option<bool>,
    resolution: Option<String>,
    #[serde(rename = "type")]
    camera_type: Option<CameraType>,
    onvif_enabled: Option<bool>,
    onvif_host: Option<String>,
    onvif_port: Option<u16>,
    onvif_username: Option<String>,
    onvif_password: Option<String>,
    onvif_profile_token: Option<String>,
}

impl From<CameraPatchFields> for CameraPatch {
    fn from(f: CameraPatchFields) -> Self {
        Self {
            name: f.name,
            location: f.location,
            stream_url: f.stream_url,
            is_online: f.is_online,
            recording_enabled: f.recording_enabled,
            resolution: f.resolution,
            camera_type: f.camera_type,
            onvif: OnvifConfigPatch {
                enabled: f.onvif_enabled,
                host: f.onvif_host,
                port: f.onvif_port,
                username: f.onvif_username,
                password: f.onvif_password,
                profile_token: f.onvif_profile_token,
            },
        }
    }
}

/// Partial ONVIF update, emitted by device selection and connection tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnvifConfigPatch {
    #[serde(rename = "onvifEnabled", default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "onvifHost", default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(rename = "onvifPort", default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(
        rename = "onvifUsername",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub username: Option<String>,
    #[serde(
        rename = "onvifPassword",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<String>,
    #[serde(
        rename = "onvifProfileToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_token: Option<String>,
}

impl OnvifConfigPatch {
    /// Patch that selects the first media profile of a successful test.
    pub fn from_test_result(result: &ConnectionTestResult) -> Option<Self> {
        if !result.success {
            return None;
        }
        let profile = result.profiles.as_ref()?.first()?;
        Some(Self {
            profile_token: Some(profile.token.clone()),
            ..Self::default()
        })
    }

    pub fn apply_to(&self, config: &mut OnvifConfig) {
        if let Some(enabled) = self.enabled {
            config.enabled = enabled;
        }
        if let Some(host) = &self.host {
            config.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            config.port = Some(port);
        }
        if let Some(username) = &self.username {
            config.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        if let Some(token) = &self.profile_token {
            config.profile_token = Some(token.clone());
        }
    }
}

/// Why a recording was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingType {
    Scheduled,
    Motion,
    Manual,
}

impl RecordingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingType::Scheduled => "scheduled",
            RecordingType::Motion => "motion",
            RecordingType::Manual => "manual",
        }
    }
}

/// A stored video clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: String,

    /// Owning camera.
    pub camera_id: String,

    /// Camera name at the time the recording was listed.
    pub camera_name: String,

    pub filename: String,

    /// Length in seconds.
    pub duration: u64,

    /// Size in megabytes.
    pub size: f64,

    pub start_time: DateTime<Utc>,

    pub end_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    #[serde(rename = "type")]
    pub recording_type: RecordingType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Motion,
    Offline,
    RecordingFailed,
    StorageFull,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Motion => "motion",
            AlertType::Offline => "offline",
            AlertType::RecordingFailed => "recording_failed",
            AlertType::StorageFull => "storage_full",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

/// A notification raised by the backend for one camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub camera_id: String,
    pub camera_name: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    pub severity: AlertSeverity,
    /// Once true, never goes back to false.
    pub is_read: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingQuality {
    Low,
    Medium,
    High,
    Ultra,
}

/// System-wide configuration record. Has no identity and is replaced
/// wholesale on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    pub recording_quality: RecordingQuality,
    /// 1 to 365 days.
    pub storage_retention_days: u32,
    /// 1 (least sensitive) to 10.
    pub motion_sensitivity: u8,
    pub notifications_enabled: bool,
    pub email_alerts: bool,
    /// 1 to 16 streams.
    pub max_concurrent_streams: u8,
    pub night_vision_enabled: bool,
    pub audio_recording_enabled: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            recording_quality: RecordingQuality::High,
            storage_retention_days: 30,
            motion_sensitivity: 5,
            notifications_enabled: true,
            email_alerts: false,
            max_concurrent_streams: 4,
            night_vision_enabled: true,
            audio_recording_enabled: false,
        }
    }
}

impl SystemSettings {
    pub fn validate(&self) -> Result<()> {
        if !(1..=365).contains(&self.storage_retention_days) {
            return Err(Error::validation(
                "storage retention must be between 1 and 365 days",
            ));
        }
        if !(1..=10).contains(&self.motion_sensitivity) {
            return Err(Error::validation(
                "motion sensitivity must be between 1 and 10",
            ));
        }
        if !(1..=16).contains(&self.max_concurrent_streams) {
            return Err(Error::validation(
                "max concurrent streams must be between 1 and 16",
            ));
        }
        Ok(())
    }
}

/// Partial settings change submitted by the settings panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPatch {
    #[serde(default)]
    pub recording_quality: Option<RecordingQuality>,
    #[serde(default)]
    pub storage_retention_days: Option<u32>,
    #[serde(default)]
    pub motion_sensitivity: Option<u8>,
    #[serde(default)]
    pub notifications_enabled: Option<bool>,
    #[serde(default)]
    pub email_alerts: Option<bool>,
    #[serde(default)]
    pub max_concurrent_streams: Option<u8>,
    #[serde(default)]
    pub night_vision_enabled: Option<bool>,
    #[serde(default)]
    pub audio_recording_enabled: Option<bool>,
}

impl SettingsPatch {
    /// Produce the settings record that results from applying this patch.
    pub fn merge(&self, base: &SystemSettings) -> SystemSettings {
        SystemSettings {
            recording_quality: self.recording_quality.unwrap_or(base.recording_quality),
            storage_retention_days: self
                .storage_retention_days
                .unwrap_or(base.storage_retention_days),
            motion_sensitivity: self.motion_sensitivity.unwrap_or(base.motion_sensitivity),
            notifications_enabled: self
                .notifications_enabled
                .unwrap_or(base.notifications_enabled),
            email_alerts: self.email_alerts.unwrap_or(base.email_alerts),
            max_concurrent_streams: self
                .max_concurrent_streams
                .unwrap_or(base.max_concurrent_streams),
            night_vision_enabled: self
                .night_vision_enabled
                .unwrap_or(base.night_vision_enabled),
            audio_recording_enabled: self
                .audio_recording_enabled
                .unwrap_or(base.audio_recording_enabled),
        }
    }
}

/// The three entity collections the dashboard keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Cameras,
    Recordings,
    Alerts,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Cameras => "cameras",
            CollectionKind::Recordings => "recordings",
            CollectionKind::Alerts => "alerts",
        }
    }
}

/// Aggregate figures shown on the dashboard overview.
///
/// Always derived from the camera, recording and alert collections; see
/// [`crate::aggregation::compute_stats`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_cameras: usize,
    pub online_cameras: usize,
    pub offline_cameras: usize,
    pub total_recordings: usize,
    /// Gigabytes.
    pub storage_used: f64,
    /// Gigabytes; configured, not derived.
    pub storage_total: f64,
    pub unread_alerts: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_motion_detected: Option<DateTime<Utc>>,
}

// ============================================================================
// ONVIF types
// ============================================================================

/// A device that answered a discovery request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnvifDevice {
    pub urn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub xaddrs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
}

/// Outcome of a bounded discovery scan. A non-empty `error` next to some
/// devices means the scan was partial, not failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    #[serde(default)]
    pub devices: Vec<OnvifDevice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A media profile exposed by an ONVIF device. Configuration sections are
/// kept as opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnvifProfile {
    pub token: String,
    pub name: String,
    #[serde(default)]
    pub video_source_configuration: serde_json::Value,
    #[serde(default)]
    pub video_encoder_configuration: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ptz_configuration: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnvifCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ptz: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imaging: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<serde_json::Value>,
}

/// Capabilities and profiles of a registered ONVIF camera.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraCapabilities {
    #[serde(default)]
    pub capabilities: OnvifCapabilities,
    #[serde(default)]
    pub profiles: Vec<OnvifProfile>,
}

/// Credentials for probing a device before it is registered.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct OnvifCredentials {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for OnvifCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnvifCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl OnvifCredentials {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty()
            || self.username.trim().is_empty()
            || self.password.is_empty()
        {
            return Err(Error::validation(
                "Please fill in host, username, and password",
            ));
        }
        if self.port == Some(0) {
            return Err(Error::validation("ONVIF port must be between 1 and 65535"));
        }
        Ok(())
    }
}

/// Result of a device connection test. `success: false` with an `error`
/// describes a credential or device problem, not a transport failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<OnvifCapabilities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Vec<OnvifProfile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PtzAction {
    Move,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PtzDirection {
    Up,
    Down,
    Left,
    Right,
    ZoomIn,
    ZoomOut,
    Stop,
    Preset,
}

/// Pan/tilt/zoom request forwarded to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PtzCommand {
    pub action: PtzAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<PtzDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_token: Option<String>,
}

impl PtzCommand {
    pub fn movement(direction: PtzDirection, speed: Option<f32>) -> Self {
        Self {
            action: PtzAction::Move,
            direction: Some(direction),
            speed,
            preset_token: None,
        }
    }

    pub fn stop() -> Self {
        Self {
            action: PtzAction::Stop,
            direction: Some(PtzDirection::Stop),
            speed: None,
            preset_token: None,
        }
    }
}

// ============================================================================
// Field validation
// ============================================================================

fn validate_name(name: &str) -> Result<()> {
    let len = name.trim().chars().count();
    if !(2..=50).contains(&len) {
        return Err(Error::validation(
            "camera name must be between 2 and 50 characters",
        ));
    }
    Ok(())
}

fn validate_location(location: &str) -> Result<()> {
    let len = location.trim().chars().count();
    if !(2..=100).contains(&len) {
        return Err(Error::validation(
            "location must be between 2 and 100 characters",
        ));
    }
    Ok(())
}

/// Accept absolute `rtsp`, `http` and `https` URLs only.
pub fn validate_stream_url(stream_url: &str) -> Result<()> {
    let parsed = url::Url::parse(stream_url)
        .map_err(|e| Error::validation(format!("invalid stream URL: {}", e)))?;
    match parsed.scheme() {
        "rtsp" | "http" | "https" => Ok(()),
        other => Err(Error::validation(format!(
            "unsupported stream URL scheme '{}'",
            other
        ))),
    }
}

fn validate_resolution(resolution: &str) -> Result<()> {
    if SUPPORTED_RESOLUTIONS.contains(&resolution) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "unsupported resolution '{}'",
            resolution
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 11, h, m, 0).unwrap()
    }

    fn sample_camera() -> Camera {
        Camera {
            id: "1".to_string(),
            name: "Front Door".to_string(),
            location: "Main Entrance".to_string(),
            stream_url: "rtsp://192.168.1.100:554/stream1".to_string(),
            is_online: true,
            recording_enabled: true,
            resolution: "1080p".to_string(),
            camera_type: CameraType::Outdoor,
            onvif: OnvifConfig::default(),
            last_motion_detected: Some(ts(12, 0)),
            created_at: ts(9, 0),
            updated_at: ts(10, 0),
        }
    }

    #[test]
    fn test_camera_wire_format() {
        let mut camera = sample_camera();
        camera.onvif = OnvifConfig {
            enabled: true,
            host: Some("192.168.1.100".to_string()),
            port: Some(8080),
            ..OnvifConfig::default()
        };

        let value = serde_json::to_value(&camera).unwrap();
        assert_eq!(value["streamUrl"], "rtsp://192.168.1.100:554/stream1");
        assert_eq!(value["type"], "outdoor");
        assert_eq!(value["onvifEnabled"], true);
        assert_eq!(value["onvifPort"], 8080);
        assert!(value.get("onvif").is_none());
        assert!(value.get("onvifUsername").is_none());

        let back: Camera = serde_json::from_value(value).unwrap();
        assert_eq!(back, camera);
    }

    #[test]
    fn test_camera_without_onvif_fields() {
        let camera: Camera = serde_json::from_value(json!({
            "id": "7",
            "name": "Garage",
            "location": "Side Entrance",
            "streamUrl": "https://demo.url/stream4",
            "isOnline": false,
            "recordingEnabled": false,
            "resolution": "720p",
            "type": "indoor",
            "createdAt": "2024-02-01T00:00:00Z",
            "updatedAt": "2024-06-11T10:00:00Z"
        }))
        .unwrap();

        assert!(!camera.onvif.enabled);
        assert!(camera.last_motion_detected.is_none());
    }

    #[test]
    fn test_alert_type_wire_names() {
        assert_eq!(
            serde_json::to_value(AlertType::RecordingFailed).unwrap(),
            "recording_failed"
        );
        assert_eq!(
            serde_json::to_value(AlertType::StorageFull).unwrap(),
            "storage_full"
        );
        assert!(AlertSeverity::High > AlertSeverity::Low);
    }

    #[test]
    fn test_draft_validation() {
        let draft = CameraDraft::new(
            "Porch",
            "Front yard",
            "rtsp://10.0.0.5/live",
            CameraType::Outdoor,
        );
        assert!(draft.validate().is_ok());

        let short_name = CameraDraft { name: " a ".to_string(), ..draft.clone() };
        assert!(matches!(short_name.validate(), Err(Error::Validation(_))));

        let bad_scheme = CameraDraft {
            stream_url: "ftp://10.0.0.5/live".to_string(),
            ..draft.clone()
        };
        assert!(bad_scheme.validate().is_err());

        let not_a_url = CameraDraft { stream_url: "camera five".to_string(), ..draft.clone() };
        assert!(not_a_url.validate().is_err());

        let bad_resolution = draft.clone().with_resolution("8K");
        assert!(bad_resolution.validate().is_err());

        let onvif_without_host = draft.with_onvif(OnvifConfig {
            enabled: true,
            ..OnvifConfig::default()
        });
        assert!(onvif_without_host.validate().is_err());
    }

    #[test]
    fn test_draft_leaves_status_to_backend() {
        let draft = CameraDraft::new("Porch", "Front yard", "rtsp://10.0.0.5/live", CameraType::Indoor);
        let value = serde_json::to_value(&draft).unwrap();
        assert!(value.get("isOnline").is_none());
        assert_eq!(value["recordingEnabled"], true);
        assert_eq!(value["onvifEnabled"], false);
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = CameraPatch {
            name: Some("Front Gate".to_string()),
            onvif: OnvifConfigPatch {
                port: Some(8000),
                ..OnvifConfigPatch::default()
            },
            ..CameraPatch::default()
        };

        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, json!({ "name": "Front Gate", "onvifPort": 8000 }));
        assert!(!patch.is_empty());
        assert!(CameraPatch::default().is_empty());
    }

    #[test]
    fn test_patch_apply_to() {
        let mut camera = sample_camera();
        let patch = CameraPatch {
            location: Some("Porch".to_string()),
            recording_enabled: Some(false),
            onvif: OnvifConfigPatch {
                enabled: Some(true),
                host: Some("10.0.0.9".to_string()),
                ..OnvifConfigPatch::default()
            },
            ..CameraPatch::default()
        };

        patch.apply_to(&mut camera, ts(11, 0));

        assert_eq!(camera.name, "Front Door");
        assert_eq!(camera.location, "Porch");
        assert!(!camera.recording_enabled);
        assert!(camera.onvif.enabled);
        assert_eq!(camera.onvif.host.as_deref(), Some("10.0.0.9"));
        assert_eq!(camera.updated_at, ts(11, 0));

        // updated_at never moves backwards
        CameraPatch::default().apply_to(&mut camera, ts(8, 0));
        assert_eq!(camera.updated_at, ts(11, 0));
    }

    #[test]
    fn test_onvif_patch_from_test_result() {
        let result = ConnectionTestResult {
            success: true,
            profiles: Some(vec![OnvifProfile {
                token: "profile_1".to_string(),
                name: "Main".to_string(),
                video_source_configuration: json!({}),
                video_encoder_configuration: json!({}),
                ptz_configuration: None,
            }]),
            ..ConnectionTestResult::default()
        };

        let patch = OnvifConfigPatch::from_test_result(&result).unwrap();
        assert_eq!(patch.profile_token.as_deref(), Some("profile_1"));

        let failed = ConnectionTestResult {
            success: false,
            error: Some("Unauthorized".to_string()),
            ..ConnectionTestResult::default()
        };
        assert!(OnvifConfigPatch::from_test_result(&failed).is_none());
    }

    #[test]
    fn test_settings_merge_and_validate() {
        let base = SystemSettings::default();
        let patch = SettingsPatch {
            motion_sensitivity: Some(8),
            email_alerts: Some(true),
            ..SettingsPatch::default()
        };

        let merged = patch.merge(&base);
        assert_eq!(merged.motion_sensitivity, 8);
        assert!(merged.email_alerts);
        assert_eq!(merged.storage_retention_days, 30);
        assert!(merged.validate().is_ok());

        let too_sensitive = SettingsPatch {
            motion_sensitivity: Some(11),
            ..SettingsPatch::default()
        }
        .merge(&base);
        assert!(too_sensitive.validate().is_err());
    }

    #[test]
    fn test_settings_patch_rejects_unknown_keys() {
        let result: std::result::Result<SettingsPatch, _> =
            serde_json::from_value(json!({ "motionSensitivity": 3, "adminMode": true }));
        assert!(result.is_err());
    }

    #[test]
    fn test_camera_payloads_reject_unknown_keys() {
        let patch: CameraPatch =
            serde_json::from_value(json!({ "name": "Porch", "onvifHost": "10.0.0.9" })).unwrap();
        assert_eq!(patch.name.as_deref(), Some("Porch"));
        assert_eq!(patch.onvif.host.as_deref(), Some("10.0.0.9"));

        let unknown: std::result::Result<CameraPatch, _> =
            serde_json::from_value(json!({ "name": "Porch", "colour": "red" }));
        assert!(unknown.is_err());

        let draft: CameraDraft = serde_json::from_value(json!({
            "name": "Porch",
            "location": "Front yard",
            "streamUrl": "rtsp://10.0.0.5/live",
            "type": "outdoor",
            "onvifEnabled": true,
            "onvifHost": "10.0.0.5"
        }))
        .unwrap();
        assert!(draft.recording_enabled);
        assert_eq!(draft.resolution, "1080p");
        assert!(draft.onvif.enabled);

        let online: std::result::Result<CameraDraft, _> = serde_json::from_value(json!({
            "name": "Porch",
            "location": "Front yard",
            "streamUrl": "rtsp://10.0.0.5/live",
            "type": "outdoor",
            "isOnline": true
        }));
        assert!(online.is_err());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = OnvifCredentials {
            host: "10.0.0.9".to_string(),
            port: None,
            username: "admin".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("hunter2"));
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn test_ptz_command_wire_format() {
        let value = serde_json::to_value(PtzCommand::movement(PtzDirection::ZoomIn, Some(0.5))).unwrap();
        assert_eq!(value, json!({ "action": "move", "direction": "zoom_in", "speed": 0.5 }));
    }
}
