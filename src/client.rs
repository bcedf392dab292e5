//! REST client for the camera backend.
//!
//! Every endpoint answers with a `{success, data?, error?}` envelope. The
//! client unwraps it and maps failures onto [`Error`]:
//!
//! - no response (refused, DNS, timeout) becomes [`Error::Network`]
//! - HTTP 404 becomes [`Error::NotFound`]
//! - any other non-2xx status, or `success: false`, becomes [`Error::Api`]
//!
//! The client never validates its inputs and never retries; both are the
//! caller's business.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::model::{
    Alert, Camera, CameraCapabilities, CameraDraft, CameraPatch, ConnectionTestResult,
    DashboardStats, DiscoveryResult, OnvifCredentials, PtzCommand, Recording,
};

/// Scan window used when the caller does not pick one.
pub const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 5000;

/// Response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

// ============================================================================
// Transport
// ============================================================================

/// HTTP plumbing shared by [`CctvClient`] and the streaming client.
#[derive(Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    debug: bool,
}

/// Raw answer before envelope handling.
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl Transport {
    pub(crate) fn new(base_url: &str, timeout: Duration, debug: bool) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            debug,
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request and read the whole body.
    ///
    /// `timeout` overrides the configured per-request timeout.
    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        timeout: Option<Duration>,
    ) -> Result<RawResponse> {
        let url = self.url(path);

        let payload = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| Error::validation(format!("unserializable request body: {}", e)))?;

        if self.debug {
            debug!(
                method = %method,
                url = %url,
                body = ?payload.as_ref().map(redact),
                "API request"
            );
        }

        let mut request = self
            .http
            .request(method.clone(), &url)
            .timeout(timeout.unwrap_or(self.timeout));
        if let Some(payload) = &payload {
            request = request.json(payload);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                if self.debug {
                    debug!(method = %method, url = %url, error = %e, "API request failed");
                }
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.text().await?;

        if self.debug {
            match serde_json::from_str::<Value>(&body) {
                Ok(value) => debug!(
                    method = %method,
                    url = %url,
                    status = status.as_u16(),
                    body = %redact(&value),
                    "API response"
                ),
                Err(_) => debug!(
                    method = %method,
                    url = %url,
                    status = status.as_u16(),
                    body_len = body.len(),
                    "API response"
                ),
            }
        }

        Ok(RawResponse { status, body })
    }

    /// Send a request and unwrap the envelope, returning its `data` member.
    pub(crate) async fn call<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        timeout: Option<Duration>,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let raw = self.send(method, path, body, timeout).await?;
        unwrap_envelope(raw, path)
    }

    /// Like [`Transport::call`] but a missing `data` member is an error.
    pub(crate) async fn fetch<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.call(method, path, body, None)
            .await?
            .ok_or_else(|| Error::Api {
                status: 200,
                message: format!("response for {} carried no data", path),
            })
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch::<T, ()>(Method::GET, path, None).await
    }
}

fn unwrap_envelope<T: DeserializeOwned>(raw: RawResponse, path: &str) -> Result<Option<T>> {
    let status = raw.status;

    // Error bodies are not guaranteed to be envelopes.
    let parsed: std::result::Result<Envelope<T>, _> = serde_json::from_str(&raw.body);

    if status == StatusCode::NOT_FOUND {
        let message = parsed
            .ok()
            .and_then(|e| e.error)
            .unwrap_or_else(|| path.to_string());
        return Err(Error::NotFound(message));
    }

    if !status.is_success() {
        let message = match parsed {
            Ok(Envelope { error: Some(e), .. }) => e,
            _ => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        return Err(Error::Api {
            status: status.as_u16(),
            message,
        });
    }

    // 204-style answers to deletes.
    if raw.body.trim().is_empty() {
        return Ok(None);
    }

    let envelope = parsed.map_err(|e| Error::Api {
        status: status.as_u16(),
        message: format!("invalid response body: {}", e),
    })?;

    if !envelope.success {
        return Err(Error::Api {
            status: status.as_u16(),
            message: envelope
                .error
                .unwrap_or_else(|| format!("{} reported failure", path)),
        });
    }

    Ok(envelope.data)
}

/// Mask credential fields before a body reaches the logs.
fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    if k.to_ascii_lowercase().contains("password") {
                        (k.clone(), Value::String("***".to_string()))
                    } else {
                        (k.clone(), redact(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Escape a path segment.
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

// ============================================================================
// Backend client
// ============================================================================

/// Entities that can be listed from the backend.
pub trait RemoteEntity: DeserializeOwned + Send {
    /// Collection path relative to the base URL.
    const PATH: &'static str;
}

impl RemoteEntity for Camera {
    const PATH: &'static str = "/cameras";
}

impl RemoteEntity for Recording {
    const PATH: &'static str = "/recordings";
}

impl RemoteEntity for Alert {
    const PATH: &'static str = "/alerts";
}

/// Client for the camera backend REST API.
#[derive(Clone)]
pub struct CctvClient {
    transport: Transport,
    config: ClientConfig,
}

impl Default for CctvClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl CctvClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            transport: Transport::new(&config.base_url, config.timeout, config.debug),
            config,
        }
    }

    /// Create a client with a custom base URL and default timeout.
    pub fn with_base_url(base_url: &str) -> Self {
        Self::new(ClientConfig::new(base_url))
    }

    /// Base URL, timeout and debug flag in use.
    pub fn environment(&self) -> &ClientConfig {
        &self.config
    }

    /// List every entity of kind `T`, in backend order.
    pub async fn list<T: RemoteEntity>(&self) -> Result<Vec<T>> {
        self.transport.get(T::PATH).await
    }

    pub async fn list_cameras(&self) -> Result<Vec<Camera>> {
        self.list().await
    }

    pub async fn list_recordings(&self) -> Result<Vec<Recording>> {
        self.list().await
    }

    pub async fn list_alerts(&self) -> Result<Vec<Alert>> {
        self.list().await
    }

    pub async fn get_camera(&self, id: &str) -> Result<Camera> {
        self.transport
            .get(&format!("/cameras/{}", segment(id)))
            .await
    }

    /// Create a camera. The backend assigns id and timestamps.
    pub async fn create_camera(&self, draft: &CameraDraft) -> Result<Camera> {
        self.transport
            .fetch(Method::POST, "/cameras", Some(draft))
            .await
    }

    /// Apply a partial update and return the canonical record.
    pub async fn update_camera(&self, id: &str, patch: &CameraPatch) -> Result<Camera> {
        self.transport
            .fetch(Method::PUT, &format!("/cameras/{}", segment(id)), Some(patch))
            .await
    }

    pub async fn delete_camera(&self, id: &str) -> Result<()> {
        self.transport
            .call::<Value, ()>(
                Method::DELETE,
                &format!("/cameras/{}", segment(id)),
                None,
                None,
            )
            .await?;
        Ok(())
    }

    /// Mark one alert as read and return the updated alert.
    pub async fn mark_alert_read(&self, id: &str) -> Result<Alert> {
        self.transport
            .fetch(
                Method::PUT,
                &format!("/alerts/{}", segment(id)),
                Some(&json!({ "isRead": true })),
            )
            .await
    }

    /// Scan the network for ONVIF devices.
    ///
    /// The backend blocks for the whole scan window, so the request timeout
    /// is extended by `timeout_ms`.
    pub async fn discover_devices(&self, timeout_ms: u64) -> Result<DiscoveryResult> {
        let path = format!("/cameras/onvif/discover?timeout={}", timeout_ms);
        let timeout = self.config.timeout + Duration::from_millis(timeout_ms);

        self.transport
            .call::<DiscoveryResult, ()>(Method::GET, &path, None, Some(timeout))
            .await?
            .ok_or_else(|| Error::Api {
                status: 200,
                message: "discovery response carried no data".to_string(),
            })
    }

    /// Probe a device with the given credentials.
    ///
    /// Rejected credentials are reported inside the result, whatever the
    /// HTTP status; only transport failures and unreadable bodies are errors.
    pub async fn test_device_connection(
        &self,
        credentials: &OnvifCredentials,
    ) -> Result<ConnectionTestResult> {
        let raw = self
            .transport
            .send(Method::POST, "/cameras/onvif/test", Some(credentials), None)
            .await?;

        let value: Value = serde_json::from_str(&raw.body).map_err(|e| Error::Api {
            status: raw.status.as_u16(),
            message: format!("invalid response body: {}", e),
        })?;

        let result = match value.get("data") {
            Some(data) if !data.is_null() => data.clone(),
            _ => value,
        };

        serde_json::from_value(result).map_err(|e| Error::Api {
            status: raw.status.as_u16(),
            message: format!("invalid connection test result: {}", e),
        })
    }

    pub async fn onvif_capabilities(&self, camera_id: &str) -> Result<CameraCapabilities> {
        self.transport
            .get(&format!("/cameras/{}/onvif/capabilities", segment(camera_id)))
            .await
    }

    /// Send a pan/tilt/zoom command. Returns the backend's success flag.
    pub async fn control_ptz(&self, camera_id: &str, command: &PtzCommand) -> Result<bool> {
        let path = format!("/cameras/{}/onvif/ptz", segment(camera_id));
        let raw = self
            .transport
            .send(Method::POST, &path, Some(command), None)
            .await?;

        if raw.status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(path));
        }
        if !raw.status.is_success() {
            return Err(Error::Api {
                status: raw.status.as_u16(),
                message: "PTZ command rejected".to_string(),
            });
        }

        let envelope: Envelope<Value> = serde_json::from_str(&raw.body).map_err(|e| Error::Api {
            status: raw.status.as_u16(),
            message: format!("invalid response body: {}", e),
        })?;
        Ok(envelope.success)
    }

    /// Server-side aggregate, independent of the locally derived stats.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.transport.get("/dashboard/stats").await
    }
}
