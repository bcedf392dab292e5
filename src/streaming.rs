//! Client for the streaming service that turns RTSP feeds into HLS.
//!
//! Unlike the backend client, stream start-up is allowed to retry: cameras
//! often need a moment after power-up before the transcoder can attach.
//! The retry lives here, in [`StreamClient::start_stream_with_retry`], and
//! nowhere else.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::{Transport, segment};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::model::Camera;

/// Path of the streaming API below the service base URL.
const STREAMS_PATH: &str = "/api/v1/streams";

/// Timeout the streaming service applies to an RTSP reachability check.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Starting,
    Running,
    Stopped,
    Error,
}

/// Body of `POST /start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartStreamRequest {
    pub camera_id: String,
    pub format: String,
    pub preset: String,
    pub resolution: String,
}

impl StartStreamRequest {
    /// HLS output sized after the camera's configured resolution.
    pub fn for_camera(camera: &Camera) -> Self {
        Self {
            camera_id: camera.id.clone(),
            format: "hls".to_string(),
            preset: "faster".to_string(),
            resolution: output_resolution(&camera.resolution).to_string(),
        }
    }
}

/// Map a camera resolution label to transcoder output dimensions.
pub fn output_resolution(resolution: &str) -> &'static str {
    match resolution {
        "4K" => "3840x2160",
        "1080p" => "1920x1080",
        _ => "1280x720",
    }
}

/// A started stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub stream_id: String,
    /// HLS playlist URL.
    pub stream_url: String,
    pub status: StreamStatus,
    pub started_at: DateTime<Utc>,
}

/// Entry of the active stream list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveStream {
    pub id: String,
    pub rtsp_url: String,
    pub status: StreamStatus,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(default)]
    pub viewers: u32,
}

/// Body of `POST /recording/start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingRequest {
    pub camera_id: String,
    /// Seconds; open-ended when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    pub format: String,
    pub quality: String,
}

impl StartRecordingRequest {
    pub fn new(camera_id: &str, duration: Option<u64>) -> Self {
        Self {
            camera_id: camera_id.to_string(),
            duration,
            format: "mp4".to_string(),
            quality: "medium".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCamera {
    pub id: String,
    pub name: String,
    pub location: String,
}

/// An in-progress recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSession {
    pub recording_id: String,
    pub camera: SessionCamera,
    pub output_path: String,
    pub duration: Option<u64>,
    pub format: String,
    pub quality: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnail {
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamTestRequest<'a> {
    rtsp_url: &'a str,
    timeout: u64,
}

/// Outcome of an RTSP reachability check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamTestResult {
    pub accessible: bool,
    /// Milliseconds.
    pub response_time: Option<u64>,
    pub error: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Bounded, fixed-delay retry for stream start-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(3),
        }
    }
}

#[derive(Clone)]
pub struct StreamClient {
    transport: Transport,
}

impl StreamClient {
    /// `base_url` is the service root; the `/api/v1/streams` prefix is added here.
    pub fn new(base_url: &str, timeout: Duration, debug: bool) -> Self {
        let root = format!("{}{}", base_url.trim_end_matches('/'), STREAMS_PATH);
        Self {
            transport: Transport::new(&root, timeout, debug),
        }
    }

    /// Reuse the backend client settings against a different root.
    pub fn from_client_config(base_url: &str, config: &ClientConfig) -> Self {
        Self::new(base_url, config.timeout, config.debug)
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub async fn start_stream(&self, camera: &Camera) -> Result<StreamInfo> {
        let request = StartStreamRequest::for_camera(camera);
        debug!(camera_id = %camera.id, resolution = %request.resolution, "Starting stream");
        self.transport
            .fetch(Method::POST, "/start", Some(&request))
            .await
    }

    /// Start a stream, retrying failures per `policy`.
    ///
    /// Returns the last error once the retries are exhausted.
    pub async fn start_stream_with_retry(
        &self,
        camera: &Camera,
        policy: RetryPolicy,
    ) -> Result<StreamInfo> {
        let mut attempt = 0;
        loop {
            match self.start_stream(camera).await {
                Ok(info) => {
                    info!(camera_id = %camera.id, stream_id = %info.stream_id, "Stream started");
                    return Ok(info);
                }
                Err(e) if attempt < policy.max_retries => {
                    attempt += 1;
                    warn!(
                        camera_id = %camera.id,
                        attempt,
                        max_retries = policy.max_retries,
                        error = %e,
                        "Stream start failed, retrying"
                    );
                    tokio::time::sleep(policy.delay).await;
                }
                Err(e) => {
                    warn!(camera_id = %camera.id, error = %e, "Stream start failed, giving up");
                    return Err(e);
                }
            }
        }
    }

    pub async fn stop_stream(&self, stream_id: &str) -> Result<()> {
        self.transport
            .call::<Value, ()>(Method::DELETE, &format!("/{}", segment(stream_id)), None, None)
            .await?;
        Ok(())
    }

    pub async fn list_streams(&self) -> Result<Vec<ActiveStream>> {
        self.transport.get("").await
    }

    pub async fn start_recording(&self, request: &StartRecordingRequest) -> Result<RecordingSession> {
        self.transport
            .fetch(Method::POST, "/recording/start", Some(request))
            .await
    }

    pub async fn stop_recording(&self, recording_id: &str) -> Result<()> {
        self.transport
            .call::<Value, ()>(
                Method::DELETE,
                &format!("/recording/{}", segment(recording_id)),
                None,
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn generate_thumbnail(&self, camera_id: &str) -> Result<Thumbnail> {
        self.transport
            .fetch::<Thumbnail, ()>(
                Method::POST,
                &format!("/thumbnail/{}", segment(camera_id)),
                None,
            )
            .await
    }

    /// Ask the service whether an RTSP URL answers.
    pub async fn test_stream(&self, rtsp_url: &str) -> Result<StreamTestResult> {
        let request = StreamTestRequest {
            rtsp_url,
            timeout: DEFAULT_PROBE_TIMEOUT_MS,
        };
        // The check itself may take the full timeout window.
        let timeout = Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS) + Duration::from_secs(1);
        self.transport
            .call::<StreamTestResult, _>(Method::POST, "/test", Some(&request), Some(timeout))
            .await?
            .ok_or_else(|| crate::error::Error::Api {
                status: 200,
                message: "stream test response carried no data".to_string(),
            })
    }
}

// ============================================================================
// Poller
// ============================================================================

/// Re-fetches the active stream list on a fixed interval.
///
/// A failed poll keeps the previously published list.
pub struct StreamPoller {
    client: StreamClient,
    interval: Duration,
}

impl StreamPoller {
    pub fn new(client: StreamClient, interval: Duration) -> Self {
        Self { client, interval }
    }

    /// Fetch once and publish on success. Returns whether the list changed.
    pub async fn poll_once(&self, tx: &watch::Sender<Vec<ActiveStream>>) -> bool {
        match self.client.list_streams().await {
            Ok(streams) => {
                debug!(count = streams.len(), "Active streams polled");
                tx.send_if_modified(|current| {
                    if *current == streams {
                        false
                    } else {
                        *current = streams;
                        true
                    }
                })
            }
            Err(e) => {
                warn!(error = %e, "Failed to poll active streams");
                false
            }
        }
    }

    /// Start polling in the background.
    ///
    /// The task stops once every receiver is dropped.
    pub fn spawn(self) -> (watch::Receiver<Vec<ActiveStream>>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(Vec::new());

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            loop {
                interval.tick().await;
                if tx.is_closed() {
                    debug!("Stream poller has no subscribers, stopping");
                    break;
                }
                self.poll_once(&tx).await;
            }
        });

        (rx, handle)
    }
}
