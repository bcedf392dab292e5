//! Derived statistics for the dashboard overview.
//!
//! Everything here is a pure function of the camera, recording and alert
//! collections. [`compute_stats`] is the single place `DashboardStats` is
//! built; the controller calls it after every successful mutation so the
//! overview can never drift from the collections it summarises.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Alert, Camera, CameraType, DashboardStats, Recording};

/// Default storage ceiling in gigabytes.
pub const DEFAULT_STORAGE_TOTAL_GB: f64 = 500.0;

const MB_PER_GB: f64 = 1024.0;

/// Compute the overview snapshot.
///
/// # Arguments
///
/// * `cameras`, `recordings`, `alerts` - The authoritative collections
/// * `storage_total_gb` - Configured storage ceiling
pub fn compute_stats(
    cameras: &[Camera],
    recordings: &[Recording],
    alerts: &[Alert],
    storage_total_gb: f64,
) -> DashboardStats {
    let total_cameras = cameras.len();
    let online_cameras = online_camera_count(cameras);

    DashboardStats {
        total_cameras,
        online_cameras,
        offline_cameras: total_cameras - online_cameras,
        total_recordings: recordings.len(),
        storage_used: total_recording_size(recordings) / MB_PER_GB,
        storage_total: storage_total_gb,
        unread_alerts: unread_alert_count(alerts),
        last_motion_detected: last_motion_detected(cameras),
    }
}

pub fn online_camera_count(cameras: &[Camera]) -> usize {
    cameras.iter().filter(|c| c.is_online).count()
}

pub fn recording_enabled_count(cameras: &[Camera]) -> usize {
    cameras.iter().filter(|c| c.recording_enabled).count()
}

pub fn cameras_by_type(cameras: &[Camera], camera_type: CameraType) -> Vec<Camera> {
    cameras
        .iter()
        .filter(|c| c.camera_type == camera_type)
        .cloned()
        .collect()
}

/// Most recent motion timestamp across cameras that report one.
pub fn last_motion_detected(cameras: &[Camera]) -> Option<DateTime<Utc>> {
    cameras.iter().filter_map(|c| c.last_motion_detected).max()
}

pub fn unread_alert_count(alerts: &[Alert]) -> usize {
    alerts.iter().filter(|a| !a.is_read).count()
}

/// Total size in megabytes.
pub fn total_recording_size(recordings: &[Recording]) -> f64 {
    recordings.iter().map(|r| r.size).sum()
}

/// Total length in seconds.
pub fn total_recording_duration(recordings: &[Recording]) -> u64 {
    recordings.iter().map(|r| r.duration).sum()
}

/// How full the storage is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageStatus {
    /// Below 70%.
    Low,
    /// 70% to 89%.
    Medium,
    /// 90% and above.
    High,
}

impl StorageStatus {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= 90 {
            StorageStatus::High
        } else if percentage >= 70 {
            StorageStatus::Medium
        } else {
            StorageStatus::Low
        }
    }
}

/// Rounded usage percentage. A zero ceiling reports 0.
pub fn storage_percentage(used: f64, total: f64) -> u32 {
    if total <= 0.0 {
        return 0;
    }
    ((used / total) * 100.0).round().max(0.0) as u32
}

/// Storage usage summary rendered next to the overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub used_gb: f64,
    pub total_gb: f64,
    pub percentage: u32,
    pub status: StorageStatus,
}

impl StorageUsage {
    pub fn from_stats(stats: &DashboardStats) -> Self {
        let percentage = storage_percentage(stats.storage_used, stats.storage_total);
        Self {
            used_gb: stats.storage_used,
            total_gb: stats.storage_total,
            percentage,
            status: StorageStatus::from_percentage(percentage),
        }
    }
}
