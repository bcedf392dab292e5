//! Built-in demo dataset.
//!
//! Used by the dashboard when a collection can be loaded neither from the
//! backend nor from the snapshot cache, so the views never come up blank.

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{
    Alert, AlertSeverity, AlertType, Camera, CameraType, OnvifConfig, Recording, RecordingType,
};

fn at(month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, hour, min, 0)
        .single()
        .unwrap_or_default()
}

fn camera(
    id: &str,
    name: &str,
    location: &str,
    online: bool,
    recording: bool,
    camera_type: CameraType,
    created: DateTime<Utc>,
    last_motion: Option<DateTime<Utc>>,
) -> Camera {
    Camera {
        id: id.to_string(),
        name: name.to_string(),
        location: location.to_string(),
        stream_url: format!("https://demo.url/stream{}", id),
        is_online: online,
        recording_enabled: recording,
        resolution: "1080p".to_string(),
        camera_type,
        onvif: OnvifConfig::default(),
        last_motion_detected: last_motion,
        created_at: created,
        updated_at: at(6, 11, 10, 0),
    }
}

pub fn cameras() -> Vec<Camera> {
    let mut backyard = camera(
        "3",
        "Backyard",
        "Garden",
        false,
        true,
        CameraType::Outdoor,
        at(1, 25, 0, 0),
        Some(at(6, 11, 11, 30)),
    );
    backyard.resolution = "720p".to_string();

    vec![
        camera(
            "1",
            "Front Door",
            "Main Entrance",
            true,
            true,
            CameraType::Outdoor,
            at(1, 15, 0, 0),
            Some(at(6, 11, 12, 0)),
        ),
        camera(
            "2",
            "Living Room",
            "Interior",
            true,
            true,
            CameraType::Indoor,
            at(1, 20, 0, 0),
            None,
        ),
        backyard,
        camera(
            "4",
            "Garage",
            "Side Entrance",
            true,
            false,
            CameraType::Indoor,
            at(2, 1, 0, 0),
            None,
        ),
    ]
}

fn recording(
    id: &str,
    camera_id: &str,
    camera_name: &str,
    filename: &str,
    start: DateTime<Utc>,
    duration: u64,
    size: f64,
    recording_type: RecordingType,
) -> Recording {
    Recording {
        id: id.to_string(),
        camera_id: camera_id.to_string(),
        camera_name: camera_name.to_string(),
        filename: filename.to_string(),
        duration,
        size,
        start_time: start,
        end_time: start + chrono::Duration::seconds(duration as i64),
        thumbnail: None,
        recording_type,
    }
}

pub fn recordings() -> Vec<Recording> {
    vec![
        recording(
            "1",
            "1",
            "Front Door",
            "front_door_20240611_120000.mp4",
            at(6, 11, 12, 0),
            300,
            125.5,
            RecordingType::Motion,
        ),
        recording(
            "2",
            "2",
            "Living Room",
            "living_room_20240611_080000.mp4",
            at(6, 11, 8, 0),
            3600,
            890.2,
            RecordingType::Scheduled,
        ),
        recording(
            "3",
            "3",
            "Backyard",
            "backyard_20240611_113000.mp4",
            at(6, 11, 11, 30),
            180,
            67.8,
            RecordingType::Motion,
        ),
        recording(
            "4",
            "4",
            "Garage",
            "garage_20240610_180000.mp4",
            at(6, 10, 18, 0),
            1800,
            445.1,
            RecordingType::Manual,
        ),
        recording(
            "5",
            "1",
            "Front Door",
            "front_door_20240610_000000.mp4",
            at(6, 10, 0, 0),
            7200,
            1780.4,
            RecordingType::Scheduled,
        ),
    ]
}

pub fn alerts() -> Vec<Alert> {
    vec![
        Alert {
            id: "1".to_string(),
            camera_id: "1".to_string(),
            camera_name: "Front Door".to_string(),
            alert_type: AlertType::Motion,
            message: "Motion detected at main entrance".to_string(),
            severity: AlertSeverity::Medium,
            is_read: false,
            timestamp: at(6, 11, 11, 55),
            thumbnail: None,
        },
        Alert {
            id: "2".to_string(),
            camera_id: "3".to_string(),
            camera_name: "Backyard".to_string(),
            alert_type: AlertType::Offline,
            message: "Camera went offline".to_string(),
            severity: AlertSeverity::High,
            is_read: false,
            timestamp: at(6, 11, 11, 45),
            thumbnail: None,
        },
    ]
}
