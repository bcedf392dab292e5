//! Human-readable labels for durations, sizes and timestamps.

use chrono::{DateTime, Utc};

/// `1h 2m 3s`, `2m 3s` or `3s`.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remaining = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, remaining)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, remaining)
    } else {
        format!("{}s", remaining)
    }
}

/// `1h 2m` or `2m`; seconds are dropped.
pub fn format_duration_short(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Format a size given in megabytes, switching to GB at 1024 MB.
pub fn format_file_size(size_mb: f64) -> String {
    if size_mb >= 1024.0 {
        format!("{:.1} GB", size_mb / 1024.0)
    } else {
        format!("{:.1} MB", size_mb)
    }
}

/// `Jun 11, 2024 12:00`
pub fn format_date_time(at: DateTime<Utc>) -> String {
    at.format("%b %d, %Y %H:%M").to_string()
}

/// `12:00`
pub fn format_time(at: DateTime<Utc>) -> String {
    at.format("%H:%M").to_string()
}

/// `Jun 11, 2024`
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %d, %Y").to_string()
}

/// Relative label such as `5 minutes ago` or `in 2 hours`.
pub fn format_time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(at);
    let future = delta.num_seconds() < 0;
    let secs = delta.num_seconds().unsigned_abs();

    if secs < 45 {
        let label = if future { "in less than a minute" } else { "less than a minute ago" };
        return label.to_string();
    }

    let (value, unit) = if secs < 3600 {
        ((secs / 60).max(1), "minute")
    } else if secs < 86_400 {
        (secs / 3600, "hour")
    } else if secs < 30 * 86_400 {
        (secs / 86_400, "day")
    } else if secs < 365 * 86_400 {
        (secs / (30 * 86_400), "month")
    } else {
        (secs / (365 * 86_400), "year")
    };

    let plural = if value == 1 { "" } else { "s" };
    if future {
        format!("in {} {}{}", value, unit, plural)
    } else {
        format!("{} {}{} ago", value, unit, plural)
    }
}
