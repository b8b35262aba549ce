use std::time::Duration;

/// `MM:SS` clock for the elapsed-workout display. Minutes are not wrapped at 60.
pub fn format_clock(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Human duration for history listings.
pub fn format_minutes(minutes: i64) -> String {
    let hours = minutes / 60;
    let minutes = minutes % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Parses a user-typed number, mapping anything unusable (empty, non-numeric,
/// negative, NaN) to 0.
pub fn coerce_f64(raw: &str) -> f64 {
    sanitize_f64(raw.trim().parse::<f64>().unwrap_or(0.0))
}

pub fn sanitize_f64(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

/// Like [`coerce_f64`] but truncates to a whole count (`"8.7"` -> 8).
pub fn coerce_u32(raw: &str) -> u32 {
    let v = coerce_f64(raw).trunc();
    if v >= u32::MAX as f64 { u32::MAX } else { v as u32 }
}

/// Optional field: `None` when absent or unusable.
pub fn coerce_positive(raw: Option<&str>) -> Option<f64> {
    raw.map(coerce_f64).filter(|v| *v > 0.0)
}
