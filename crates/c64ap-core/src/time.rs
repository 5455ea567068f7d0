//! Time utilities

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get the current Unix timestamp in seconds, with sub-second precision.
///
/// DeathLink payloads carry time in this form.
///
/// # Panics
/// Panics if the system time is before the Unix epoch (1970-01-01),
/// which would indicate a severely misconfigured system.
pub fn unix_time_secs_f64() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX epoch")
        .as_secs_f64()
}

/// Format a play time for the HUD stopwatch.
///
/// `HH:MM:SS:mmm` once at least an hour has passed, `MM:SS:mmm` before.
pub fn format_timer(time: Duration) -> String {
    let total_ms = time.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}:{:03}", hours, minutes, seconds, millis)
    } else {
        format!("{:02}:{:02}:{:03}", minutes, seconds, millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_time_is_positive() {
        assert!(unix_time_secs_f64() > 0.0);
    }

    #[test]
    fn test_format_timer_under_an_hour() {
        assert_eq!(format_timer(Duration::from_millis(65_042)), "01:05:042");
    }

    #[test]
    fn test_format_timer_with_hours() {
        let t = Duration::from_secs(3 * 3600 + 2 * 60 + 1) + Duration::from_millis(7);
        assert_eq!(format_timer(t), "03:02:01:007");
    }
}
