//! Duration parsing utilities.
//!
//! Command-line durations use the same humantime grammar as the duration
//! fields of scenario files, so a value written to a plan (e.g. "1m 40s")
//! can be passed back on the command line unchanged.

use humantime_serde::re::humantime;
use std::time::Duration;

/// Parse a humantime duration string (e.g., "500ms", "100s", "1m 30s")
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use wpansim::utils::duration::parse_duration;
///
/// assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
/// assert_eq!(parse_duration("1m 40s"), Ok(Duration::from_secs(100)));
/// assert!(parse_duration("soon").is_err());
/// ```
pub fn parse_duration(duration: &str) -> Result<Duration, String> {
    humantime::parse_duration(duration.trim())
        .map_err(|e| format!("Invalid duration format '{}': {}", duration, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("100s"), Ok(Duration::from_secs(100)));
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("2min"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert_eq!(parse_duration(" 10s "), Ok(Duration::from_secs(10)));

        // Compound values, as written into simulation plans
        assert_eq!(parse_duration("1m 30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1m 40s"), Ok(Duration::from_secs(100)));

        // Invalid formats
        assert!(parse_duration("").is_err());
        assert!(parse_duration("invalid").is_err());
        assert!(parse_duration("5x").is_err());
        assert!(parse_duration("-5s").is_err());
    }

    #[test]
    fn test_plan_durations_read_back() {
        let written = humantime::format_duration(Duration::from_millis(100_250)).to_string();
        assert_eq!(parse_duration(&written), Ok(Duration::from_millis(100_250)));
    }
}
