/// Time utilities for bar timestamps
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{ExportError, Result};

/// Textual format of a bar's opening time in the export
pub const BAR_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an IANA timezone name (e.g. "UTC", "Europe/London")
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| ExportError::ConfigError(format!("Unknown timezone '{}': {}", name, e)))
}

/// Parse a start date given as `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339.
///
/// Dates without an offset are read as wall-clock time in `tz`.
pub fn parse_start_date(value: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(value, BAR_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::default()))
        })
        .map_err(|e| ExportError::ConfigError(format!("Invalid start_date '{}': {}", value, e)))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            ExportError::ConfigError(format!(
                "start_date '{}' does not exist in timezone {}",
                value, tz
            ))
        })
}

/// Render a bar's opening time as `yyyy-MM-dd HH:mm:ss` in `tz`
pub fn format_bar_time(ts: DateTime<Utc>, tz: Tz) -> String {
    ts.with_timezone(&tz).format(BAR_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_only() {
        let ts = parse_start_date("2024-01-01", Tz::UTC).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_date_time_and_rfc3339() {
        let ts = parse_start_date("2024-03-05 13:30:00", Tz::UTC).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 5, 13, 30, 0).unwrap());

        let ts = parse_start_date("2024-03-05T13:30:00+02:00", Tz::UTC).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 5, 11, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_in_timezone() {
        let tz = parse_timezone("Asia/Kolkata").unwrap();
        let ts = parse_start_date("2024-01-01", tz).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 12, 31, 18, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_start_date("01/01/2024", Tz::UTC),
            Err(ExportError::ConfigError(_))
        ));
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn test_format_bar_time() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        assert_eq!(format_bar_time(ts, Tz::UTC), "2024-01-01 01:00:00");

        let tz = parse_timezone("Asia/Kolkata").unwrap();
        assert_eq!(format_bar_time(ts, tz), "2024-01-01 06:30:00");
    }
}
