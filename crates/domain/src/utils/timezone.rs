//! Timezone helpers built on `chrono-tz`.
//!
//! All instants are persisted in UTC. User input arrives as local wall-clock
//! date and time strings in the host's IANA zone.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{Result, SlotwiseError};

pub const DEFAULT_TIMEZONE: &str = "UTC";

const COMMON_TIMEZONES: [(&str, &str); 10] = [
    ("UTC", "UTC"),
    ("America/New_York", "Eastern Time"),
    ("America/Chicago", "Central Time"),
    ("America/Denver", "Mountain Time"),
    ("America/Los_Angeles", "Pacific Time"),
    ("Europe/London", "London"),
    ("Europe/Paris", "Paris"),
    ("Asia/Tokyo", "Tokyo"),
    ("Asia/Shanghai", "Shanghai"),
    ("Australia/Sydney", "Sydney"),
];

/// Localised rendering of an instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDateTime {
    pub datetime: String,
    pub date: String,
    pub time: String,
    pub timezone: String,
    pub timezone_offset: String,
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|_| SlotwiseError::InvalidInput(format!("Unknown timezone: {name}")))
}

pub fn is_valid_timezone(name: &str) -> bool {
    name.parse::<Tz>().is_ok()
}

/// Falls back to UTC when the stored zone is missing or unknown.
pub fn user_timezone(name: Option<&str>) -> Tz {
    name.and_then(|n| n.parse::<Tz>().ok()).unwrap_or(Tz::UTC)
}

pub fn timezone_display_name(name: &str) -> &str {
    COMMON_TIMEZONES.iter().find(|(id, _)| *id == name).map_or(name, |(_, label)| label)
}

/// Timezones offered for selection as `(id, label)` pairs.
pub fn available_timezones() -> Vec<(&'static str, &'static str)> {
    COMMON_TIMEZONES.to_vec()
}

/// Interprets a naive wall-clock value in `tz`.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant; times
/// skipped by a DST jump are rejected.
pub fn make_timezone_aware(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(SlotwiseError::InvalidInput(format!(
            "{naive} does not exist in timezone {}",
            tz.name()
        ))),
    }
}

pub fn convert_to_utc(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    make_timezone_aware(naive, tz).map(|dt| dt.with_timezone(&Utc))
}

pub fn convert_from_utc(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}

pub fn format_datetime_for_user(instant: DateTime<Utc>, timezone: &str) -> Result<UserDateTime> {
    let tz = parse_timezone(timezone)?;
    let local = convert_from_utc(instant, tz);
    Ok(UserDateTime {
        datetime: local.format("%Y-%m-%d %H:%M").to_string(),
        date: local.format("%Y-%m-%d").to_string(),
        time: local.format("%H:%M").to_string(),
        timezone: timezone_display_name(timezone).to_string(),
        timezone_offset: local.format("%z").to_string(),
    })
}

pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| SlotwiseError::InvalidInput(format!("Invalid date format: {date_str}")))
}

pub fn parse_time(time_str: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(time_str.trim(), "%H:%M")
        .map_err(|_| SlotwiseError::InvalidInput(format!("Invalid time format: {time_str}")))
}

/// Parses `YYYY-MM-DD` and `HH:MM` in the user's zone and returns UTC.
pub fn parse_user_datetime(
    date_str: &str,
    time_str: &str,
    timezone: &str,
) -> Result<DateTime<Utc>> {
    let tz = parse_timezone(timezone)?;
    let naive = parse_date(date_str)?.and_time(parse_time(time_str)?);
    convert_to_utc(naive, tz)
}

/// UTC bounds `[start, end)` of a local calendar day.
pub fn day_bounds_utc(date: NaiveDate, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = convert_to_utc(date.and_time(NaiveTime::MIN), tz)?;
    let next = date
        .succ_opt()
        .ok_or_else(|| SlotwiseError::InvalidInput(format!("Date out of range: {date}")))?;
    let end = convert_to_utc(next.and_time(NaiveTime::MIN), tz)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_input_into_utc() {
        let utc = parse_user_datetime("2030-07-01", "09:30", "America/New_York").unwrap();
        assert_eq!(utc.to_rfc3339(), "2030-07-01T13:30:00+00:00");
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(
            parse_user_datetime("2030/07/01", "09:30", "UTC"),
            Err(SlotwiseError::InvalidInput(_))
        ));
        assert!(parse_user_datetime("2030-07-01", "9.30", "UTC").is_err());
        assert!(parse_user_datetime("2030-07-01", "09:30", "Mars/Olympus").is_err());
    }

    #[test]
    fn skipped_local_time_is_invalid() {
        // 02:30 does not exist on the US spring-forward day.
        let naive = parse_date("2030-03-10").unwrap().and_time(parse_time("02:30").unwrap());
        assert!(make_timezone_aware(naive, chrono_tz::America::New_York).is_err());
    }

    #[test]
    fn formats_for_user_with_label_and_offset() {
        let instant = Utc.with_ymd_and_hms(2030, 1, 15, 17, 0, 0).unwrap();
        let view = format_datetime_for_user(instant, "Europe/Paris").unwrap();
        assert_eq!(view.datetime, "2030-01-15 18:00");
        assert_eq!(view.timezone, "Paris");
        assert_eq!(view.timezone_offset, "+0100");
    }

    #[test]
    fn unknown_stored_zone_falls_back_to_utc() {
        assert_eq!(user_timezone(Some("nowhere")), Tz::UTC);
        assert_eq!(user_timezone(None), Tz::UTC);
        assert_eq!(timezone_display_name("Asia/Tokyo"), "Tokyo");
        assert_eq!(timezone_display_name("Africa/Lagos"), "Africa/Lagos");
    }
}
