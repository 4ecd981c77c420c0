//! Column conversions shared by the SQLite repositories.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use slotwise_domain::SlotwiseError;
use tokio::task;

pub(crate) fn ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn opt_ts(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(ts)
}

pub(crate) fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

pub(crate) fn parse_opt_ts(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|value| parse_ts(idx, &value)).transpose()
}

/// Parses a status column through its `FromStr` impl.
pub(crate) fn parse_enum<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    raw.parse::<T>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into()))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64) -> bool {
    value != 0
}

pub(crate) fn usize_to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub(crate) fn map_join_error(err: task::JoinError) -> SlotwiseError {
    if err.is_cancelled() {
        SlotwiseError::Internal("blocking repository task cancelled".into())
    } else {
        SlotwiseError::Internal(format!("blocking repository task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamps_keep_microseconds() {
        let instant =
            Utc.with_ymd_and_hms(2030, 5, 6, 7, 8, 9).unwrap() + chrono::Duration::microseconds(42);
        let stored = ts(instant);
        assert_eq!(stored, "2030-05-06T07:08:09.000042Z");
        assert_eq!(parse_ts(0, &stored).unwrap(), instant);
    }

    #[test]
    fn stored_timestamps_sort_chronologically() {
        let early = ts(Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap());
        let late = ts(Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap());
        assert!(early < late);
    }

    #[test]
    fn garbage_timestamp_is_a_conversion_failure() {
        assert!(matches!(
            parse_ts(3, "yesterday"),
            Err(rusqlite::Error::FromSqlConversionFailure(3, _, _))
        ));
    }
}
