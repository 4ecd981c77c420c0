//! Conversation context: entity carry-over and relative date resolution

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use slotwise_domain::ConversationTurn;

/// Actions that close a task; entities from before them are not carried over
const CLOSING_ACTIONS: &[&str] = &["meeting_scheduled", "meeting_cancelled"];

/// Entities from the open task in `history`, overlaid with `current`.
///
/// Later turns win over earlier ones and the current message wins over all.
pub fn merge_entities(
    history: &[ConversationTurn],
    current: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let open_from = history
        .iter()
        .rposition(|t| t.action_taken.as_deref().is_some_and(|a| CLOSING_ACTIONS.contains(&a)))
        .map_or(0, |i| i + 1);

    let mut merged = BTreeMap::new();
    for turn in &history[open_from..] {
        let filled = turn.entities.iter().filter(|(_, v)| !v.is_empty());
        merged.extend(filled.map(|(k, v)| (k.clone(), v.clone())));
    }
    merged.extend(current.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    name.parse::<Weekday>().ok()
}

/// Next occurrence of `weekday` strictly after `today`
fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let target = i64::from(weekday.num_days_from_monday());
    let ahead = (7 + target - i64::from(today.weekday().num_days_from_monday())) % 7;
    today + Duration::days(if ahead == 0 { 7 } else { ahead })
}

/// Resolve a date phrase against `today`
pub fn resolve_date(value: &str, today: NaiveDate) -> Option<NaiveDate> {
    let value = value.trim().to_lowercase();
    if let Ok(date) = NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&value, "%m/%d/%Y") {
        return Some(date);
    }
    match value.as_str() {
        "today" | "this week" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "next week" => return Some(next_weekday(today, Weekday::Mon)),
        _ => {}
    }
    if let Some((month, day)) = value.split_once('/') {
        let (month, day) = (month.parse::<u32>().ok()?, day.parse::<u32>().ok()?);
        let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
        return if this_year < today {
            NaiveDate::from_ymd_opt(today.year() + 1, month, day)
        } else {
            Some(this_year)
        };
    }
    let name =
        value.strip_prefix("next ").or_else(|| value.strip_prefix("upcoming ")).unwrap_or(&value);
    parse_weekday(name).map(|weekday| next_weekday(today, weekday))
}

/// Replace a relative `date` entity with `YYYY-MM-DD` when it can be resolved
pub fn resolve_relative_dates(entities: &mut BTreeMap<String, String>, today: NaiveDate) {
    if let Some(resolved) = entities.get("date").and_then(|d| resolve_date(d, today)) {
        entities.insert("date".to_string(), resolved.format("%Y-%m-%d").to_string());
    }
}

/// `6pm`, `10:30am`, `14:00` or a part of day
pub fn parse_meeting_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim().to_lowercase().replace(' ', "");
    match value.as_str() {
        "morning" => return NaiveTime::from_hms_opt(9, 0, 0),
        "afternoon" => return NaiveTime::from_hms_opt(14, 0, 0),
        "evening" => return NaiveTime::from_hms_opt(18, 0, 0),
        "night" => return NaiveTime::from_hms_opt(20, 0, 0),
        _ => {}
    }
    let (clock, meridiem) = if let Some(rest) = value.strip_suffix("pm") {
        (rest, Some(true))
    } else if let Some(rest) = value.strip_suffix("am") {
        (rest, Some(false))
    } else {
        (value.as_str(), None)
    };
    let (hour, minute) = match clock.split_once(':') {
        Some((h, m)) => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        None => (clock.parse::<u32>().ok()?, 0),
    };
    let hour = match meridiem {
        Some(_) if hour == 0 || hour > 12 => return None,
        Some(true) if hour != 12 => hour + 12,
        Some(false) if hour == 12 => 0,
        _ => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Longest meeting the agent will book.
pub const MAX_MEETING_MINUTES: i64 = 24 * 60;

/// `"45 minute"` or `"2 hour"` in minutes; `None` when unparsable or overflowing
pub fn duration_minutes(value: &str) -> Option<i64> {
    let mut parts = value.split_whitespace();
    let amount = parts.next()?.parse::<i64>().ok()?;
    match parts.next() {
        Some(unit) if unit.starts_with('h') => amount.checked_mul(60),
        _ => Some(amount),
    }
}
