//! Free-slot planning against busy calendar time

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use slotwise_domain::CalendarEvent;

/// Working day and granularity used when deriving slots from a calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub slot_minutes: i64,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_minutes: 30,
        }
    }
}

/// Busy interval `[start, end)`
pub type Busy = (DateTime<Utc>, DateTime<Utc>);

pub fn busy_intervals(events: &[CalendarEvent]) -> Vec<Busy> {
    events
        .iter()
        .filter(|e| e.is_busy())
        .filter_map(|e| Some((e.start.start_instant()?, e.end.end_instant()?)))
        .filter(|(s, e)| s < e)
        .collect()
}

/// Free fixed-length slots on `date` (UTC) that do not overlap `busy`.
pub fn free_slots_for_day(date: NaiveDate, hours: WorkingHours, busy: &[Busy]) -> Vec<Busy> {
    if hours.slot_minutes <= 0 {
        return Vec::new();
    }
    let step = Duration::minutes(hours.slot_minutes);
    let day_end = Utc.from_utc_datetime(&date.and_time(hours.end));
    let mut cursor = Utc.from_utc_datetime(&date.and_time(hours.start));
    let mut slots = Vec::new();

    while cursor + step <= day_end {
        let end = cursor + step;
        if !busy.iter().any(|(b_start, b_end)| *b_start < end && *b_end > cursor) {
            slots.push((cursor, end));
        }
        cursor = end;
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotwise_domain::EventTime;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 4, 2, h, m, 0).unwrap()
    }

    fn event(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        transparency: Option<&str>,
    ) -> CalendarEvent {
        CalendarEvent {
            id: "e".into(),
            start: EventTime::at(start),
            end: EventTime::at(end),
            transparency: transparency.map(str::to_string),
            ..CalendarEvent::default()
        }
    }

    #[test]
    fn empty_day_yields_sixteen_half_hours() {
        let date = NaiveDate::from_ymd_opt(2030, 4, 2).unwrap();
        let slots = free_slots_for_day(date, WorkingHours::default(), &[]);
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0], (at(9, 0), at(9, 30)));
        assert_eq!(slots[15], (at(16, 30), at(17, 0)));
    }

    #[test]
    fn busy_event_removes_overlapping_slots_only() {
        let date = NaiveDate::from_ymd_opt(2030, 4, 2).unwrap();
        let busy = busy_intervals(&[
            event(at(10, 15), at(11, 0), None),
            event(at(13, 0), at(15, 0), Some("transparent")),
        ]);
        let slots = free_slots_for_day(date, WorkingHours::default(), &busy);
        assert_eq!(slots.len(), 14);
        assert!(!slots.contains(&(at(10, 0), at(10, 30))));
        assert!(!slots.contains(&(at(10, 30), at(11, 0))));
        assert!(slots.contains(&(at(11, 0), at(11, 30))));
        assert!(slots.contains(&(at(13, 0), at(13, 30))));
    }
}
