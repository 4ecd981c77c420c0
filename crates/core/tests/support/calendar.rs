use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotwise_core::{CalendarClient, CalendarGateway};
use slotwise_domain::{
    CalendarEvent, EventPatch, EventTime, NewCalendarEvent, Result as DomainResult, SlotwiseError,
    User,
};

/// In-memory calendar for one account.
///
/// `fail_next_calls` makes every call return a `Calendar` error until reset,
/// so failure paths can be driven deterministically.
#[derive(Default, Clone)]
pub struct MockCalendar {
    events: Arc<Mutex<BTreeMap<String, CalendarEvent>>>,
    created: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl MockCalendar {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn event(&self, id: &str) -> Option<CalendarEvent> {
        self.events.lock().unwrap().get(id).cloned()
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.events.lock().unwrap().values().cloned().collect()
    }

    /// Seed or overwrite an event as if edited on the provider side
    pub fn put(&self, event: CalendarEvent) {
        self.events.lock().unwrap().insert(event.id.clone(), event);
    }

    pub fn remove(&self, id: &str) {
        self.events.lock().unwrap().remove(id);
    }

    fn check(&self) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SlotwiseError::Calendar("calendar unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CalendarClient for MockCalendar {
    async fn list_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<CalendarEvent>> {
        self.check()?;
        Ok(self
            .events()
            .into_iter()
            .filter(|e| match (e.start.start_instant(), e.end.end_instant()) {
                (Some(start), Some(end)) => start < to && end > from,
                _ => false,
            })
            .collect())
    }

    async fn get_event(&self, event_id: &str) -> DomainResult<Option<CalendarEvent>> {
        self.check()?;
        Ok(self.event(event_id))
    }

    async fn create_event(&self, event: &NewCalendarEvent) -> DomainResult<CalendarEvent> {
        self.check()?;
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let created = CalendarEvent {
            id: format!("evt-{n}"),
            summary: Some(event.summary.clone()),
            description: event.description.clone(),
            start: EventTime::at(event.start),
            end: EventTime::at(event.end),
            status: Some("confirmed".to_string()),
            transparency: event.transparency.clone(),
            organizer: None,
        };
        self.put(created.clone());
        Ok(created)
    }

    async fn update_event(
        &self,
        event_id: &str,
        patch: &EventPatch,
    ) -> DomainResult<CalendarEvent> {
        self.check()?;
        let mut events = self.events.lock().unwrap();
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| SlotwiseError::NotFound("event not found".into()))?;
        if let Some(summary) = &patch.summary {
            event.summary = Some(summary.clone());
        }
        if let Some(description) = &patch.description {
            event.description = Some(description.clone());
        }
        if let Some(start) = patch.start {
            event.start = EventTime::at(start);
        }
        if let Some(end) = patch.end {
            event.end = EventTime::at(end);
        }
        Ok(event.clone())
    }

    async fn delete_event(&self, event_id: &str) -> DomainResult<()> {
        self.check()?;
        self.remove(event_id);
        Ok(())
    }
}

/// Hands out the shared mock calendar to connected users
#[derive(Default, Clone)]
pub struct MockGateway {
    pub calendar: MockCalendar,
}

impl CalendarGateway for MockGateway {
    fn client_for(&self, user: &User) -> Option<Arc<dyn CalendarClient>> {
        user.has_calendar().then(|| Arc::new(self.calendar.clone()) as Arc<dyn CalendarClient>)
    }
}
