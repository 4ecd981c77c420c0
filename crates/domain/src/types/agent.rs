//! Conversational agent types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// What the user is trying to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    ScheduleMeeting,
    CheckAvailability,
    Reschedule,
    Cancel,
    MeetingInfo,
    GeneralQuery,
    CalendarSync,
    Settings,
    AttendeeManagement,
    Reminders,
    BookingLinks,
}

impl_domain_status_conversions!(IntentType {
    ScheduleMeeting => "schedule_meeting",
    CheckAvailability => "check_availability",
    Reschedule => "reschedule",
    Cancel => "cancel",
    MeetingInfo => "meeting_info",
    GeneralQuery => "general_query",
    CalendarSync => "calendar_sync",
    Settings => "settings",
    AttendeeManagement => "attendee_management",
    Reminders => "reminders",
    BookingLinks => "booking_links",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl_domain_status_conversions!(Sentiment {
    Positive => "positive",
    Neutral => "neutral",
    Negative => "negative",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl_domain_status_conversions!(Urgency {
    Low => "low",
    Medium => "medium",
    High => "high",
});

/// Structured reading of a single user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInfo {
    pub intent: IntentType,
    pub confidence: f64,
    pub intent_scores: BTreeMap<IntentType, f64>,
    pub entities: BTreeMap<String, String>,
    pub sentiment: Sentiment,
    pub urgency: Urgency,
}

/// Reply returned to the chat client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub message: String,
    pub action_taken: Option<String>,
    pub suggestions: Vec<String>,
    pub data: serde_json::Value,
    pub confidence: f64,
    pub requires_confirmation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

impl AgentResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action_taken: None,
            suggestions: Vec::new(),
            data: serde_json::Value::Object(serde_json::Map::new()),
            confidence: 0.0,
            requires_confirmation: false,
            context_id: None,
        }
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action_taken = Some(action.into());
        self
    }

    #[must_use]
    pub fn suggestions<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = items.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub const fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    #[must_use]
    pub const fn confirm(mut self, requires_confirmation: bool) -> Self {
        self.requires_confirmation = requires_confirmation;
        self
    }
}

/// One exchange stored in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub agent_message: String,
    pub intent: IntentType,
    pub entities: BTreeMap<String, String>,
    pub action_taken: Option<String>,
}

/// Stored conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub context_id: String,
    pub user_id: i64,
    pub turns: Vec<ConversationTurn>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    pub conversations: usize,
    pub total_turns: usize,
    pub intent_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingInsights {
    pub upcoming_meetings: usize,
    pub available_slots: usize,
    pub busiest_weekday: Option<String>,
    pub meetings_per_week: f64,
}

/// Structured scheduling request that skips message parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub guest_email: Option<String>,
}
