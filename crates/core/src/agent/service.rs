//! Conversational scheduling agent

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::{json, Value};
use slotwise_domain::utils::timezone::{convert_to_utc, user_timezone};
use slotwise_domain::{
    AgentResponse, AgentStats, Booking, CalendarEvent, CategorizedQaPair, Conversation,
    ConversationTurn, IntentType, KnowledgeCategories, KnowledgeHit, KnowledgeStats, ParseStats,
    QaPair, Result, ScheduleRequest, SchedulingInsights, SimilarQuestion, SlotView, SlotwiseError,
    User,
};
use tracing::{debug, info, instrument, warn};

use super::analyzer::{self, MIN_CONFIDENCE};
use super::context::{
    duration_minutes, merge_entities, parse_meeting_time, resolve_relative_dates,
    MAX_MEETING_MINUTES,
};
use super::ports::{ConversationRepository, LanguageModel};
use crate::availability::AvailabilityService;
use crate::booking::BookingService;
use crate::calendar::CalendarGateway;
use crate::knowledge::{parser, KnowledgeBase};

/// Turns kept per conversation
pub const MAX_TURNS: usize = 10;
const DEFAULT_MEETING_MINUTES: i64 = 30;
const LISTED_SLOTS: usize = 5;
const LISTED_BOOKINGS: usize = 5;
const INSIGHT_HORIZON: usize = 500;
const CALENDAR_DAYS: i64 = 7;
const LEARNED_CATEGORY: &str = "learned";

const SYSTEM_PROMPT: &str = "You are Slotwise, an assistant for a meeting booking service. \
Answer in at most three sentences and keep to scheduling and calendar topics.";

const FALLBACK_MESSAGE: &str = "I apologize, but I encountered an error processing your request. \
Could you please try rephrasing your message?";

const HELP_MESSAGE: &str = "I can book meetings for you and tell you when you are free. \
Try \"Schedule a meeting with John tomorrow at 2pm about the budget, \
his email is john@example.com\".";

static AFFIRMATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(yes|yeah|yep|confirm|cancel)\b")
        .expect("affirmative pattern should compile - this is a bug")
});

/// Required scheduling details in the order they are asked for
const REQUIRED_DETAILS: [&str; 5] = ["topic", "guest_email", "person", "date", "time"];

/// `user_<id>_<YYYYmmdd_HHMMSS>`, used when the client sends no context id
pub fn default_context_id(user_id: i64, now: DateTime<Utc>) -> String {
    format!("user_{user_id}_{}", now.format("%Y%m%d_%H%M%S"))
}

fn fallback_response() -> AgentResponse {
    AgentResponse::new(FALLBACK_MESSAGE).suggestions([
        "Try asking about your availability",
        "Schedule a meeting",
        "Check your calendar",
    ])
}

fn missing_details(entities: &BTreeMap<String, String>) -> Vec<&'static str> {
    REQUIRED_DETAILS
        .iter()
        .copied()
        .filter(|key| entities.get(*key).map_or(true, |v| v.trim().is_empty()))
        .collect()
}

/// Use a bare reply as the free-text detail that was asked for last
fn fill_answer(entities: &mut BTreeMap<String, String>, message: &str) {
    if let Some(detail @ ("topic" | "person")) = missing_details(entities).first().copied() {
        let answer = message.trim().trim_end_matches(['.', '!', '?']).trim();
        if !answer.is_empty() {
            entities.insert(detail.to_string(), answer.to_string());
        }
    }
}

fn question_for(detail: &str, entities: &BTreeMap<String, String>) -> String {
    let person = entities.get("person").map_or("them", String::as_str);
    match detail {
        "topic" => format!("What would you like to discuss with {person}?"),
        "guest_email" => match entities.get("person") {
            Some(name) => format!("What is {name} email address?"),
            None => "What is their email address?".to_string(),
        },
        "person" => "Who would you like to meet with?".to_string(),
        "date" => format!("What date would you like to schedule the meeting with {person}?"),
        _ => {
            let date = entities.get("date").map_or("that day", String::as_str);
            format!("What time would you like to meet with {person} on {date}?")
        }
    }
}

/// Local wall-clock view of an instant for a user
fn local(user: &User, instant: DateTime<Utc>) -> DateTime<Tz> {
    instant.with_timezone(&user_timezone(Some(&user.timezone)))
}

fn describe_booking(user: &User, booking: &Booking) -> String {
    let start = local(user, booking.start_time);
    format!(
        "{} on {} at {}",
        booking.guest_name,
        start.format("%Y-%m-%d"),
        start.format("%H:%M")
    )
}

/// Chat agent over the booking services
pub struct AgentService {
    bookings: Arc<BookingService>,
    availability: Arc<AvailabilityService>,
    conversations: Arc<dyn ConversationRepository>,
    calendars: Arc<dyn CalendarGateway>,
    knowledge: Arc<RwLock<KnowledgeBase>>,
    llm: Option<Arc<dyn LanguageModel>>,
}

impl AgentService {
    /// Agent with no language model attached.
    pub fn new(
        bookings: Arc<BookingService>,
        availability: Arc<AvailabilityService>,
        conversations: Arc<dyn ConversationRepository>,
        calendars: Arc<dyn CalendarGateway>,
        knowledge: KnowledgeBase,
    ) -> Self {
        Self {
            bookings,
            availability,
            conversations,
            calendars,
            knowledge: Arc::new(RwLock::new(knowledge)),
            llm: None,
        }
    }

    /// Answer unmatched general questions through `llm`.
    #[must_use]
    pub fn with_language_model(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub const fn llm_enabled(&self) -> bool {
        self.llm.is_some()
    }

    // ========================================================================
    // Chat
    // ========================================================================

    /// Answer one chat message; failures become the apology response
    #[instrument(skip(self, user, message), fields(user_id = user.id))]
    pub async fn process_message(
        &self,
        user: &User,
        message: &str,
        context_id: Option<String>,
    ) -> AgentResponse {
        let context_id = context_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| default_context_id(user.id, Utc::now()));
        let mut response = match self.respond(user, message, &context_id).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "agent failed to process message");
                fallback_response()
            }
        };
        response.context_id = Some(context_id);
        response
    }

    async fn respond(&self, user: &User, message: &str, context_id: &str) -> Result<AgentResponse> {
        let now = Utc::now();
        let mut conversation = match self.conversations.get(context_id).await? {
            Some(existing) if existing.user_id != user.id => {
                return Err(SlotwiseError::Security("Conversation belongs to another user".into()));
            }
            Some(existing) => existing,
            None => Conversation {
                context_id: context_id.to_string(),
                user_id: user.id,
                turns: Vec::new(),
                updated_at: now,
            },
        };

        let last = conversation.turns.last();
        let mut info = analyzer::analyze(message, last.map(|t| t.agent_message.as_str()));
        let lowered = message.to_lowercase();
        let mut answering = false;
        match last.and_then(|t| t.action_taken.as_deref()) {
            Some(action @ ("asking_for_info" | "scheduling_failed"))
                if info.intent == IntentType::GeneralQuery =>
            {
                info.intent = IntentType::ScheduleMeeting;
                info.confidence = info.confidence.max(0.7);
                answering = action == "asking_for_info" && info.entities.is_empty();
            }
            Some("cancellation_confirmation") if AFFIRMATIVE.is_match(&lowered) => {
                info.intent = IntentType::Cancel;
                info.confidence = info.confidence.max(0.8);
            }
            _ => {}
        }

        let mut entities = merge_entities(&conversation.turns, &info.entities);
        if answering {
            fill_answer(&mut entities, message);
        }
        resolve_relative_dates(&mut entities, local(user, now).date_naive());
        debug!(intent = %info.intent, confidence = info.confidence, "message analysed");

        let unsure = info.intent != IntentType::GeneralQuery && info.confidence < MIN_CONFIDENCE;
        let response = if unsure {
            AgentResponse::new(
                "🤔 I'm not sure what you'd like me to do. Could you say it another way?",
            )
            .action("asked_for_clarification")
            .confidence(info.confidence)
            .suggestions([
                "Schedule a meeting with John tomorrow at 3pm",
                "When am I free this week?",
            ])
        } else {
            match info.intent {
                IntentType::ScheduleMeeting => self.handle_schedule(user, &entities).await,
                IntentType::CheckAvailability => self.handle_availability(user).await?,
                IntentType::Cancel => self.handle_cancel(user, &entities, &lowered).await?,
                IntentType::Reschedule => self.handle_reschedule(user).await?,
                _ => self.handle_general(message).await,
            }
        };

        conversation.turns.push(ConversationTurn {
            timestamp: now,
            user_message: message.to_string(),
            agent_message: response.message.clone(),
            intent: info.intent,
            entities,
            action_taken: response.action_taken.clone(),
        });
        if conversation.turns.len() > MAX_TURNS {
            let excess = conversation.turns.len() - MAX_TURNS;
            conversation.turns.drain(..excess);
        }
        conversation.updated_at = now;
        self.conversations.save(&conversation).await?;
        Ok(response)
    }

    async fn handle_schedule(
        &self,
        user: &User,
        entities: &BTreeMap<String, String>,
    ) -> AgentResponse {
        let missing = missing_details(entities);
        if let Some(first) = missing.first() {
            return AgentResponse::new(format!("❓ {}", question_for(first, entities)))
                .action("asking_for_info")
                .confidence(0.7)
                .confirm(true)
                .data(json!({ "missing_info": missing, "current_entities": entities }));
        }

        match self.book_from_entities(user, entities).await {
            Ok(booking) => {
                let mut message =
                    format!("✅ Meeting scheduled with {}.", describe_booking(user, &booking));
                if booking.google_event_id.is_some() {
                    message.push_str(&format!(
                        " A calendar invitation was sent to {}.",
                        booking.guest_email
                    ));
                }
                info!(booking_id = booking.id, "agent scheduled meeting");
                AgentResponse::new(message)
                    .action("meeting_scheduled")
                    .confidence(0.9)
                    .suggestions(["Check my availability", "Show my upcoming meetings"])
                    .data(json!({ "booking": booking }))
            }
            Err(err) => {
                AgentResponse::new(format!("❌ I couldn't schedule that meeting: {}", err.message()))
                    .action("scheduling_failed")
                    .confidence(0.5)
                    .suggestions(["Try a different time", "Check my availability"])
                    .data(json!({ "error": err.message() }))
            }
        }
    }

    async fn book_from_entities(
        &self,
        user: &User,
        entities: &BTreeMap<String, String>,
    ) -> Result<Booking> {
        let field = |key: &str| entities.get(key).map(String::as_str).unwrap_or_default();
        let unclear = |what: &str| {
            let raw = field(what);
            SlotwiseError::InvalidInput(format!("I couldn't understand the {what} '{raw}'"))
        };
        let date =
            NaiveDate::parse_from_str(field("date"), "%Y-%m-%d").map_err(|_| unclear("date"))?;
        let time = parse_meeting_time(field("time")).ok_or_else(|| unclear("time"))?;
        let start = convert_to_utc(date.and_time(time), user_timezone(Some(&user.timezone)))?;
        if start <= Utc::now() {
            return Err(SlotwiseError::InvalidInput("That time is in the past".into()));
        }
        let minutes = match entities.get("duration") {
            Some(raw) => duration_minutes(raw)
                .filter(|m| (1..=MAX_MEETING_MINUTES).contains(m))
                .ok_or_else(|| {
                    SlotwiseError::InvalidInput(format!(
                        "A meeting can last at most 24 hours, not '{raw}'"
                    ))
                })?,
            None => DEFAULT_MEETING_MINUTES,
        };
        let end = Duration::try_minutes(minutes)
            .and_then(|length| start.checked_add_signed(length))
            .ok_or_else(|| {
                SlotwiseError::InvalidInput("That meeting would end out of range".into())
            })?;

        self.bookings
            .create_booking_from_calendar(
                user,
                field("person"),
                start,
                end,
                Some(field("guest_email")),
                Some(format!("Meeting about: {}", field("topic"))),
            )
            .await
    }

    async fn handle_availability(&self, user: &User) -> Result<AgentResponse> {
        let slots = self.availability.list_bookable_slots(user.id, None).await?;
        if slots.is_empty() {
            return Ok(AgentResponse::new(
                "📅 You don't have any open slots right now. \
                 Add availability or generate slots from your calendar.",
            )
            .action("no_availability")
            .confidence(0.9)
            .suggestions(["Generate slots from my calendar", "Show my upcoming meetings"]));
        }

        let booked = self.bookings.upcoming(user, Some(INSIGHT_HORIZON)).await?.len();
        let busy_percentage = (booked as f64 * 100.0 / (booked + slots.len()) as f64).round();
        let mut hour_counts: BTreeMap<u32, usize> = BTreeMap::new();
        for slot in &slots {
            *hour_counts.entry(local(user, slot.start_time).hour()).or_default() += 1;
        }
        let best_hour = hour_counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(hour, _)| *hour);

        let next: Vec<SlotView> = slots.iter().take(LISTED_SLOTS).map(SlotView::from).collect();
        let mut message = format!("📅 You have {} available slots.", slots.len());
        if let Some(hour) = best_hour {
            message.push_str(&format!("\nMost open hour: {hour:02}:00"));
        }
        message
            .push_str(&format!("\nSchedule load: {busy_percentage}% booked\n\nNext available:"));
        for slot in &slots[..next.len()] {
            let start = local(user, slot.start_time);
            message.push_str(&format!(
                "\n• {} at {} ({} min)",
                start.format("%a %b %d"),
                start.format("%H:%M"),
                slot.duration_minutes()
            ));
        }

        Ok(AgentResponse::new(message)
            .action("availability_checked")
            .confidence(0.9)
            .suggestions(["Schedule a meeting", "Show my upcoming meetings"])
            .data(json!({
                "available_slots": slots.len(),
                "booked_meetings": booked,
                "best_hour": best_hour,
                "busy_percentage": busy_percentage,
                "next_slots": next,
            })))
    }

    async fn handle_cancel(
        &self,
        user: &User,
        entities: &BTreeMap<String, String>,
        lowered: &str,
    ) -> Result<AgentResponse> {
        let upcoming = self.bookings.upcoming(user, None).await?;
        if upcoming.is_empty() {
            return Ok(AgentResponse::new("You don't have any upcoming meetings to cancel.")
                .action("no_meetings")
                .confidence(0.9));
        }

        let person = entities.get("person").map(|p| p.to_lowercase());
        let date = entities.get("date");
        let matched = upcoming.iter().find(|b| {
            let day = local(user, b.start_time).format("%Y-%m-%d").to_string();
            person.as_deref().is_some_and(|p| b.guest_name.to_lowercase().contains(p))
                || date.is_some_and(|d| day.starts_with(d.as_str()))
        });

        let Some(booking) = matched else {
            let listing: Vec<String> = upcoming
                .iter()
                .take(LISTED_BOOKINGS)
                .map(|b| format!("• {}", describe_booking(user, b)))
                .collect();
            return Ok(AgentResponse::new(format!(
                "I couldn't find a matching meeting. Your upcoming meetings:\n{}",
                listing.join("\n")
            ))
            .action("cancellation_failed")
            .confidence(0.5)
            .data(json!({
                "upcoming": upcoming.iter().take(LISTED_BOOKINGS).collect::<Vec<_>>()
            })));
        };

        if !AFFIRMATIVE.is_match(lowered) {
            return Ok(AgentResponse::new(format!(
                "Do you want me to cancel your meeting with {}? Reply \"yes\" to confirm.",
                describe_booking(user, booking)
            ))
            .action("cancellation_confirmation")
            .confidence(0.8)
            .confirm(true)
            .data(json!({ "booking_id": booking.id })));
        }

        Ok(match self.bookings.cancel_booking(user, booking.id).await {
            Ok(outcome) => AgentResponse::new(format!(
                "✅ Cancelled your meeting with {}.",
                describe_booking(user, booking)
            ))
            .action("meeting_cancelled")
            .confidence(0.9)
            .data(json!({
                "booking_id": booking.id,
                "calendar_updated": outcome.calendar_updated,
            })),
            Err(err) => {
                AgentResponse::new(format!("❌ I couldn't cancel that meeting: {}", err.message()))
                    .action("cancellation_failed")
                    .confidence(0.5)
            }
        })
    }

    async fn handle_reschedule(&self, user: &User) -> Result<AgentResponse> {
        let upcoming = self.bookings.upcoming(user, Some(LISTED_BOOKINGS)).await?;
        if upcoming.is_empty() {
            return Ok(AgentResponse::new("You don't have any upcoming meetings to reschedule.")
                .action("no_meetings")
                .confidence(0.9));
        }
        let listing: Vec<String> =
            upcoming.iter().map(|b| format!("• {}", describe_booking(user, b))).collect();
        Ok(AgentResponse::new(format!(
            "Which meeting would you like to reschedule, and to when?\n{}",
            listing.join("\n")
        ))
        .action("reschedule_requested")
        .confidence(0.7)
        .confirm(true)
        .data(json!({ "upcoming": upcoming })))
    }

    async fn handle_general(&self, message: &str) -> AgentResponse {
        let best = self.knowledge.read().find_similar_questions(message).into_iter().next();
        if let Some(similar) = best {
            return AgentResponse::new(similar.answer)
                .action("knowledge_answer")
                .confidence(0.8)
                .data(json!({ "matched_question": similar.question }));
        }

        if let Some(llm) = &self.llm {
            match llm.complete(SYSTEM_PROMPT, message).await {
                Ok(answer) if !answer.trim().is_empty() => {
                    return AgentResponse::new(answer.trim()).action("ai_response").confidence(0.7);
                }
                Ok(_) => warn!("language model returned an empty answer"),
                Err(err) => warn!(error = %err, "language model request failed"),
            }
        }

        AgentResponse::new(HELP_MESSAGE)
            .action("general_help")
            .confidence(0.8)
            .suggestions(["Schedule a meeting", "Check my availability", "Cancel a meeting"])
    }

    // ========================================================================
    // Conversations
    // ========================================================================

    async fn owned_conversation(&self, user: &User, context_id: &str) -> Result<Conversation> {
        self.conversations
            .get(context_id)
            .await?
            .filter(|c| c.user_id == user.id)
            .ok_or_else(|| SlotwiseError::NotFound("Conversation not found".into()))
    }

    /// Stored turns of one of the user's conversations, oldest first
    pub async fn conversation_history(
        &self,
        user: &User,
        context_id: &str,
    ) -> Result<Vec<ConversationTurn>> {
        Ok(self.owned_conversation(user, context_id).await?.turns)
    }

    /// Forget a conversation. `NotFound` when it is not the user's.
    pub async fn clear_conversation(&self, user: &User, context_id: &str) -> Result<bool> {
        self.owned_conversation(user, context_id).await?;
        self.conversations.delete(context_id).await
    }

    /// Conversation and turn counts with the intent distribution
    pub async fn agent_stats(&self, user: &User) -> Result<AgentStats> {
        let conversations = self.conversations.list_for_user(user.id).await?;
        let mut stats =
            AgentStats { conversations: conversations.len(), ..AgentStats::default() };
        for turn in conversations.iter().flat_map(|c| &c.turns) {
            stats.total_turns += 1;
            *stats.intent_distribution.entry(turn.intent.to_string()).or_default() += 1;
        }
        Ok(stats)
    }

    // ========================================================================
    // Scheduling shortcuts
    // ========================================================================

    /// Book directly from structured input
    #[instrument(skip(self, user, request), fields(user_id = user.id))]
    pub async fn agent_schedule(&self, user: &User, request: ScheduleRequest) -> Result<Booking> {
        if request.title.trim().is_empty() {
            return Err(SlotwiseError::InvalidInput("Title is required".into()));
        }
        if request.end_time <= request.start_time {
            return Err(SlotwiseError::InvalidInput("End time must be after start time".into()));
        }
        self.bookings
            .create_booking_from_calendar(
                user,
                request.title.trim(),
                request.start_time,
                request.end_time,
                request.guest_email.as_deref(),
                None,
            )
            .await
    }

    pub async fn availability(
        &self,
        user: &User,
        date: Option<NaiveDate>,
    ) -> Result<Vec<SlotView>> {
        self.availability.user_availability(user.id, date, DEFAULT_MEETING_MINUTES).await
    }

    /// Provider events for the coming week
    pub async fn calendar_events(&self, user: &User) -> Result<Vec<CalendarEvent>> {
        let calendar = self
            .calendars
            .client_for(user)
            .ok_or_else(|| SlotwiseError::Calendar("Google Calendar is not connected".into()))?;
        let now = Utc::now();
        calendar.list_events(now, now + Duration::days(CALENDAR_DAYS)).await
    }

    /// Load summary over upcoming bookings and open slots
    pub async fn insights(&self, user: &User) -> Result<SchedulingInsights> {
        let upcoming = self.bookings.upcoming(user, Some(INSIGHT_HORIZON)).await?;
        let available = self.availability.list_bookable_slots(user.id, None).await?;

        let mut weekdays: BTreeMap<u32, (String, usize)> = BTreeMap::new();
        for booking in &upcoming {
            let start = local(user, booking.start_time);
            let entry = weekdays
                .entry(start.weekday().num_days_from_monday())
                .or_insert_with(|| (start.format("%A").to_string(), 0));
            entry.1 += 1;
        }
        let busiest_weekday = weekdays
            .into_values()
            .fold(None::<(String, usize)>, |best, day| match best {
                Some(b) if b.1 >= day.1 => Some(b),
                _ => Some(day),
            })
            .map(|(name, _)| name);

        let meetings_per_week = match upcoming.last() {
            Some(last) => {
                let weeks = ((last.start_time - Utc::now()).num_days() as f64 / 7.0).max(1.0);
                (upcoming.len() as f64 / weeks * 10.0).round() / 10.0
            }
            None => 0.0,
        };

        Ok(SchedulingInsights {
            upcoming_meetings: upcoming.len(),
            available_slots: available.len(),
            busiest_weekday,
            meetings_per_week,
        })
    }

    /// Intents, entities and feature switches the agent supports
    pub fn capabilities(&self) -> Value {
        json!({
            "intents": [
                IntentType::ScheduleMeeting.to_string(),
                IntentType::CheckAvailability.to_string(),
                IntentType::Cancel.to_string(),
                IntentType::Reschedule.to_string(),
                IntentType::GeneralQuery.to_string(),
            ],
            "entities": ["date", "time", "person", "topic", "guest_email", "duration"],
            "features": {
                "natural_language_scheduling": true,
                "conversation_memory": true,
                "knowledge_base": true,
                "llm_fallback": self.llm_enabled(),
            },
            "max_turns_per_conversation": MAX_TURNS,
        })
    }

    pub fn status(&self) -> Value {
        json!({
            "status": "active",
            "llm_enabled": self.llm_enabled(),
            "knowledge_pairs": self.knowledge.read().stats().total_qa_pairs,
        })
    }

    // ========================================================================
    // Knowledge base
    // ========================================================================

    /// Remember an answer for a message under the `learned` category
    pub fn learn(&self, message: &str, intent: Option<&str>, response: &str) -> Result<QaPair> {
        if message.trim().is_empty() || response.trim().is_empty() {
            return Err(SlotwiseError::InvalidInput("Message and response are required".into()));
        }
        let pair = QaPair {
            question: message.trim().to_string(),
            answer: response.trim().to_string(),
            keywords: parser::extract_keywords(message, response),
            intent: intent
                .map_or_else(|| parser::determine_intent(message).to_string(), str::to_string),
        };
        self.knowledge.write().add_qa_pair(LEARNED_CATEGORY, pair.clone());
        info!(intent = %pair.intent, "agent learned new answer");
        Ok(pair)
    }

    /// Copy of the live knowledge base, for persisting it
    pub fn knowledge_snapshot(&self) -> KnowledgeBase {
        self.knowledge.read().clone()
    }

    pub fn search_knowledge(&self, query: &str) -> Vec<SimilarQuestion> {
        self.knowledge.read().find_similar_questions(query)
    }

    /// Ranked hits across questions, answers and keywords
    pub fn search_knowledge_advanced(&self, query: &str, limit: usize) -> Vec<KnowledgeHit> {
        self.knowledge.read().search(query, limit)
    }

    pub fn knowledge_stats(&self) -> KnowledgeStats {
        self.knowledge.read().stats()
    }

    pub fn add_knowledge(&self, category: &str, pair: QaPair) -> Result<()> {
        let blank = [category, pair.question.as_str(), pair.answer.as_str()]
            .iter()
            .any(|s| s.trim().is_empty());
        if blank {
            return Err(SlotwiseError::InvalidInput(
                "Category, question and answer are required".into(),
            ));
        }
        self.knowledge.write().add_qa_pair(category.trim(), pair);
        Ok(())
    }

    /// Add every pair or none; returns how many were stored
    pub fn bulk_add_knowledge(&self, pairs: Vec<CategorizedQaPair>) -> Result<usize> {
        let incomplete = pairs
            .iter()
            .any(|p| p.pair.question.trim().is_empty() || p.pair.answer.trim().is_empty());
        if incomplete {
            return Err(SlotwiseError::InvalidInput(
                "Every entry needs a question and an answer".into(),
            ));
        }
        Ok(self.knowledge.write().bulk_add(pairs))
    }

    /// Merge parsed categories into the live knowledge base
    pub fn merge_knowledge(&self, categories: KnowledgeCategories) -> ParseStats {
        let stats = ParseStats::from_categories(&categories);
        let added = self.knowledge.write().merge(categories);
        info!(added, "knowledge base extended");
        stats
    }

    /// Parse `User:`/`Agent:` text and merge what it finds
    pub fn load_custom_qa(&self, content: &str) -> Result<ParseStats> {
        let categories = parser::parse_custom_qa(content);
        if categories.values().all(Vec::is_empty) {
            return Err(SlotwiseError::InvalidInput("No Q&A pairs found in content".into()));
        }
        Ok(self.merge_knowledge(categories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn asks_for_topic_first() {
        let found = entities(&[("person", "John"), ("date", "2030-01-02")]);
        assert_eq!(missing_details(&found), vec!["topic", "guest_email", "time"]);
        assert_eq!(question_for("topic", &found), "What would you like to discuss with John?");
        assert_eq!(
            question_for("time", &found),
            "What time would you like to meet with John on 2030-01-02?"
        );
    }

    #[test]
    fn bare_reply_fills_the_asked_detail() {
        let mut found = entities(&[("person", "Sarah")]);
        fill_answer(&mut found, "the launch plan.");
        assert_eq!(found["topic"], "the launch plan");

        let mut complete = entities(&[("topic", "x"), ("guest_email", "a@b.co")]);
        fill_answer(&mut complete, "Sarah");
        assert_eq!(complete["person"], "Sarah");
    }

    #[test]
    fn email_question_without_a_name() {
        let none = BTreeMap::new();
        assert_eq!(question_for("guest_email", &none), "What is their email address?");
    }

    #[test]
    fn context_ids_carry_user_and_timestamp() {
        let now = DateTime::parse_from_rfc3339("2030-01-02T03:04:05Z")
            .map(|d| d.with_timezone(&Utc))
            .unwrap();
        assert_eq!(default_context_id(7, now), "user_7_20300102_030405");
    }

    #[test]
    fn affirmative_words() {
        assert!(AFFIRMATIVE.is_match("yes please"));
        assert!(AFFIRMATIVE.is_match("ok, cancel it"));
        assert!(!AFFIRMATIVE.is_match("yesterday"));
    }
}
