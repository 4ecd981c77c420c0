//! Built-in scheduling knowledge

use std::collections::BTreeMap;

use slotwise_domain::{KnowledgeCategories, QaPair};

pub fn default_categories() -> KnowledgeCategories {
    let mut categories = BTreeMap::new();
    categories.insert(
        "scheduling".to_string(),
        vec![
            QaPair::new(
                "How do I schedule a meeting?",
                "You can schedule a meeting by saying something like 'Schedule a meeting with John \
                tomorrow at 2 PM' or 'Book a call about the project next week'. I'll help you find \
                available times and create the booking.",
                &["schedule", "book", "meeting", "call", "appointment"],
                "schedule_meeting",
            ),
            QaPair::new(
                "How do I check my availability?",
                "Ask me 'When am I free this week?' or 'Show my available times' and I'll display \
                your open slots. You can also check specific dates like 'What's my availability on \
                Friday?'",
                &["availability", "free", "open", "when", "times"],
                "check_availability",
            ),
            QaPair::new(
                "How do I reschedule a meeting?",
                "Say 'Reschedule my meeting with Sarah to Friday' or 'Move my 3 PM call to \
                tomorrow'. I'll help you find new available times and update the booking.",
                &["reschedule", "move", "change", "postpone"],
                "reschedule",
            ),
            QaPair::new(
                "How do I cancel a meeting?",
                "Tell me 'Cancel my meeting with John' or 'Delete my 2 PM appointment' and I'll \
                remove it from your calendar and notify the other person.",
                &["cancel", "delete", "remove"],
                "cancel",
            ),
            QaPair::new(
                "What are my upcoming meetings?",
                "I can show you your upcoming meetings. Just ask 'What meetings do I have this \
                week?' or 'Show my calendar' and I'll display your scheduled appointments.",
                &["upcoming", "meetings", "calendar", "appointments"],
                "meeting_info",
            ),
        ],
    );
    categories.insert(
        "time_management".to_string(),
        vec![
            QaPair::new(
                "What are good meeting times?",
                "Meetings work best during business hours (9 AM - 5 PM) with some space between \
                them. I can suggest times based on your open slots.",
                &["good times", "optimal", "business hours", "recommend"],
                "general_query",
            ),
            QaPair::new(
                "How long should meetings be?",
                "It depends on the purpose. Quick updates: 15-30 minutes. Discussions: 30-60 \
                minutes. Workshops: 1-2 hours.",
                &["duration", "length", "how long"],
                "general_query",
            ),
            QaPair::new(
                "How do I set up recurring meetings?",
                "Say 'Schedule a weekly team meeting every Monday at 10 AM' or 'Create a monthly \
                review on the first Friday' and I'll book the first occurrence for you.",
                &["recurring", "weekly", "monthly", "regular"],
                "schedule_meeting",
            ),
        ],
    );
    categories.insert(
        "calendar_integration".to_string(),
        vec![
            QaPair::new(
                "How do I connect my Google Calendar?",
                "Open Settings and choose 'Connect Google Calendar'. Once connected, Slotwise can \
                read your busy times and create events for new bookings.",
                &["connect", "google calendar", "sync", "integration"],
                "settings",
            ),
            QaPair::new(
                "Why can't I see my calendar?",
                "Check that Google Calendar is connected in Settings. If it is connected but \
                events are missing, refresh the page or reconnect the calendar.",
                &["can't see", "not showing", "calendar", "refresh"],
                "settings",
            ),
        ],
    );
    categories.insert(
        "troubleshooting".to_string(),
        vec![
            QaPair::new(
                "What if I can't make a meeting?",
                "You can reschedule or cancel it. Say 'Reschedule my meeting with John' or 'Cancel \
                my 2 PM call' and I'll take care of it.",
                &["can't make", "conflict", "busy", "unavailable"],
                "reschedule",
            ),
            QaPair::new(
                "How do I invite people to meetings?",
                "Include the person's name and email when scheduling, like 'Schedule a meeting \
                with Sarah about the project'. They receive an invitation with the meeting \
                details.",
                &["invite", "people", "participants", "guests"],
                "schedule_meeting",
            ),
            QaPair::new(
                "What if someone doesn't respond to my meeting invite?",
                "Send them a reminder from the booking page. If there is still no answer, follow \
                up directly or move the meeting to a different time.",
                &["no response", "reminder", "follow up"],
                "general_query",
            ),
        ],
    );
    categories
}

fn lists(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(key, items)| ((*key).to_string(), items.iter().map(|s| (*s).to_string()).collect()))
        .collect()
}

pub fn common_patterns() -> BTreeMap<String, Vec<String>> {
    lists(&[
        (
            "scheduling_requests",
            &[
                "schedule a meeting with {person}",
                "book a call about {topic}",
                "set up an appointment for {date}",
                "arrange a meeting with {person} at {time}",
                "create a meeting about {topic}",
            ],
        ),
        (
            "availability_requests",
            &[
                "when am I free {date}?",
                "show my available times",
                "what's my schedule like {date}?",
                "check my availability",
                "find open slots",
            ],
        ),
        (
            "rescheduling_requests",
            &[
                "reschedule my meeting with {person}",
                "move my {time} call to {new_time}",
                "change my appointment to {date}",
                "postpone my meeting",
            ],
        ),
        (
            "cancellation_requests",
            &[
                "cancel my meeting with {person}",
                "delete my {time} appointment",
                "remove my meeting",
                "call off my appointment",
            ],
        ),
        (
            "information_requests",
            &[
                "what meetings do I have {date}?",
                "show my calendar",
                "what's on my schedule?",
                "tell me about my appointments",
            ],
        ),
    ])
}

pub fn best_practices() -> BTreeMap<String, Vec<String>> {
    lists(&[
        (
            "meeting_duration",
            &[
                "Quick updates: 15-30 minutes",
                "Discussions: 30-60 minutes",
                "Workshops: 1-2 hours",
                "Presentations: 45-90 minutes",
            ],
        ),
        (
            "timing_tips",
            &[
                "Schedule during business hours (9 AM - 5 PM)",
                "Allow buffer time between meetings",
                "Avoid back-to-back meetings when possible",
                "Consider time zones for remote participants",
            ],
        ),
        (
            "preparation_tips",
            &[
                "Send agenda in advance",
                "Include meeting objectives",
                "Set clear expectations",
                "Follow up with action items",
            ],
        ),
        (
            "calendar_management",
            &[
                "Block time for deep work",
                "Schedule breaks between meetings",
                "Use recurring slots for regular meetings",
                "Set up automatic reminders",
            ],
        ),
    ])
}
