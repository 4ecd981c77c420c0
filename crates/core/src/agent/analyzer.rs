//! Rule-based message analysis: intent scores, entities, tone

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use slotwise_domain::{ExtractedInfo, IntentType, Sentiment, Urgency};

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("agent pattern should compile - this is a bug")
}

static INTENT_PATTERNS: Lazy<Vec<(IntentType, Vec<Regex>)>> = Lazy::new(|| {
    let table: [(IntentType, &[&str]); 4] = [
        (
            IntentType::ScheduleMeeting,
            &[
                concat!(
                    r"(schedule|book|arrange|set up|plan)\s+(a\s+)?",
                    r"(meeting|call|appointment|discussion)"
                ),
                r"(meet|call|discuss)\s+(with|about)",
                r"(have|need)\s+(a\s+)?(meeting|call)",
                r"(let's|we should)\s+(meet|call|discuss)",
            ],
        ),
        (
            IntentType::CheckAvailability,
            &[
                r"(when|what times?)\s+(am\s+i\s+)?(available|free)",
                r"(check|show|see)\s+(my\s+)?(availability|schedule|calendar)",
                r"(free\s+time|open\s+slots)",
                r"(busy|booked)\s+(when|times?)",
            ],
        ),
        (
            IntentType::Reschedule,
            &[
                r"(reschedule|move|change|postpone)\s+(my\s+)?(meeting|call|appointment)",
                r"(different|another)\s+time",
                r"(can't make|conflict|busy)\s+(at|on)",
            ],
        ),
        (
            IntentType::Cancel,
            &[
                r"(cancel|delete|remove)\s+(my\s+)?(meeting|call|appointment)",
                r"(can't attend|won't make|not available)",
                r"(call off|postpone indefinitely)",
            ],
        ),
    ];
    table
        .iter()
        .map(|(intent, patterns)| (*intent, patterns.iter().map(|p| compile(p)).collect()))
        .collect()
});

static NEGATION: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(no|not|never|don't|doesn't|won't|cancel|stop|end|quit)\b"));

const WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        compile(r"\b\d{4}-\d{2}-\d{2}\b"),
        compile(&format!(r"\b(?:next|upcoming)\s+(?:{WEEKDAYS})\b")),
        compile(r"\b\d{1,2}/\d{1,2}/\d{4}\b"),
        compile(r"\b\d{1,2}/\d{1,2}\b"),
        compile(r"\b(?:tomorrow|today|next week|this week)\b"),
        compile(&format!(r"\b(?:{WEEKDAYS})\b")),
    ]
});

static TIME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        compile(r"\b\d{1,2}:\d{2}\s*(?:am|pm)?"),
        compile(r"\b\d{1,2}\s*(?:am|pm)\b"),
        compile(r"\b(?:morning|afternoon|evening|night)\b"),
    ]
});

static PERSON_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        compile(r"\b(?:with|meet|call|discuss)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)"),
        compile(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\s+(?:meeting|call|discussion)\b"),
    ]
});

static TOPIC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        compile(r"\b(?:about|regarding|concerning)\s+([^,.]+)"),
        compile(r"\b(?:discuss|talk\s+about)\s+([^,.]+)"),
        compile(r"\b(?:meeting|call)\s+(?:for|about)\s+([^,.]+)"),
    ]
});

/// Date, time and contact clauses that trail a topic
static TOPIC_TAIL: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"(?:^|\s+)(?:on|at|tomorrow|today|next|this|with|email|by|{WEEKDAYS})\b|\s*\S+@\S+|\s+\d"
    ))
});

static EMAIL: Lazy<Regex> =
    Lazy::new(|| compile(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"));

static DURATION: Lazy<Regex> = Lazy::new(|| compile(r"\b(\d+)\s*(hours?|hrs?|minutes?|mins?)\b"));

/// Capitalised words that are never a person's name
const NOT_NAMES: &[&str] = &[
    "I", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday", "Today",
    "Tomorrow", "Next", "This", "Schedule", "Book", "Please", "Can", "Could", "Let's", "Meeting",
    "Call", "The", "A", "My",
];

const POSITIVE_WORDS: &[&str] = &["great", "good", "perfect", "excellent", "thanks", "thank you"];
const NEGATIVE_WORDS: &[&str] = &["bad", "terrible", "awful", "hate", "dislike", "problem"];
const URGENT_WORDS: &[&str] = &["urgent", "asap", "immediately", "now", "quick", "emergency"];

pub const MIN_CONFIDENCE: f64 = 0.3;

/// Each matching pattern adds `0.3` per hit plus a bonus for message length.
/// Equal scores resolve to the intent declared first.
fn score_intents(message: &str) -> BTreeMap<IntentType, f64> {
    let length_bonus = message.len() as f64 / 100.0;
    INTENT_PATTERNS
        .iter()
        .map(|(intent, patterns)| {
            let score = patterns
                .iter()
                .map(|re| re.find_iter(message).count())
                .filter(|hits| *hits > 0)
                .fold(0.0, |total, hits| total + 0.3 * hits as f64 + length_bonus);
            (*intent, score.min(1.0))
        })
        .collect()
}

fn first_match(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| re.find(text)).map(|m| m.as_str().trim().to_string())
}

fn extract_person(message: &str) -> Option<String> {
    PERSON_PATTERNS.iter().find_map(|re| {
        re.captures_iter(message).find_map(|caps| {
            let name: Vec<&str> = caps[1]
                .split_whitespace()
                .skip_while(|w| NOT_NAMES.contains(w))
                .take_while(|w| !NOT_NAMES.contains(w))
                .collect();
            (!name.is_empty()).then(|| name.join(" "))
        })
    })
}

fn extract_topic(lowered: &str) -> Option<String> {
    TOPIC_PATTERNS.iter().find_map(|re| {
        let caps = re.captures(lowered)?;
        let raw = caps.get(caps.len() - 1)?.as_str();
        let cut = TOPIC_TAIL.find(raw).map_or(raw, |m| &raw[..m.start()]);
        let topic = cut.trim();
        (!topic.is_empty()).then(|| topic.to_string())
    })
}

/// Entity map with keys `date`, `time`, `person`, `topic`, `guest_email`, `duration`
pub fn extract_entities(message: &str) -> BTreeMap<String, String> {
    let lowered = message.to_lowercase();
    let mut entities = BTreeMap::new();
    let mut put = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            entities.insert(key.to_string(), value);
        }
    };

    put("date", first_match(&DATE_PATTERNS, &lowered));
    put("time", first_match(&TIME_PATTERNS, &lowered).map(|t| t.replace(' ', "")));
    put("person", extract_person(message));
    put("topic", extract_topic(&lowered));
    put("guest_email", EMAIL.find(message).map(|m| m.as_str().to_string()));
    put(
        "duration",
        DURATION.captures(&lowered).map(|caps| {
            let unit = if caps[2].starts_with('h') { "hour" } else { "minute" };
            format!("{} {unit}", &caps[1])
        }),
    );
    entities
}

pub fn analyze_sentiment(message: &str) -> Sentiment {
    let lowered = message.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lowered.contains(**w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| lowered.contains(**w)).count();
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

pub fn detect_urgency(message: &str) -> Urgency {
    let lowered = message.to_lowercase();
    if URGENT_WORDS.iter().any(|w| lowered.contains(w)) {
        Urgency::High
    } else if lowered.contains("soon") || lowered.contains("today") {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

/// Analyse one message. `last_agent_message` is the previous agent reply in
/// the same conversation, used to read a bare "no" as an answer.
pub fn analyze(message: &str, last_agent_message: Option<&str>) -> ExtractedInfo {
    let lowered = message.to_lowercase();
    let mut scores = score_intents(&lowered);

    if NEGATION.is_match(&lowered) && last_agent_message.is_some_and(|m| m.contains('?')) {
        scores.insert(IntentType::GeneralQuery, 0.8);
        let cancel = scores.entry(IntentType::Cancel).or_insert(0.0);
        *cancel = cancel.max(0.6);
    }

    let (intent, confidence) = scores
        .iter()
        .filter(|(_, score)| **score > 0.0)
        .fold((IntentType::GeneralQuery, 0.0), |best, (intent, score)| {
            if *score > best.1 { (*intent, *score) } else { best }
        });

    ExtractedInfo {
        intent,
        confidence,
        intent_scores: scores,
        entities: extract_entities(message),
        sentiment: analyze_sentiment(message),
        urgency: detect_urgency(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduling_request_is_recognised() {
        let message = "Schedule a meeting with John Smith about the Q3 roadmap tomorrow at 3pm";
        let info = analyze(message, None);
        assert_eq!(info.intent, IntentType::ScheduleMeeting);
        assert!(info.confidence >= MIN_CONFIDENCE);
        assert_eq!(info.entities["person"], "John Smith");
        assert_eq!(info.entities["topic"], "the q3 roadmap");
        assert_eq!(info.entities["date"], "tomorrow");
        assert_eq!(info.entities["time"], "3pm");
    }

    #[test]
    fn availability_and_cancel_intents() {
        let free = analyze("When am I free this week?", None);
        assert_eq!(free.intent, IntentType::CheckAvailability);
        assert_eq!(analyze("Please cancel my meeting with Sarah", None).intent, IntentType::Cancel);
        assert_eq!(analyze("I need to reschedule my call", None).intent, IntentType::Reschedule);
    }

    #[test]
    fn unmatched_message_is_a_general_query() {
        let info = analyze("hello there", None);
        assert_eq!(info.intent, IntentType::GeneralQuery);
        assert_eq!(info.confidence, 0.0);
    }

    #[test]
    fn length_bonus_counts_the_whole_message() {
        let scores = score_intents("can we find another time to meet with bob");
        let schedule = scores[&IntentType::ScheduleMeeting];
        assert!((schedule - 0.71).abs() < 1e-9, "{schedule}");
        assert!((scores[&IntentType::Reschedule] - schedule).abs() < f64::EPSILON);
        let tied = analyze("can we find another time to meet with Bob", None);
        assert_eq!(tied.intent, IntentType::ScheduleMeeting);
    }

    #[test]
    fn unmatched_intents_score_positive_zero() {
        let scores = score_intents("hello there");
        assert!(scores.values().all(|s| *s == 0.0 && s.is_sign_positive()), "{scores:?}");
    }

    #[test]
    fn negative_answer_to_a_question() {
        let info = analyze("no thanks", Some("Would you like to book?"));
        assert_eq!(info.intent, IntentType::GeneralQuery);
        assert!((info.confidence - 0.8).abs() < f64::EPSILON);
        assert!((info.intent_scores[&IntentType::Cancel] - 0.6).abs() < f64::EPSILON);

        assert_eq!(analyze("no thanks", Some("Done.")).confidence, 0.0);
    }

    #[test]
    fn extracts_email_duration_and_dates() {
        let entities =
            extract_entities("Book 45 minutes with Ana next friday, her email is ana@example.com");
        assert_eq!(entities["guest_email"], "ana@example.com");
        assert_eq!(entities["duration"], "45 minute");
        assert_eq!(entities["date"], "next friday");
        assert_eq!(entities["person"], "Ana");
    }

    #[test]
    fn tone_detection() {
        assert_eq!(analyze_sentiment("Great, thanks!"), Sentiment::Positive);
        assert_eq!(analyze_sentiment("This is a terrible problem"), Sentiment::Negative);
        assert_eq!(detect_urgency("need this asap"), Urgency::High);
        assert_eq!(detect_urgency("sometime today"), Urgency::Medium);
        assert_eq!(detect_urgency("whenever"), Urgency::Low);
    }
}
