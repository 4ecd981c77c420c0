//! Knowledge document formats: JSON, CSV and the `User:` / `Agent:` transcript format

use once_cell::sync::Lazy;
use regex::Regex;
use slotwise_domain::{KnowledgeCategories, QaPair, Result, SlotwiseError};

const DEFAULT_CATEGORY: &str = "general";
const DEFAULT_INTENT: &str = "general_query";

const SCHEDULING_TERMS: &[&str] = &[
    "schedule", "book", "meeting", "call", "appointment", "reserve", "set up", "availability",
    "free", "open", "time", "when", "calendar", "reschedule", "move", "change", "postpone",
    "cancel", "delete", "remove", "invite", "people", "participants", "guests", "team", "group",
    "confirm", "proceed", "block", "slot",
];
const TIME_TERMS: &[&str] = &[
    "tomorrow", "today", "next", "week", "month", "monday", "tuesday", "wednesday", "thursday",
    "friday", "saturday", "sunday", "morning", "afternoon", "evening", "night", "am", "pm", "noon",
    "lunch", "hour", "minute",
];
const QUESTION_TERMS: &[&str] = &[
    "how", "what", "when", "where", "why", "can", "could", "would", "should", "help", "assist",
    "guide", "explain", "tell", "show", "check", "see", "find", "get",
];
const ACTION_TERMS: &[&str] = &[
    "book", "schedule", "cancel", "reschedule", "move", "change", "add", "remove", "invite",
    "connect", "sync", "share", "confirm", "proceed", "update", "notify",
];

/// First matching rule wins
const INTENT_RULES: &[(&[&str], &str)] = &[
    (&["schedule", "book", "create", "set up", "block"], "schedule_meeting"),
    (&["availability", "free", "open", "when", "show", "check"], "check_availability"),
    (&["reschedule", "move", "change", "postpone", "push"], "reschedule"),
    (&["cancel", "delete", "remove"], "cancel"),
    (&["connect", "google calendar", "microsoft", "sync"], "settings"),
    (&["invite", "add", "attendee", "guest"], "attendee_management"),
    (&["remind", "notification", "confirm"], "reminders"),
    (&["link", "share", "public"], "booking_links"),
];

static SAME_LINE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^User:\s*(.+?)\s*Agent:\s*(.+)$")
        .expect("SAME_LINE_PAIR should compile - this is a bug")
});
static USER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^User:\s*(.+)$").expect("USER_LINE should compile - this is a bug")
});
static AGENT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^Agent:\s*(.+)$").expect("AGENT_LINE should compile - this is a bug")
});

/// `"Booking, Scheduling & More."` becomes `"booking_scheduling_and_more"`
pub fn normalize_category(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_").replace('&', "and").replace([',', '.'], "")
}

/// Vocabulary terms found in the question or answer, without duplicates
pub fn extract_keywords(question: &str, answer: &str) -> Vec<String> {
    let text = format!("{question} {answer}").to_lowercase();
    let mut keywords: Vec<String> = Vec::new();
    let vocabulary =
        SCHEDULING_TERMS.iter().chain(TIME_TERMS).chain(QUESTION_TERMS).chain(ACTION_TERMS);
    for term in vocabulary {
        if text.contains(term) && !keywords.iter().any(|k| k == term) {
            keywords.push((*term).to_string());
        }
    }
    keywords
}

pub fn determine_intent(question: &str) -> &'static str {
    let question = question.to_lowercase();
    INTENT_RULES
        .iter()
        .find(|(terms, _)| terms.iter().any(|t| question.contains(t)))
        .map_or(DEFAULT_INTENT, |(_, intent)| intent)
}

fn push_pair(categories: &mut KnowledgeCategories, category: &str, question: &str, answer: &str) {
    let pair = QaPair {
        question: question.to_string(),
        answer: answer.to_string(),
        keywords: extract_keywords(question, answer),
        intent: determine_intent(question).to_string(),
    };
    categories.entry(category.to_string()).or_default().push(pair);
}

/// Parse a transcript made of category headers and `User:` / `Agent:` lines.
///
/// Pairs before the first header land in `general`. An `Agent:` line without a
/// pending question is ignored.
pub fn parse_custom_qa(content: &str) -> KnowledgeCategories {
    let mut categories = KnowledgeCategories::new();
    let mut category = DEFAULT_CATEGORY.to_string();
    let mut pending: Option<String> = None;

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !line.contains(':') {
            if line.chars().count() > 3 && !line.starts_with("User") && !line.starts_with("Agent") {
                category = normalize_category(line);
                categories.entry(category.clone()).or_default();
            }
            continue;
        }
        if let Some(caps) = SAME_LINE_PAIR.captures(line) {
            push_pair(&mut categories, &category, caps[1].trim(), caps[2].trim());
            pending = None;
        } else if let Some(caps) = USER_LINE.captures(line) {
            pending = Some(caps[1].trim().to_string());
        } else if let Some(caps) = AGENT_LINE.captures(line) {
            if let Some(question) = pending.take() {
                push_pair(&mut categories, &category, &question, caps[1].trim());
            }
        }
    }
    categories
}

/// `{ "category": [ { "question", "answer", "keywords", "intent" } ] }`
pub fn parse_json(content: &str) -> Result<KnowledgeCategories> {
    serde_json::from_str(content)
        .map_err(|e| SlotwiseError::InvalidInput(format!("Invalid knowledge JSON: {e}")))
}

/// Split one CSV record, honouring double-quoted fields and `""` escapes
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', _) => quoted = !quoted,
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Logical records; quoted fields may span lines
fn records(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for line in content.lines() {
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
        if current.matches('"').count() % 2 == 0 {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// CSV with a header row naming `category, question, answer, keywords, intent`
pub fn parse_csv(content: &str) -> Result<KnowledgeCategories> {
    let mut rows = records(content).into_iter().filter(|r| !r.trim().is_empty());
    let header =
        rows.next().ok_or_else(|| SlotwiseError::InvalidInput("CSV file is empty".into()))?;
    let columns: Vec<String> =
        split_record(&header).into_iter().map(|c| c.trim().to_lowercase()).collect();
    let index = |name: &str| columns.iter().position(|c| c == name);
    let (Some(question_idx), Some(answer_idx)) = (index("question"), index("answer")) else {
        return Err(SlotwiseError::InvalidInput("CSV must have question and answer columns".into()));
    };
    let category_idx = index("category");
    let keywords_idx = index("keywords");
    let intent_idx = index("intent");

    let mut categories = KnowledgeCategories::new();
    for row in rows {
        let fields = split_record(&row);
        let get = |idx: Option<usize>| {
            idx.and_then(|i| fields.get(i)).map(|f| f.trim()).filter(|f| !f.is_empty())
        };
        let pair = QaPair {
            question: get(Some(question_idx)).unwrap_or_default().to_string(),
            answer: get(Some(answer_idx)).unwrap_or_default().to_string(),
            keywords: get(keywords_idx)
                .map(|k| {
                    k.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
                })
                .unwrap_or_default(),
            intent: get(intent_idx).unwrap_or(DEFAULT_INTENT).to_string(),
        };
        let category = get(category_idx).unwrap_or(DEFAULT_CATEGORY).to_string();
        categories.entry(category).or_default().push(pair);
    }
    Ok(categories)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render categories in the same CSV layout `parse_csv` reads
pub fn to_csv(categories: &KnowledgeCategories) -> String {
    let mut out = String::from("category,question,answer,keywords,intent\n");
    for (category, pairs) in categories {
        for pair in pairs {
            let row = [
                csv_field(category),
                csv_field(&pair.question),
                csv_field(&pair.answer),
                csv_field(&pair.keywords.join(",")),
                csv_field(&pair.intent),
            ];
            out.push_str(&row.join(","));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = "\
Booking, Scheduling, and Rescheduling
User: Book a meeting with John tomorrow at 10 AM. Agent: Sure, booking John for 10 AM. Confirm?

User: Can you move my call to Friday?
Agent: Moving your call to Friday. Should I proceed?

Sharing & Links
User: Where is my public link?
Agent: Your booking link is on the dashboard.
Agent: stray answer without a question
";

    #[test]
    fn parses_headers_and_both_pair_layouts() {
        let parsed = parse_custom_qa(TRANSCRIPT);
        let booking = &parsed["booking_scheduling_and_rescheduling"];
        assert_eq!(booking.len(), 2);
        assert_eq!(booking[0].question, "Book a meeting with John tomorrow at 10 AM.");
        assert_eq!(booking[0].intent, "schedule_meeting");
        assert_eq!(booking[1].intent, "reschedule");

        let links = &parsed["sharing_and_links"];
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].intent, "booking_links");
    }

    #[test]
    fn keywords_are_deduplicated() {
        let keywords = extract_keywords("Book a call", "Booking now");
        assert_eq!(keywords.iter().filter(|k| *k == "book").count(), 1);
        assert!(keywords.contains(&"call".to_string()));
    }

    #[test]
    fn intent_rules_apply_in_order() {
        assert_eq!(determine_intent("Can you schedule and cancel?"), "schedule_meeting");
        assert_eq!(determine_intent("Please remind me"), "reminders");
        assert_eq!(determine_intent("Tell me a joke"), "general_query");
    }

    #[test]
    fn csv_defaults_and_quoting() {
        let csv = concat!(
            "question,answer,keywords,category\n",
            "\"Hi, there?\",\"Say \"\"hello\"\"\",\"greet, hello\",\n",
        );
        let parsed = parse_csv(csv).unwrap();
        let pair = &parsed["general"][0];
        assert_eq!(pair.question, "Hi, there?");
        assert_eq!(pair.answer, "Say \"hello\"");
        assert_eq!(pair.keywords, vec!["greet", "hello"]);
        assert_eq!(pair.intent, "general_query");

        let again = parse_csv(&to_csv(&parsed)).unwrap();
        assert_eq!(again, parsed);
    }

    #[test]
    fn csv_without_required_columns_is_rejected() {
        assert!(parse_csv("category,intent\nx,y\n").is_err());
        assert!(parse_csv("").is_err());
    }
}
