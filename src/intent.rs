//! Keyword intent resolution.
//!
//! [`IntentResolver::resolve`] maps an utterance to an [`Intent`] by walking an
//! ordered table of [`IntentRule`]s. The first rule whose predicate matches
//! wins; when none does the utterance becomes [`Intent::SynthesizeText`].
//! Resolution is pure and never fails.
//!
//! Argument extraction is deliberately shallow: phrases are cut out around a
//! few marker words and anything that cannot be found falls back to an
//! illustrative placeholder.

use serde::Serialize;

use crate::tools::{AlarmSetter, MeetingScheduler};

/// Attendees used when the utterance names nobody.
pub const PLACEHOLDER_ATTENDEES: &str = "Alice and Bob";
/// Subject used when the utterance gives none.
pub const PLACEHOLDER_SUBJECT: &str = "Project Alpha Status";
/// Meeting time used when the utterance gives no clock time.
pub const PLACEHOLDER_MEETING_TIME: &str = "Tomorrow at 10:00 AM";
/// Alarm time used when the utterance gives no clock time.
pub const PLACEHOLDER_ALARM_TIME: &str = "7:00 AM";

/// Name of the fallback intent.
pub const SYNTHESIZE_TEXT: &str = "synthesize_text";

/// The resolved meaning of one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    ScheduleMeeting {
        time: String,
        subject: String,
        attendees: String,
    },
    SetAlarm {
        time: String,
        message: Option<String>,
    },
    SynthesizeText {
        text: String,
    },
}

impl Intent {
    /// Stable wire name of the intent.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScheduleMeeting { .. } => MeetingScheduler::NAME,
            Self::SetAlarm { .. } => AlarmSetter::NAME,
            Self::SynthesizeText { .. } => SYNTHESIZE_TEXT,
        }
    }

    /// Tool that handles this intent, if any.
    pub fn tool_name(&self) -> Option<&'static str> {
        match self {
            Self::SynthesizeText { .. } => None,
            other => Some(other.name()),
        }
    }

    /// JSON arguments whose keys match the handling tool's parameter set.
    pub fn arguments(&self) -> serde_json::Value {
        match self {
            Self::ScheduleMeeting {
                time,
                subject,
                attendees,
            } => serde_json::json!({
                "time": time,
                "subject": subject,
                "attendees": attendees,
            }),
            Self::SetAlarm { time, message } => {
                let mut args = serde_json::json!({ "time": time });
                if let Some(message) = message {
                    args["message"] = serde_json::Value::String(message.clone());
                }
                args
            }
            Self::SynthesizeText { text } => serde_json::json!({ "text": text }),
        }
    }
}

/// One entry of the resolution table.
#[derive(Debug, Clone, Copy)]
pub struct IntentRule {
    /// Intent name produced by `build`.
    pub name: &'static str,
    /// Predicate over the ASCII-lowercased utterance.
    pub matches: fn(&str) -> bool,
    /// Constructor over the original utterance.
    pub build: fn(&str) -> Intent,
}

/// Ordered rule table with an unconditional text fallback.
#[derive(Debug, Clone)]
pub struct IntentResolver {
    rules: Vec<IntentRule>,
}

impl Default for IntentResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentResolver {
    /// Resolver with the built-in meeting and alarm rules, in that priority.
    pub fn new() -> Self {
        Self::with_rules(vec![
            IntentRule {
                name: MeetingScheduler::NAME,
                matches: is_meeting_request,
                build: build_meeting,
            },
            IntentRule {
                name: AlarmSetter::NAME,
                matches: is_alarm_request,
                build: build_alarm,
            },
        ])
    }

    /// Resolver with a caller-supplied table.
    pub fn with_rules(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// Append a rule at the lowest priority (still ahead of the fallback).
    pub fn push_rule(&mut self, rule: IntentRule) {
        self.rules.push(rule);
    }

    /// Insert a rule at `index`, clamped to the table length.
    pub fn insert_rule(&mut self, index: usize, rule: IntentRule) {
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule);
    }

    /// Rule names in priority order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Map `text` to an intent. Total: unmatched text becomes
    /// [`Intent::SynthesizeText`] carrying the original text.
    pub fn resolve(&self, text: &str) -> Intent {
        let lower = text.to_ascii_lowercase();
        for rule in &self.rules {
            if (rule.matches)(&lower) {
                tracing::debug!(rule = rule.name, "intent rule matched");
                return (rule.build)(text);
            }
        }
        Intent::SynthesizeText {
            text: text.to_string(),
        }
    }
}

fn is_meeting_request(lower: &str) -> bool {
    lower.contains("schedule") && (lower.contains("meeting") || lower.contains("call"))
}

fn is_alarm_request(lower: &str) -> bool {
    lower.contains("set") && (lower.contains("alarm") || lower.contains("reminder"))
}

const TIME_WORDS: &[&str] = &[
    "tomorrow", "today", "tonight", "at", "on", "next", "this", "about",
];

fn build_meeting(text: &str) -> Intent {
    let lower = text.to_ascii_lowercase();
    let attendees = phrase_after(text, " with ", TIME_WORDS)
        .unwrap_or_else(|| PLACEHOLDER_ATTENDEES.to_string());
    let subject = phrase_after(text, " about ", &[TIME_WORDS, &["with"][..]].concat())
        .unwrap_or_else(|| PLACEHOLDER_SUBJECT.to_string());

    let day = if has_word(&lower, "tomorrow") {
        Some("Tomorrow")
    } else if has_word(&lower, "today") || has_word(&lower, "tonight") {
        Some("Today")
    } else {
        None
    };
    let time = match (clock_time(&lower), day) {
        (Some(clock), Some(day)) => format!("{day} at {clock}"),
        (Some(clock), None) => clock,
        (None, _) => PLACEHOLDER_MEETING_TIME.to_string(),
    };

    Intent::ScheduleMeeting {
        time,
        subject,
        attendees,
    }
}

fn build_alarm(text: &str) -> Intent {
    let lower = text.to_ascii_lowercase();
    let time = clock_time(&lower).unwrap_or_else(|| PLACEHOLDER_ALARM_TIME.to_string());
    let message = phrase_after(text, " to ", TIME_WORDS)
        .filter(|m| clock_time(&m.to_ascii_lowercase()).is_none());
    Intent::SetAlarm { time, message }
}

fn clean_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != ':')
        .to_ascii_lowercase()
}

fn has_word(lower: &str, word: &str) -> bool {
    lower.split_whitespace().any(|w| clean_word(w) == word)
}

/// Words following `marker` up to the first stop word, in original case.
fn phrase_after(text: &str, marker: &str, stops: &[&str]) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find(marker)? + marker.len();
    let words: Vec<&str> = text[start..]
        .split_whitespace()
        .take_while(|w| !stops.contains(&clean_word(w).as_str()))
        .collect();
    let phrase = words
        .join(" ")
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim()
        .to_string();
    (!phrase.is_empty()).then_some(phrase)
}

/// First explicit clock time in `lower`, normalized to `H:MM AM|PM`.
///
/// A bare number only counts when it follows `at` or carries a meridiem, so
/// "with 2 people" is not a time.
fn clock_time(lower: &str) -> Option<String> {
    let words: Vec<String> = lower.split_whitespace().map(clean_word).collect();
    for (i, word) in words.iter().enumerate() {
        let (digits, mut meridiem) = split_meridiem(word);
        if digits.is_empty() {
            continue;
        }
        let Some((hour, minute)) = parse_hour_minute(digits) else {
            continue;
        };
        if meridiem.is_none() {
            meridiem = words.get(i + 1).and_then(|next| meridiem_word(next));
        }
        let after_at = i > 0 && words[i - 1] == "at";
        if meridiem.is_none() && !digits.contains(':') && !after_at {
            continue;
        }
        if let Some(formatted) = format_clock(hour, minute, meridiem) {
            return Some(formatted);
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

fn meridiem_word(word: &str) -> Option<Meridiem> {
    match word.replace('.', "").as_str() {
        "am" => Some(Meridiem::Am),
        "pm" => Some(Meridiem::Pm),
        _ => None,
    }
}

fn split_meridiem(word: &str) -> (&str, Option<Meridiem>) {
    for (suffix, meridiem) in [("am", Meridiem::Am), ("pm", Meridiem::Pm)] {
        if let Some(digits) = word.strip_suffix(suffix) {
            return (digits, Some(meridiem));
        }
    }
    (word, None)
}

fn parse_hour_minute(digits: &str) -> Option<(u32, u32)> {
    let (hour, minute) = match digits.split_once(':') {
        Some((h, m)) if m.len() == 2 => (h.parse().ok()?, m.parse().ok()?),
        Some(_) => return None,
        None => (digits.parse().ok()?, 0),
    };
    (hour <= 23 && minute <= 59).then_some((hour, minute))
}

fn format_clock(hour: u32, minute: u32, meridiem: Option<Meridiem>) -> Option<String> {
    let (hour12, meridiem) = match meridiem {
        Some(m) if (1..=12).contains(&hour) => (hour, m),
        Some(_) => return None,
        None => match hour {
            0 => (12, Meridiem::Am),
            1..=11 => (hour, Meridiem::Am),
            12 => (12, Meridiem::Pm),
            _ => (hour - 12, Meridiem::Pm),
        },
    };
    let suffix = match meridiem {
        Meridiem::Am => "AM",
        Meridiem::Pm => "PM",
    };
    Some(format!("{hour12}:{minute:02} {suffix}"))
}
