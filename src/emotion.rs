//! Heuristic emotion classifier for user utterances.
//!
//! Scans the transcript against a keyword table and reports the best-scoring
//! label with a signed score: negative labels (`stressed`, `sad`, `angry`)
//! score below zero, `happy` above. No hit yields `neutral` at 0.0.

use serde::{Deserialize, Serialize};

/// Label reported when no keyword matches.
pub const NEUTRAL: &str = "neutral";

/// Result of emotion classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSignal {
    /// One of `neutral`, `stressed`, `sad`, `angry`, `happy`.
    pub label: String,
    /// Signed intensity in `-0.9..=0.9`.
    pub score: f32,
}

impl EmotionSignal {
    pub fn neutral() -> Self {
        Self {
            label: NEUTRAL.to_owned(),
            score: 0.0,
        }
    }
}

/// Anything that can label the emotional tone of a transcript.
pub trait EmotionClassifier: Send + Sync {
    fn classify(&self, text: &str) -> EmotionSignal;
}

// ── Keyword table ───────────────────────────────────────────────────────

/// (label, keywords, polarity)
const EMOTION_TABLE: &[(&str, &[&str], f32)] = &[
    (
        "stressed",
        &[
            "stress",
            "anxious",
            "anxiety",
            "overwhelmed",
            "panic",
            "nervous",
            "pressure",
            "worried",
            "deadline",
            "too much",
        ],
        -1.0,
    ),
    (
        "sad",
        &[
            "sad",
            "lonely",
            "depressed",
            "unhappy",
            "miss",
            "cry",
            "down",
            "hopeless",
            "tired of",
            "heartbroken",
        ],
        -1.0,
    ),
    (
        "angry",
        &[
            "angry",
            "furious",
            "annoyed",
            "hate",
            "frustrated",
            "mad",
            "irritated",
            "fed up",
        ],
        -1.0,
    ),
    (
        "happy",
        &[
            "happy",
            "great",
            "wonderful",
            "excited",
            "glad",
            "love",
            "awesome",
            "fantastic",
            "good news",
            "thrilled",
        ],
        1.0,
    ),
];

/// Score added per keyword hit.
const SCORE_PER_HIT: f32 = 0.3;
/// Largest magnitude a score can reach.
const MAX_MAGNITUDE: f32 = 0.9;

/// Keyword-table classifier. Earlier table rows win ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordEmotionClassifier;

impl EmotionClassifier for KeywordEmotionClassifier {
    fn classify(&self, text: &str) -> EmotionSignal {
        let lower = text.to_lowercase();

        let mut best: Option<(&str, usize, f32)> = None;
        for &(label, keywords, polarity) in EMOTION_TABLE {
            let hits = keywords.iter().filter(|kw| lower.contains(*kw)).count();
            if hits > best.map_or(0, |(_, h, _)| h) {
                best = Some((label, hits, polarity));
            }
        }

        match best {
            Some((label, hits, polarity)) => EmotionSignal {
                label: label.to_owned(),
                score: polarity * (hits as f32 * SCORE_PER_HIT).min(MAX_MAGNITUDE),
            },
            None => EmotionSignal::neutral(),
        }
    }
}

/// Speaking style for a detected emotion.
///
/// Sad or stressed users get a `soft` voice, happy users an `energetic` one;
/// everything else keeps `default`.
pub fn voice_style_for(label: &str, default: &str) -> String {
    if label.contains("sad") || label.contains("stressed") {
        "soft".to_owned()
    } else if label.contains("happy") {
        "energetic".to_owned()
    } else {
        default.to_owned()
    }
}
