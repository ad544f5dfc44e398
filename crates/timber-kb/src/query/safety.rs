//! Safety/topic detection over the raw question text.
//!
//! A fixed table of case-insensitive patterns; absence of a match is never an
//! error. Detection order is declaration order, and the composer only injects
//! a note for the first detected topic, so order matters.

use regex::Regex;

use crate::types::SafetyTopic;

const TOPIC_PATTERNS: &[(SafetyTopic, &str)] = &[
    (
        SafetyTopic::InGround,
        r"(?i)in[\s-]?ground|underground|buried|post\s?hole|embedded",
    ),
    (
        SafetyTopic::WetArea,
        r"(?i)wet\s?area|bathroom|shower|laundry|outdoor|outside|exposed|weather",
    ),
    (
        SafetyTopic::LoadBearing,
        r"(?i)load[\s-]?bearing|structural|support(?:s|ing)?\s+(?:a\s+|the\s+)?(?:wall|roof|floor)",
    ),
    (
        SafetyTopic::Fixing,
        r"(?i)\bnail|\bscrew|\bbolt|\bfix(?:ing|ed)?\b|\bconnect",
    ),
    (
        SafetyTopic::Treatment,
        r"(?i)\btreat(?:ed|ment)?\b|\bh[1-6]\b|durab",
    ),
    (
        SafetyTopic::Height,
        r"(?i)\bfall\b|fall\s?height|balustrade|handrail|storey|two\s?stor",
    ),
    (
        SafetyTopic::Fire,
        r"(?i)\bfire\b|bushfire|\bbal[\s-]?\d+|flame",
    ),
];

pub struct SafetyDetector {
    patterns: Vec<(SafetyTopic, Regex)>,
}

impl SafetyDetector {
    pub fn new() -> Self {
        let patterns = TOPIC_PATTERNS
            .iter()
            .map(|(topic, pattern)| {
                (
                    *topic,
                    Regex::new(pattern).expect("safety topic regex is valid"),
                )
            })
            .collect();
        Self { patterns }
    }

    /// All topics whose pattern matches, in declaration order.
    pub fn detect(&self, question: &str) -> Vec<SafetyTopic> {
        self.patterns
            .iter()
            .filter(|(_, re)| re.is_match(question))
            .map(|(topic, _)| *topic)
            .collect()
    }
}

impl Default for SafetyDetector {
    fn default() -> Self {
        Self::new()
    }
}
