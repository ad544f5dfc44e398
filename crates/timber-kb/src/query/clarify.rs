//! Clarification policy.
//!
//! Decides, before any lookup runs, whether the engine should come back with
//! a follow-up question instead of an answer. Rules are evaluated in a fixed
//! order and the first match wins; one question at a time so the context
//! merger can fold each answer in incrementally.

use regex::Regex;

use crate::types::{MissingField, ParsedQuery, QueryType, Specificity};

/// A follow-up question returned instead of an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUp {
    pub question: String,
    /// Stable tag for tracing and tests.
    pub reason: &'static str,
}

pub struct ClarificationPolicy {
    what_timber_re: Regex,
    which_best_re: Regex,
    can_i_use_re: Regex,
    how_do_i_re: Regex,
    fixing_verb_re: Regex,
}

impl ClarificationPolicy {
    pub fn new() -> Self {
        Self {
            what_timber_re: Regex::new(r"(?i)\bwhat\s+(timber|wood|material)")
                .expect("what-timber regex is valid"),
            which_best_re: Regex::new(r"(?i)\bwhich\b.*\b(best|better)\b")
                .expect("which-best regex is valid"),
            can_i_use_re: Regex::new(r"(?i)\bcan\s+i\s+use\b").expect("can-i-use regex is valid"),
            how_do_i_re: Regex::new(r"(?i)\bhow\s+do\s+i\b").expect("how-do-i regex is valid"),
            fixing_verb_re: Regex::new(r"(?i)\b(fix|nail|screw|bolt|attach|connect|join)")
                .expect("fixing-verb regex is valid"),
        }
    }

    /// Returns a follow-up when the question can't be answered yet,
    /// or `None` to proceed to routing.
    pub fn decide(&self, query: &ParsedQuery, question: &str) -> Option<FollowUp> {
        if query.specificity == Specificity::Vague
            && query.query_type == QueryType::GeneralKnowledge
        {
            if let Some(follow_up) = self.vague_rule(question) {
                return Some(follow_up);
            }
            // No rule matched: fall through rather than block indefinitely.
        }

        if query.query_type == QueryType::SpanLookup {
            if let Some(field) = query.missing.first() {
                return Some(Self::missing_field_prompt(*field, query));
            }
        }

        None
    }

    /// Topic-specific clarifying questions for vague general questions.
    /// The deck-specific rule sits ahead of the generic one so the more
    /// specific phrasing shadows it.
    fn vague_rule(&self, question: &str) -> Option<FollowUp> {
        let lower = question.to_lowercase();
        let has_digits = question.chars().any(|c| c.is_ascii_digit());

        if self.what_timber_re.is_match(question) && lower.contains("deck") {
            return Some(FollowUp {
                question: "For decking, what matters most to you: (a) durability, \
                           (b) cost, or (c) appearance?"
                    .to_string(),
                reason: "vague_deck_timber",
            });
        }
        if self.what_timber_re.is_match(question) {
            return Some(FollowUp {
                question: "What will the timber be used for? (a) decking, (b) wall or \
                           floor framing, (c) pergola or outdoor structure, (d) something else?"
                    .to_string(),
                reason: "vague_application",
            });
        }
        if self.which_best_re.is_match(question) {
            return Some(FollowUp {
                question: "What matters most for this job: (a) durability, (b) cost, \
                           or (c) appearance?"
                    .to_string(),
                reason: "vague_priority",
            });
        }
        if self.can_i_use_re.is_match(question) && !has_digits {
            return Some(FollowUp {
                question: "What span does it need to cover, and what load will it \
                           carry (floor, deck, or roof)?"
                    .to_string(),
                reason: "vague_span_load",
            });
        }
        if self.how_do_i_re.is_match(question) && self.fixing_verb_re.is_match(question) {
            return Some(FollowUp {
                question: "What are you fixing into: (a) timber, (b) brick or \
                           masonry, or (c) concrete?"
                    .to_string(),
                reason: "vague_substrate",
            });
        }
        None
    }

    /// One follow-up for the first missing field only, never a compound
    /// question.
    fn missing_field_prompt(field: MissingField, query: &ParsedQuery) -> FollowUp {
        let member = query
            .member_type
            .map(|m| m.display())
            .unwrap_or("member");
        match field {
            MissingField::SpanOrSize => FollowUp {
                question: format!(
                    "What span does the {} need to cover (e.g. 3.6m), or what size \
                     are you working with (e.g. 140x45)?",
                    member
                ),
                reason: "missing_span_or_size",
            },
            MissingField::TimberType => FollowUp {
                question: "What timber are you using? (a) LVL, (b) MGP pine \
                           (MGP10/MGP12), or (c) hardwood?"
                    .to_string(),
                reason: "missing_timber_type",
            },
            MissingField::LoadType => FollowUp {
                question: format!(
                    "What will the {} support: a floor, a deck, or a roof?",
                    member
                ),
                reason: "missing_load_type",
            },
            MissingField::Species => FollowUp {
                question: "Which hardwood species? Spotted gum (F27) and blackbutt \
                           (F27) are the common structural choices."
                    .to_string(),
                reason: "missing_species",
            },
        }
    }
}

impl Default for ClarificationPolicy {
    fn default() -> Self {
        Self::new()
    }
}
