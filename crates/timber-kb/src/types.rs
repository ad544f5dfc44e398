//! Shared types for the knowledge-query engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Parsed query
// ============================================================================

/// Routing class derived from a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    SpanLookup,
    FastenerLookup,
    TimberInfo,
    GeneralKnowledge,
    ComplianceCheck,
}

/// Whether a question carries enough concrete content to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specificity {
    Specific,
    Vague,
}

/// Structural role of a timber member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    Bearer,
    Joist,
    Rafter,
    Lintel,
    Stud,
    Beam,
    DeckingJoist,
}

impl MemberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bearer => "bearer",
            Self::Joist => "joist",
            Self::Rafter => "rafter",
            Self::Lintel => "lintel",
            Self::Stud => "stud",
            Self::Beam => "beam",
            Self::DeckingJoist => "decking_joist",
        }
    }

    /// Human-readable form for follow-up questions and answers.
    pub fn display(&self) -> &'static str {
        match self {
            Self::DeckingJoist => "decking joist",
            other => other.as_str(),
        }
    }
}

/// Load application a member carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadType {
    Floor,
    Deck,
    Roof,
    Balcony,
    Ceiling,
}

impl LoadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Deck => "deck",
            Self::Roof => "roof",
            Self::Balcony => "balcony",
            Self::Ceiling => "ceiling",
        }
    }
}

/// Field still required before a structured span lookup can run.
/// Order in `ParsedQuery::missing` decides which follow-up is asked next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    SpanOrSize,
    TimberType,
    LoadType,
    Species,
}

/// Safety-relevant topic detected in a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyTopic {
    InGround,
    WetArea,
    LoadBearing,
    Fixing,
    Treatment,
    Height,
    Fire,
}

impl SafetyTopic {
    /// Fixed advisory text injected by the response composer.
    pub fn advisory_note(&self) -> &'static str {
        match self {
            Self::InGround => {
                "Note: timber in ground contact needs H4 treatment or better. \
                 Untreated and H3 products are not rated for in-ground use."
            }
            Self::WetArea => {
                "Note: wet areas and weather-exposed work need durability class 1-2 \
                 timber or H3 treatment as a minimum."
            }
            Self::LoadBearing => {
                "Note: load-bearing members must be sized from the AS 1684 span tables \
                 or by an engineer. Don't substitute sizes on site."
            }
            Self::Fixing => {
                "Note: fastener type and spacing come from the AS 1684.2 fixing \
                 schedule. Match the fixing to the member and load."
            }
            Self::Treatment => {
                "Note: check the treatment hazard class (H1-H6) against the exposure \
                 before ordering."
            }
            Self::Height => {
                "Note: work above 2m fall height triggers fall-protection requirements. \
                 Check your state's WHS regulations."
            }
            Self::Fire => {
                "Note: in bushfire-prone areas, check the BAL rating requirements in \
                 AS 3959 before selecting timber."
            }
        }
    }
}

/// Structured intent extracted from one question, optionally merged with the
/// previous turn's state. Every field is explicitly optional so cross-turn
/// merging is total over the record shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub query_type: QueryType,
    pub specificity: Specificity,
    pub member_type: Option<MemberType>,
    /// Normalized timber token, e.g. "LVL", "MGP10", "hardwood".
    pub timber_type: Option<String>,
    /// Underscore-normalized hardwood species, e.g. "spotted_gum".
    pub species: Option<String>,
    /// Formatted "WxD" section size in mm, e.g. "140x45".
    pub size: Option<String>,
    pub span_mm: Option<u32>,
    pub spacing_mm: Option<u32>,
    pub load_type: Option<LoadType>,
    pub missing: Vec<MissingField>,
    pub safety_topics: Vec<SafetyTopic>,
}

impl ParsedQuery {
    /// An empty query of the given type, no fields extracted.
    pub fn empty(query_type: QueryType) -> Self {
        Self {
            query_type,
            specificity: Specificity::Vague,
            member_type: None,
            timber_type: None,
            species: None,
            size: None,
            span_mm: None,
            spacing_mm: None,
            load_type: None,
            missing: Vec::new(),
            safety_topics: Vec::new(),
        }
    }

    /// True when any structured lookup field was populated.
    pub fn has_structured_fields(&self) -> bool {
        self.member_type.is_some()
            || self.timber_type.is_some()
            || self.species.is_some()
            || self.size.is_some()
            || self.span_mm.is_some()
            || self.spacing_mm.is_some()
            || self.load_type.is_some()
    }

    /// The subset of state worth carrying into conversation memory.
    /// Returns `None` when there is nothing structured to carry forward.
    pub fn carry_forward(&self) -> Option<ParsedQuery> {
        if !self.has_structured_fields() {
            return None;
        }
        let mut ctx = self.clone();
        ctx.safety_topics.clear();
        Some(ctx)
    }
}

// ============================================================================
// Reference data
// ============================================================================

/// One row of the engineered-timber span reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanTableEntry {
    pub member_type: MemberType,
    pub timber_type: String,
    pub stress_grade: String,
    pub species: Option<String>,
    /// "WxD" in mm, matching the parser's size format.
    pub size: String,
    pub width_mm: u32,
    pub depth_mm: u32,
    pub load_type: LoadType,
    pub spacing_mm: u32,
    /// Single span (false) vs continuous span (true).
    pub continuous: bool,
    pub max_span_mm: u32,
    /// Human-readable citation, always surfaced to the user.
    pub source: String,
}

impl SpanTableEntry {
    /// Cross-section area, the cost proxy used for closest-fit ranking.
    pub fn section_area(&self) -> u32 {
        self.width_mm * self.depth_mm
    }
}

/// Advisory reference data for a timber grade. Never the primary span answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimberGradeEntry {
    pub grade: String,
    pub stress_grade: String,
    pub durability_class: String,
    pub approved_uses: Vec<String>,
    pub treatment: Option<String>,
    pub in_ground_ok: bool,
    pub density_kg_m3: u32,
    pub source: String,
}

// ============================================================================
// Knowledge documents and chunks
// ============================================================================

/// A titled, optionally organization-scoped text source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: Uuid,
    pub title: String,
    pub organization: Option<String>,
    pub url: Option<String>,
}

/// A bounded slice of a document's cleaned text plus its embedding.
/// Chunk indices are contiguous from 0 within a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: u32,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A chunk returned by similarity search, best-match-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub document_id: Uuid,
    pub source_title: String,
    pub source_url: Option<String>,
    pub score: f32,
}

/// Optional scoping for similarity search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkFilter {
    pub organization: Option<String>,
}

// ============================================================================
// Conversation memory
// ============================================================================

/// One completed question/answer exchange in a user's rolling history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub user_id: String,
    pub question: String,
    pub answer: String,
    /// Structured fields carried forward for cross-turn merging.
    pub parsed_context: Option<ParsedQuery>,
    pub created_at: DateTime<Utc>,
}

/// A prior question/answer pair handed to the completion provider as context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl From<&ConversationTurn> for QaPair {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            question: turn.question.clone(),
            answer: turn.answer.clone(),
        }
    }
}

// ============================================================================
// Engine response
// ============================================================================

/// Cited source attached to an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: Option<String>,
}

/// What `ask` hands back to the caller (e.g. a chat UI).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    /// Populated unless the engine short-circuited with a follow-up.
    pub answer: Option<String>,
    pub needs_follow_up: bool,
    pub follow_up_question: Option<String>,
    /// Merged state for the caller to hand back on the next turn.
    pub parsed_context: ParsedQuery,
    pub sources: Vec<SourceRef>,
}
