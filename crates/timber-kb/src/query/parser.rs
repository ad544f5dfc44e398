//! Deterministic question parser.
//!
//! Extracts structured lookup fields from free text via a fixed pattern
//! table, derives the routing type and missing-field list, and classifies
//! specificity. The pattern tables are read-only configuration compiled once
//! at construction; the parser itself is stateless.

use regex::Regex;

use crate::types::{LoadType, MemberType, MissingField, ParsedQuery, QueryType, Specificity};

// ============================================================================
// Keyword tables
// ============================================================================

// "decking" before "joist" so "decking joists" canonicalizes to decking_joist.
const MEMBER_KEYWORDS: &[(&str, MemberType)] = &[
    ("decking", MemberType::DeckingJoist),
    ("bearer", MemberType::Bearer),
    ("joist", MemberType::Joist),
    ("rafter", MemberType::Rafter),
    ("lintel", MemberType::Lintel),
    ("stud", MemberType::Stud),
    ("beam", MemberType::Beam),
];

const LOAD_KEYWORDS: &[(&str, LoadType)] = &[
    ("floor", LoadType::Floor),
    ("deck", LoadType::Deck),
    ("roof", LoadType::Roof),
    ("balcony", LoadType::Balcony),
    ("ceiling", LoadType::Ceiling),
];

// Specific species before the generic word so "spotted gum" also captures
// the species token, not just the hardwood class.
const HARDWOOD_KEYWORDS: &[(&str, Option<&str>)] = &[
    ("spotted gum", Some("spotted_gum")),
    ("blackbutt", Some("blackbutt")),
    ("ironbark", Some("ironbark")),
    ("jarrah", Some("jarrah")),
    ("merbau", Some("merbau")),
    ("tallowwood", Some("tallowwood")),
    ("hardwood", None),
];

const FASTENER_KEYWORDS: &[&str] = &["nail", "bolt", "fix", "connect"];

const TIMBER_INFO_KEYWORDS: &[&str] = &["treatment", "durability", "species"];

const COMPLIANCE_KEYWORDS: &[&str] = &[
    "compliance",
    "compliant",
    "building code",
    "ncc",
    "bca",
    "as 1684",
    "as1684",
];

// ============================================================================
// Parser
// ============================================================================

pub struct QueryParser {
    size_re: Regex,
    metres_re: Regex,
    millimetres_re: Regex,
    spacing_re: Regex,
    mgp_re: Regex,
    lvl_re: Regex,
    two_digit_re: Regex,
    vague_leading_what_re: Regex,
    vague_which_best_re: Regex,
    vague_should_i_re: Regex,
    vague_can_i_use_re: Regex,
    vague_how_do_i_re: Regex,
}

impl QueryParser {
    pub fn new() -> Self {
        Self {
            size_re: Regex::new(r"(?i)\b(\d{2,3})\s*x\s*(\d{2,3})\b").expect("size regex is valid"),
            metres_re: Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*m\b").expect("metres regex is valid"),
            millimetres_re: Regex::new(r"(?i)\b(\d{3,4})\s*mm\b")
                .expect("millimetres regex is valid"),
            spacing_re: Regex::new(r"(?i)\b(\d{2,4})\s*(?:mm\s*)?(?:centres|centers|c/c|spacings?)")
                .expect("spacing regex is valid"),
            mgp_re: Regex::new(r"(?i)\bmgp\s*(\d{1,2})\b").expect("mgp regex is valid"),
            lvl_re: Regex::new(r"(?i)\blvl\b").expect("lvl regex is valid"),
            two_digit_re: Regex::new(r"\d{2,}").expect("digit regex is valid"),
            vague_leading_what_re: Regex::new(r"(?i)^\s*what\s+(timber|wood|material)")
                .expect("vague-what regex is valid"),
            vague_which_best_re: Regex::new(r"(?i)\bwhich\b.*\b(best|better)\b")
                .expect("vague-which regex is valid"),
            vague_should_i_re: Regex::new(r"(?i)\bshould\s+i\b")
                .expect("vague-should regex is valid"),
            vague_can_i_use_re: Regex::new(r"(?i)\bcan\s+i\s+use\b")
                .expect("vague-can regex is valid"),
            vague_how_do_i_re: Regex::new(r"(?i)\bhow\s+do\s+i\b")
                .expect("vague-how regex is valid"),
        }
    }

    /// Parse one question into structured intent. Safety topics are attached
    /// separately by the caller; parsing and topic detection are independent.
    pub fn parse(&self, question: &str) -> ParsedQuery {
        let lower = question.to_lowercase();
        let mut query = ParsedQuery::empty(QueryType::GeneralKnowledge);

        query.size = self.extract_size(question);
        query.span_mm = self.extract_span(question);
        query.spacing_mm = self.extract_spacing(question);
        self.extract_timber(&lower, &mut query);
        query.member_type = Self::extract_member(&lower);
        query.load_type = Self::extract_load(&lower);

        query.query_type = self.derive_type(&lower, &query);
        recompute_missing(&mut query);
        query.specificity = self.classify_specificity(question, &query);

        tracing::debug!(
            query_type = ?query.query_type,
            specificity = ?query.specificity,
            "parsed question"
        );
        query
    }

    fn extract_size(&self, question: &str) -> Option<String> {
        self.size_re
            .captures(question)
            .map(|caps| format!("{}x{}", &caps[1], &caps[2]))
    }

    /// Prefer an explicit metre figure, converted to mm; fall back to a raw
    /// millimetre figure.
    fn extract_span(&self, question: &str) -> Option<u32> {
        if let Some(caps) = self.metres_re.captures(question) {
            if let Ok(metres) = caps[1].parse::<f64>() {
                return Some((metres * 1000.0).round() as u32);
            }
        }
        self.millimetres_re
            .captures(question)
            .and_then(|caps| caps[1].parse().ok())
    }

    fn extract_spacing(&self, question: &str) -> Option<u32> {
        self.spacing_re
            .captures(question)
            .and_then(|caps| caps[1].parse().ok())
    }

    fn extract_timber(&self, lower: &str, query: &mut ParsedQuery) {
        if self.lvl_re.is_match(lower) {
            query.timber_type = Some("LVL".to_string());
            return;
        }
        if let Some(caps) = self.mgp_re.captures(lower) {
            query.timber_type = Some(format!("MGP{}", &caps[1]));
            return;
        }
        for (keyword, species) in HARDWOOD_KEYWORDS {
            if lower.contains(keyword) {
                query.timber_type = Some("hardwood".to_string());
                query.species = species.map(|s| s.to_string());
                return;
            }
        }
    }

    fn extract_member(lower: &str) -> Option<MemberType> {
        MEMBER_KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, member)| *member)
    }

    fn extract_load(lower: &str) -> Option<LoadType> {
        LOAD_KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, load)| *load)
    }

    fn derive_type(&self, lower: &str, query: &ParsedQuery) -> QueryType {
        if query.member_type.is_some() {
            return QueryType::SpanLookup;
        }
        if FASTENER_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return QueryType::FastenerLookup;
        }
        if TIMBER_INFO_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return QueryType::TimberInfo;
        }
        if COMPLIANCE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return QueryType::ComplianceCheck;
        }
        QueryType::GeneralKnowledge
    }

    /// Concrete numeric/categorical content always overrides vague phrasing:
    /// the score test runs first, the phrasing patterns only when score < 2.
    fn classify_specificity(&self, question: &str, query: &ParsedQuery) -> Specificity {
        let score = [
            query.size.is_some(),
            query.span_mm.is_some(),
            query.timber_type.is_some(),
            query.member_type.is_some(),
            self.two_digit_re.is_match(question),
        ]
        .iter()
        .filter(|present| **present)
        .count();

        if score >= 2 {
            return Specificity::Specific;
        }
        if self.matches_vague_phrasing(question) {
            return Specificity::Vague;
        }
        if score >= 1 {
            Specificity::Specific
        } else {
            Specificity::Vague
        }
    }

    fn matches_vague_phrasing(&self, question: &str) -> bool {
        let has_digits = question.chars().any(|c| c.is_ascii_digit());
        self.vague_leading_what_re.is_match(question)
            || self.vague_which_best_re.is_match(question)
            || self.vague_should_i_re.is_match(question)
            || (self.vague_can_i_use_re.is_match(question) && !has_digits)
            || self.vague_how_do_i_re.is_match(question)
            || question.trim_end().ends_with('?')
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Recompute the missing-field list from the current field set. Shared by the
/// parser and the context merger so stale lists never leak across turns.
pub fn recompute_missing(query: &mut ParsedQuery) {
    query.missing.clear();
    if query.query_type != QueryType::SpanLookup {
        return;
    }
    if query.span_mm.is_none() && query.size.is_none() {
        query.missing.push(MissingField::SpanOrSize);
    }
    if query.timber_type.is_none() {
        query.missing.push(MissingField::TimberType);
    }
    let needs_load = matches!(
        query.member_type,
        Some(MemberType::Bearer) | Some(MemberType::Joist)
    );
    if needs_load && query.load_type.is_none() {
        query.missing.push(MissingField::LoadType);
    }
    if query.timber_type.as_deref() == Some("hardwood") && query.species.is_none() {
        query.missing.push(MissingField::Species);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_span_question() {
        let parser = QueryParser::new();
        let q = parser.parse("140x45 LVL bearer floor");

        assert_eq!(q.query_type, QueryType::SpanLookup);
        assert_eq!(q.member_type, Some(MemberType::Bearer));
        assert_eq!(q.timber_type.as_deref(), Some("LVL"));
        assert_eq!(q.size.as_deref(), Some("140x45"));
        assert_eq!(q.load_type, Some(LoadType::Floor));
        assert!(q.missing.is_empty());
        assert_eq!(q.specificity, Specificity::Specific);
    }

    #[test]
    fn test_metre_span_preferred_over_millimetres() {
        let parser = QueryParser::new();
        let q = parser.parse("can a 140x45 joist span 3.6m at 450mm centres");
        assert_eq!(q.span_mm, Some(3600));
        assert_eq!(q.spacing_mm, Some(450));
    }

    #[test]
    fn test_millimetre_span_fallback() {
        let parser = QueryParser::new();
        let q = parser.parse("bearer spanning 2800mm");
        assert_eq!(q.span_mm, Some(2800));
    }

    #[test]
    fn test_span_bearer_missing_timber_first() {
        let parser = QueryParser::new();
        let q = parser.parse("3.6m span bearer");

        assert_eq!(q.query_type, QueryType::SpanLookup);
        assert_eq!(q.span_mm, Some(3600));
        assert_eq!(q.missing.first(), Some(&MissingField::TimberType));
        assert!(!q.missing.contains(&MissingField::SpanOrSize));
    }

    #[test]
    fn test_missing_never_contains_populated_fields() {
        let parser = QueryParser::new();
        for question in [
            "140x45 LVL bearer floor",
            "3.6m span bearer",
            "MGP10 joist for a deck",
            "hardwood bearer 3m floor",
        ] {
            let q = parser.parse(question);
            assert_eq!(q.query_type, QueryType::SpanLookup, "{}", question);
            if q.span_mm.is_some() || q.size.is_some() {
                assert!(!q.missing.contains(&MissingField::SpanOrSize), "{}", question);
            }
            if q.timber_type.is_some() {
                assert!(!q.missing.contains(&MissingField::TimberType), "{}", question);
            }
            if q.load_type.is_some() {
                assert!(!q.missing.contains(&MissingField::LoadType), "{}", question);
            }
        }
    }

    #[test]
    fn test_hardwood_species_capture() {
        let parser = QueryParser::new();
        let q = parser.parse("spotted gum decking joists at 450 centres");
        assert_eq!(q.timber_type.as_deref(), Some("hardwood"));
        assert_eq!(q.species.as_deref(), Some("spotted_gum"));
        assert_eq!(q.member_type, Some(MemberType::DeckingJoist));
        assert_eq!(q.spacing_mm, Some(450));
    }

    #[test]
    fn test_generic_hardwood_has_no_species() {
        let parser = QueryParser::new();
        let q = parser.parse("hardwood bearer for a 3m floor span");
        assert_eq!(q.timber_type.as_deref(), Some("hardwood"));
        assert_eq!(q.species, None);
        assert!(q.missing.contains(&MissingField::Species));
    }

    #[test]
    fn test_mgp_grade_normalized() {
        let parser = QueryParser::new();
        let q = parser.parse("what can mgp 10 joists span");
        assert_eq!(q.timber_type.as_deref(), Some("MGP10"));
    }

    #[test]
    fn test_vague_what_timber() {
        let parser = QueryParser::new();
        let q = parser.parse("what timber should I use");
        assert_eq!(q.specificity, Specificity::Vague);
        assert_eq!(q.query_type, QueryType::GeneralKnowledge);
    }

    #[test]
    fn test_numbers_override_vague_phrasing() {
        // Size + span present: specific regardless of the "should I" phrasing.
        let parser = QueryParser::new();
        let q = parser.parse("should I use 140x45 for a 3.6m span");
        assert_eq!(q.specificity, Specificity::Specific);
    }

    #[test]
    fn test_fastener_routing() {
        let parser = QueryParser::new();
        let q = parser.parse("what nails for fixing decking boards down");
        // "decking" is a member keyword, so this routes to span lookup;
        // a pure fastener question must not mention a member.
        assert_eq!(q.query_type, QueryType::SpanLookup);

        let q = parser.parse("what bolts to connect a post to concrete");
        assert_eq!(q.query_type, QueryType::FastenerLookup);
    }

    #[test]
    fn test_timber_info_routing() {
        let parser = QueryParser::new();
        let q = parser.parse("what treatment does pine need outside");
        assert_eq!(q.query_type, QueryType::TimberInfo);
    }

    #[test]
    fn test_compliance_routing() {
        let parser = QueryParser::new();
        let q = parser.parse("is 600 spacing compliant with the building code");
        assert_eq!(q.query_type, QueryType::ComplianceCheck);
    }

    #[test]
    fn test_bare_question_mark_is_vague() {
        let parser = QueryParser::new();
        let q = parser.parse("pergola advice?");
        assert_eq!(q.specificity, Specificity::Vague);
    }
}
