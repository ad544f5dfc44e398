//! Cross-turn context merging.
//!
//! Combines a freshly parsed query with the previous turn's parsed state
//! (supplied by the caller, never fetched here). The current turn always
//! wins on conflict; the missing-field list is recomputed from scratch so a
//! stale list from either turn can never leak through.

use crate::query::parser::recompute_missing;
use crate::types::{ParsedQuery, QueryType};

pub fn merge(current: &ParsedQuery, prior: Option<&ParsedQuery>) -> ParsedQuery {
    let mut merged = current.clone();

    if let Some(prev) = prior {
        merged.member_type = merged.member_type.or(prev.member_type);
        merged.timber_type = merged.timber_type.or_else(|| prev.timber_type.clone());
        merged.species = merged.species.or_else(|| prev.species.clone());
        merged.size = merged.size.or_else(|| prev.size.clone());
        merged.span_mm = merged.span_mm.or(prev.span_mm);
        merged.spacing_mm = merged.spacing_mm.or(prev.spacing_mm);
        merged.load_type = merged.load_type.or(prev.load_type);

        // A follow-up that supplies only the missing field must not lose the
        // original span-lookup intent.
        if merged.member_type.is_some() && prev.query_type == QueryType::SpanLookup {
            merged.query_type = QueryType::SpanLookup;
        }
    }

    recompute_missing(&mut merged);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryParser;
    use crate::types::{LoadType, MemberType, MissingField, Specificity};

    #[test]
    fn test_merge_with_empty_prior_is_identity() {
        let parser = QueryParser::new();
        let q = parser.parse("3.6m span bearer");
        let merged = merge(&q, None);
        assert_eq!(merged, q);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let parser = QueryParser::new();
        let q = parser.parse("140x45 LVL bearer floor");
        let with_self = merge(&q, Some(&q));
        let with_empty = merge(&q, None);
        assert_eq!(with_self.missing, with_empty.missing);
        assert_eq!(with_self, with_empty);
    }

    #[test]
    fn test_follow_up_answer_keeps_span_lookup_intent() {
        let parser = QueryParser::new();
        let turn1 = parser.parse("3.6m span bearer floor");
        assert_eq!(turn1.missing, vec![MissingField::TimberType]);

        // The user answers the timber follow-up with just "LVL"; on its own
        // that parses as general knowledge.
        let turn2 = parser.parse("LVL");
        assert_eq!(turn2.query_type, QueryType::GeneralKnowledge);

        let merged = merge(&turn2, Some(&turn1));
        assert_eq!(merged.query_type, QueryType::SpanLookup);
        assert_eq!(merged.member_type, Some(MemberType::Bearer));
        assert_eq!(merged.span_mm, Some(3600));
        assert_eq!(merged.timber_type.as_deref(), Some("LVL"));
        assert_eq!(merged.load_type, Some(LoadType::Floor));
        assert!(merged.missing.is_empty());
    }

    #[test]
    fn test_current_wins_on_conflict() {
        let parser = QueryParser::new();
        let turn1 = parser.parse("140x45 LVL bearer floor");
        let turn2 = parser.parse("what about 190x45 MGP10");

        let merged = merge(&turn2, Some(&turn1));
        assert_eq!(merged.size.as_deref(), Some("190x45"));
        assert_eq!(merged.timber_type.as_deref(), Some("MGP10"));
        assert_eq!(merged.member_type, Some(MemberType::Bearer));
        assert_eq!(merged.query_type, QueryType::SpanLookup);
    }

    #[test]
    fn test_missing_recomputed_after_merge() {
        let parser = QueryParser::new();
        let turn1 = parser.parse("3.6m span bearer");
        assert!(turn1.missing.contains(&MissingField::TimberType));

        let turn2 = parser.parse("LVL for a floor");
        let merged = merge(&turn2, Some(&turn1));
        assert!(merged.missing.is_empty());
        assert_eq!(merged.query_type, QueryType::SpanLookup);
        // Stale entries from turn 1 must not survive.
        assert!(!merged.missing.contains(&MissingField::TimberType));
    }

    #[test]
    fn test_vague_follow_up_gains_specific_fields() {
        let parser = QueryParser::new();
        let turn1 = parser.parse("140x45 LVL joist floor");
        let turn2 = parser.parse("bearer");
        assert_eq!(turn2.specificity, Specificity::Specific);

        let merged = merge(&turn2, Some(&turn1));
        assert_eq!(merged.member_type, Some(MemberType::Bearer));
        assert_eq!(merged.size.as_deref(), Some("140x45"));
    }
}
