//! Response composer.
//!
//! Formats concise answers from lookup results, injects at most one safety
//! note (the first detected topic), and offers a refinement nudge when more
//! than one candidate survived ranking. RAG answers pass through unchanged;
//! only their source list is attached by the engine.

use crate::types::{SafetyTopic, SpanTableEntry, TimberGradeEntry};

const COMPARE_NUDGE: &str =
    "Other sizes would also work - ask me to compare alternatives if you'd like options.";

/// Span answer:
/// `<size> <timberType> (<species>) - **<span>m max** at <spacing>mm centres (<source>)`.
pub fn span_answer(ranked: &[SpanTableEntry], topics: &[SafetyTopic]) -> String {
    let best = match ranked.first() {
        Some(entry) => entry,
        None => return no_data_answer(topics),
    };

    let species = best
        .species
        .as_deref()
        .map(|s| format!(" ({})", s.replace('_', " ")))
        .unwrap_or_default();

    let mut answer = format!(
        "{} {}{} - **{:.1}m max** at {}mm centres ({})",
        best.size,
        best.timber_type,
        species,
        best.max_span_mm as f64 / 1000.0,
        best.spacing_mm,
        best.source
    );

    if let Some(topic) = topics.first() {
        answer.push_str("\n\n");
        answer.push_str(topic.advisory_note());
    }
    if ranked.len() > 1 {
        answer.push_str("\n\n");
        answer.push_str(COMPARE_NUDGE);
    }
    answer
}

/// Graceful no-data response. Never fabricates or interpolates a span.
pub fn no_data_answer(topics: &[SafetyTopic]) -> String {
    let mut answer = String::from(
        "I don't have span data for that combination. Check the manufacturer's \
         span guide (e.g. the Wesbeam E14 guide for LVL) or AS 1684.2 directly \
         rather than working from a guess.",
    );
    if let Some(topic) = topics.first() {
        answer.push_str("\n\n");
        answer.push_str(topic.advisory_note());
    }
    answer
}

/// Advisory summary for a known timber grade.
pub fn grade_answer(grade: &TimberGradeEntry, topics: &[SafetyTopic]) -> String {
    let treatment = grade
        .treatment
        .as_deref()
        .unwrap_or("no treatment requirement");
    let in_ground = if grade.in_ground_ok {
        "rated for in-ground use"
    } else {
        "not rated for in-ground use"
    };

    let mut answer = format!(
        "{} is a {} stress grade, durability class {}, typically used for {}. \
         Treatment: {}; {}. ({})",
        grade.grade,
        grade.stress_grade,
        grade.durability_class,
        grade.approved_uses.join(", "),
        treatment,
        in_ground,
        grade.source
    );

    if let Some(topic) = topics.first() {
        answer.push_str("\n\n");
        answer.push_str(topic.advisory_note());
    }
    answer
}
