//! Structured lookup against the engineered-timber reference dataset.
//!
//! Absent filter fields are wildcards; member type is always required.
//! Candidates are ranked adequate-span-first, then closest fit by section
//! area, so the composer can answer with the best row and still offer
//! alternatives. No match is an empty list, never an error.

pub mod seed;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::types::{LoadType, MemberType, ParsedQuery, SpanTableEntry, TimberGradeEntry};

// ============================================================================
// Filter
// ============================================================================

/// Equality filter over the span reference dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanFilter {
    pub member_type: MemberType,
    pub timber_type: Option<String>,
    pub species: Option<String>,
    pub size: Option<String>,
    pub load_type: Option<LoadType>,
    pub spacing_mm: u32,
}

impl SpanFilter {
    /// Build a filter from merged parsed state. `None` when there is no
    /// member type; a span lookup cannot run without one.
    pub fn from_query(query: &ParsedQuery, default_spacing_mm: u32) -> Option<Self> {
        Some(Self {
            member_type: query.member_type?,
            timber_type: query.timber_type.clone(),
            species: query.species.clone(),
            size: query.size.clone(),
            load_type: query.load_type,
            spacing_mm: query.spacing_mm.unwrap_or(default_spacing_mm),
        })
    }

    pub fn matches(&self, entry: &SpanTableEntry) -> bool {
        if entry.member_type != self.member_type {
            return false;
        }
        if let Some(ref timber) = self.timber_type {
            if !entry.timber_type.eq_ignore_ascii_case(timber) {
                return false;
            }
        }
        if let Some(ref species) = self.species {
            match entry.species {
                Some(ref entry_species) if entry_species.eq_ignore_ascii_case(species) => {}
                _ => return false,
            }
        }
        if let Some(ref size) = self.size {
            if !entry.size.eq_ignore_ascii_case(size) {
                return false;
            }
        }
        if let Some(load) = self.load_type {
            if entry.load_type != load {
                return false;
            }
        }
        entry.spacing_mm == self.spacing_mm
    }
}

// ============================================================================
// Ranking
// ============================================================================

/// Rank matched rows. With a requested span, rows that satisfy it come first
/// (closest fit by section area within the adequate group); rows that fall
/// short are ordered longest-span-first so the nearest miss leads. With no
/// requested span the cost proxy alone decides.
pub fn rank_candidates(mut rows: Vec<SpanTableEntry>, requested_span_mm: Option<u32>) -> Vec<SpanTableEntry> {
    rows.sort_by(|a, b| match requested_span_mm {
        Some(span) => {
            let a_ok = a.max_span_mm >= span;
            let b_ok = b.max_span_mm >= span;
            b_ok.cmp(&a_ok).then_with(|| {
                if a_ok {
                    a.section_area()
                        .cmp(&b.section_area())
                        .then(a.max_span_mm.cmp(&b.max_span_mm))
                } else {
                    b.max_span_mm.cmp(&a.max_span_mm)
                }
            })
        }
        None => a
            .section_area()
            .cmp(&b.section_area())
            .then(a.max_span_mm.cmp(&b.max_span_mm)),
    });
    rows
}

// ============================================================================
// Reference store
// ============================================================================

/// Storage collaborator holding the reference tables.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// All rows matching the filter, unranked.
    async fn span_entries(&self, filter: &SpanFilter) -> Result<Vec<SpanTableEntry>>;

    /// Advisory data for a grade token (e.g. "MGP10"), if known.
    async fn grade_entry(&self, grade: &str) -> Result<Option<TimberGradeEntry>>;
}

/// In-memory reference store over the seeded dataset.
pub struct InMemoryReference {
    spans: RwLock<Vec<SpanTableEntry>>,
    grades: RwLock<HashMap<String, TimberGradeEntry>>,
}

impl InMemoryReference {
    pub fn new(spans: Vec<SpanTableEntry>, grades: Vec<TimberGradeEntry>) -> Self {
        let grades = grades
            .into_iter()
            .map(|g| (g.grade.to_uppercase(), g))
            .collect();
        Self {
            spans: RwLock::new(spans),
            grades: RwLock::new(grades),
        }
    }

    /// A store pre-loaded with the bundled span and grade rows.
    pub fn seeded() -> Self {
        Self::new(seed::span_rows(), seed::grade_rows())
    }

    /// Reference data is append-only; rows are never rewritten in place.
    pub fn append_span_entry(&self, entry: SpanTableEntry) {
        self.spans.write().push(entry);
    }
}

#[async_trait]
impl ReferenceStore for InMemoryReference {
    async fn span_entries(&self, filter: &SpanFilter) -> Result<Vec<SpanTableEntry>> {
        let rows = self
            .spans
            .read()
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn grade_entry(&self, grade: &str) -> Result<Option<TimberGradeEntry>> {
        Ok(self.grades.read().get(&grade.to_uppercase()).cloned())
    }
}
