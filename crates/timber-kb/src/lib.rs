//! # timber-kb
//!
//! Hybrid knowledge-query engine for a carpentry back office: answers
//! natural-language questions about building codes and engineered-timber
//! span tables.
//!
//! Each question is deterministically parsed into structured intent, gated
//! by a clarification policy that asks one follow-up at a time, then routed
//! to either a structured span-table lookup or a retrieval-augmented
//! fallback over chunked reference documents. Parsed context is carried by
//! the caller across clarification rounds and folded back in by the context
//! merger; completed turns land in per-user conversation memory.
//!
//! External collaborators (embeddings, vector search, completion, storage)
//! sit behind async traits in [`providers`], [`lookup`] and [`memory`];
//! in-memory implementations are provided for each.

pub mod compose;
pub mod config;
pub mod engine;
pub mod lookup;
pub mod memory;
pub mod providers;
pub mod query;
pub mod retrieval;
pub mod types;

// Re-export primary types for convenience
pub use config::EngineConfig;
pub use engine::{EngineError, KnowledgeEngine};
pub use types::{
    AskResponse, ConversationTurn, LoadType, MemberType, MissingField, ParsedQuery, QueryType,
    SafetyTopic, SourceRef, SpanTableEntry, Specificity, TimberGradeEntry,
};

// Re-export common types
pub use anyhow::{Error, Result};
pub use uuid::Uuid;
