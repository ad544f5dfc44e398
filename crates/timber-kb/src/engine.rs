//! The knowledge-query engine.
//!
//! One question in, one response out: parse, detect safety topics, merge
//! with the prior turn's context, ask a clarifying follow-up when the intent
//! is vague or a required field is missing, then route to the span-table
//! lookup or the retrieval fallback and compose the answer. Completed turns
//! are appended to the user's conversation memory; follow-ups and degraded
//! provider answers are not.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::compose;
use crate::config::EngineConfig;
use crate::lookup::{rank_candidates, ReferenceStore, SpanFilter};
use crate::memory::ConversationStore;
use crate::providers::{ChunkIndex, CompletionProvider, EmbeddingProvider};
use crate::query::{merge, ClarificationPolicy, QueryParser, SafetyDetector};
use crate::retrieval::RagFallback;
use crate::types::{
    AskResponse, ConversationTurn, ParsedQuery, QueryType, SourceRef, SpanTableEntry,
};

/// Hard failures allowed to cross the engine boundary. Everything else -
/// parsing ambiguity, empty lookups, provider outages - resolves to a
/// follow-up or a degraded answer instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("user id must not be empty")]
    MissingUser,
    #[error("span lookup reached without a member type")]
    MalformedQuery,
}

pub struct KnowledgeEngine {
    config: EngineConfig,
    parser: QueryParser,
    safety: SafetyDetector,
    clarifier: ClarificationPolicy,
    reference: Arc<dyn ReferenceStore>,
    conversations: Arc<dyn ConversationStore>,
    fallback: RagFallback,
}

impl KnowledgeEngine {
    pub fn new(
        config: EngineConfig,
        reference: Arc<dyn ReferenceStore>,
        conversations: Arc<dyn ConversationStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunks: Arc<dyn ChunkIndex>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid engine config: {}", e))?;

        let fallback = RagFallback::new(embedder, chunks, completion, config.retrieval.clone());
        tracing::info!(
            top_k = config.retrieval.top_k,
            default_spacing = config.lookup.default_spacing_mm,
            "knowledge engine ready"
        );

        Ok(Self {
            config,
            parser: QueryParser::new(),
            safety: SafetyDetector::new(),
            clarifier: ClarificationPolicy::new(),
            reference,
            conversations,
            fallback,
        })
    }

    /// Answer one question, or come back with a clarifying follow-up.
    /// `prior_context` is the previous turn's parsed state, carried by the
    /// caller across clarification rounds.
    pub async fn ask(
        &self,
        user_id: &str,
        question: &str,
        prior_context: Option<&ParsedQuery>,
    ) -> Result<AskResponse> {
        if user_id.trim().is_empty() {
            return Err(EngineError::MissingUser.into());
        }

        let mut parsed = self.parser.parse(question);
        parsed.safety_topics = self.safety.detect(question);
        let merged = merge(&parsed, prior_context);

        if let Some(follow_up) = self.clarifier.decide(&merged, question) {
            tracing::debug!(reason = follow_up.reason, "short-circuiting with follow-up");
            return Ok(AskResponse {
                answer: None,
                needs_follow_up: true,
                follow_up_question: Some(follow_up.question),
                parsed_context: merged,
                sources: Vec::new(),
            });
        }

        let (answer, sources, provider_error) = match merged.query_type {
            QueryType::SpanLookup => self.answer_span_lookup(&merged).await?,
            QueryType::TimberInfo => self.answer_timber_info(user_id, question, &merged).await?,
            _ => self.answer_with_retrieval(user_id, question).await?,
        };

        if provider_error {
            tracing::warn!(user_id, "degraded answer, skipping conversation append");
        } else {
            let turn = ConversationTurn {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                question: question.to_string(),
                answer: answer.clone(),
                parsed_context: merged.carry_forward(),
                created_at: Utc::now(),
            };
            if let Err(e) = self.conversations.append(turn).await {
                tracing::warn!(error = %e, "conversation append failed");
            }
        }

        Ok(AskResponse {
            answer: Some(answer),
            needs_follow_up: false,
            follow_up_question: None,
            parsed_context: merged,
            sources,
        })
    }

    async fn answer_span_lookup(
        &self,
        merged: &ParsedQuery,
    ) -> Result<(String, Vec<SourceRef>, bool)> {
        let filter = SpanFilter::from_query(merged, self.config.lookup.default_spacing_mm)
            .ok_or(EngineError::MalformedQuery)?;

        let rows = self
            .reference
            .span_entries(&filter)
            .await
            .context("span table lookup failed")?;
        let ranked = rank_candidates(rows, merged.span_mm);
        tracing::debug!(candidates = ranked.len(), "span lookup complete");

        let answer = compose::span_answer(&ranked, &merged.safety_topics);
        Ok((answer, span_sources(&ranked), false))
    }

    /// Grade questions answer from the advisory table when the grade is
    /// known; everything else falls through to retrieval.
    async fn answer_timber_info(
        &self,
        user_id: &str,
        question: &str,
        merged: &ParsedQuery,
    ) -> Result<(String, Vec<SourceRef>, bool)> {
        if let Some(ref timber) = merged.timber_type {
            if let Some(grade) = self
                .reference
                .grade_entry(timber)
                .await
                .context("grade lookup failed")?
            {
                let answer = compose::grade_answer(&grade, &merged.safety_topics);
                let sources = vec![SourceRef {
                    title: grade.source.clone(),
                    url: None,
                }];
                return Ok((answer, sources, false));
            }
        }
        self.answer_with_retrieval(user_id, question).await
    }

    async fn answer_with_retrieval(
        &self,
        user_id: &str,
        question: &str,
    ) -> Result<(String, Vec<SourceRef>, bool)> {
        // A failed history read degrades to an uncontextualized answer
        // rather than failing the whole question.
        let history = match self
            .conversations
            .history(user_id, self.config.retrieval.history_turns)
            .await
        {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(error = %e, "history read failed, continuing without context");
                Vec::new()
            }
        };

        let outcome = self.fallback.answer(question, &history, None).await;
        Ok((outcome.answer, outcome.sources, outcome.provider_error))
    }
}

/// Distinct citation strings of the ranked rows, best row first.
fn span_sources(ranked: &[SpanTableEntry]) -> Vec<SourceRef> {
    let mut sources: Vec<SourceRef> = Vec::new();
    for entry in ranked {
        if !sources.iter().any(|s| s.title == entry.source) {
            sources.push(SourceRef {
                title: entry.source.clone(),
                url: None,
            });
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::InMemoryReference;
    use crate::memory::InMemoryConversationStore;
    use crate::retrieval::{InMemoryChunkIndex, PROVIDER_ERROR_ANSWER};
    use crate::types::{KnowledgeDocument, MemberType, QaPair};
    use anyhow::anyhow;
    use async_trait::async_trait;

    struct StaticEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StaticEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(anyhow!("embedding service down"))
        }
    }

    struct StaticCompletion;

    #[async_trait]
    impl CompletionProvider for StaticCompletion {
        async fn complete(&self, _prompt: &str, _history: &[QaPair]) -> Result<String> {
            Ok("Grounded answer.".to_string())
        }
    }

    struct TestHarness {
        engine: KnowledgeEngine,
        conversations: Arc<InMemoryConversationStore>,
    }

    fn harness(embedder: Arc<dyn EmbeddingProvider>) -> TestHarness {
        let config = EngineConfig::default();
        let conversations = Arc::new(InMemoryConversationStore::new(
            config.memory.max_turns_per_user,
        ));
        let chunks = InMemoryChunkIndex::new();
        chunks
            .insert_document(
                KnowledgeDocument {
                    id: Uuid::new_v4(),
                    title: "NCC Deck Guide".to_string(),
                    organization: None,
                    url: None,
                },
                vec![("deck joist spacing rules".to_string(), vec![1.0, 0.0])],
            )
            .unwrap();

        let engine = KnowledgeEngine::new(
            config,
            Arc::new(InMemoryReference::seeded()),
            conversations.clone(),
            embedder,
            Arc::new(chunks),
            Arc::new(StaticCompletion),
        )
        .unwrap();

        TestHarness {
            engine,
            conversations,
        }
    }

    #[tokio::test]
    async fn test_full_span_question_answers_from_table() {
        let h = harness(Arc::new(StaticEmbedder));
        let response = h
            .engine
            .ask("user-1", "140x45 LVL bearer floor", None)
            .await
            .unwrap();

        assert!(!response.needs_follow_up);
        let answer = response.answer.unwrap();
        assert!(answer.contains("2.8m max"), "answer: {}", answer);
        assert!(answer.contains("Wesbeam E14 Guide"));
        assert!(response
            .sources
            .iter()
            .any(|s| s.title == "Wesbeam E14 Guide"));
        assert_eq!(h.conversations.turn_count("user-1"), 1);
    }

    #[tokio::test]
    async fn test_vague_question_short_circuits_without_memory_write() {
        let h = harness(Arc::new(StaticEmbedder));
        let response = h
            .engine
            .ask("user-1", "what timber should I use", None)
            .await
            .unwrap();

        assert!(response.needs_follow_up);
        assert!(response.answer.is_none());
        assert!(response.follow_up_question.is_some());
        assert_eq!(h.conversations.turn_count("user-1"), 0);
    }

    #[tokio::test]
    async fn test_follow_up_round_trip_completes_lookup() {
        let h = harness(Arc::new(StaticEmbedder));
        let first = h
            .engine
            .ask("user-1", "3.6m span bearer floor", None)
            .await
            .unwrap();
        assert!(first.needs_follow_up);
        let follow_up = first.follow_up_question.unwrap().to_lowercase();
        assert!(follow_up.contains("timber"), "asked: {}", follow_up);

        // The caller hands the prior context back with the answer.
        let second = h
            .engine
            .ask("user-1", "LVL", Some(&first.parsed_context))
            .await
            .unwrap();
        assert!(!second.needs_follow_up);
        assert_eq!(second.parsed_context.query_type, QueryType::SpanLookup);
        assert_eq!(second.parsed_context.member_type, Some(MemberType::Bearer));
        let answer = second.answer.unwrap();
        assert!(answer.contains("m max"), "answer: {}", answer);
    }

    #[tokio::test]
    async fn test_no_data_answer_names_where_to_look() {
        let h = harness(Arc::new(StaticEmbedder));
        let response = h
            .engine
            .ask("user-1", "90x35 LVL stud 2.4m", None)
            .await
            .unwrap();

        let answer = response.answer.unwrap();
        assert!(answer.contains("manufacturer"), "answer: {}", answer);
        assert!(!answer.contains("m max**"));
    }

    #[tokio::test]
    async fn test_general_question_routes_to_retrieval() {
        let h = harness(Arc::new(StaticEmbedder));
        let response = h
            .engine
            .ask("user-1", "pergola advice?", None)
            .await
            .unwrap();

        assert!(!response.needs_follow_up);
        assert_eq!(response.answer.as_deref(), Some("Grounded answer."));
        assert!(response
            .sources
            .iter()
            .any(|s| s.title == "NCC Deck Guide"));
        assert_eq!(h.conversations.turn_count("user-1"), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_and_skips_memory() {
        let h = harness(Arc::new(FailingEmbedder));
        let response = h
            .engine
            .ask("user-1", "pergola advice?", None)
            .await
            .unwrap();

        assert_eq!(response.answer.as_deref(), Some(PROVIDER_ERROR_ANSWER));
        assert!(response.sources.is_empty());
        assert_eq!(h.conversations.turn_count("user-1"), 0);
    }

    #[tokio::test]
    async fn test_grade_question_answers_from_advisory_table() {
        let h = harness(Arc::new(StaticEmbedder));
        let response = h
            .engine
            .ask("user-1", "what treatment does MGP10 need", None)
            .await
            .unwrap();

        let answer = response.answer.unwrap();
        assert!(answer.contains("MGP10"), "answer: {}", answer);
        assert!(answer.contains("H3"), "answer: {}", answer);
        assert!(response.sources.iter().any(|s| s.title == "AS 1720.1"));
    }

    #[tokio::test]
    async fn test_empty_user_is_a_hard_failure() {
        let h = harness(Arc::new(StaticEmbedder));
        let err = h.engine.ask("  ", "140x45 LVL bearer floor", None).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_safety_note_attached_to_span_answer() {
        let h = harness(Arc::new(StaticEmbedder));
        let response = h
            .engine
            .ask("user-1", "140x45 LVL bearer floor near a wet area", None)
            .await
            .unwrap();

        let answer = response.answer.unwrap();
        assert!(answer.contains("durability class 1-2"), "answer: {}", answer);
    }
}
