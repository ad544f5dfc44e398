//! Retrieval-augmented fallback for questions the span tables can't answer.
//!
//! Embed the question, pull the top-K similar chunks, fold in recent
//! conversation turns, and hand a grounded prompt to the completion
//! provider. Provider failures and timeouts degrade to a labeled error
//! answer; they never raise past this module, and the engine skips the
//! conversation-memory append for degraded answers.

pub mod index;

use std::sync::Arc;
use std::time::Duration;

use crate::config::RetrievalConfig;
use crate::providers::{ChunkIndex, CompletionProvider, EmbeddingProvider};
use crate::types::{ChunkFilter, ConversationTurn, QaPair, RetrievedChunk, SourceRef};

pub use index::InMemoryChunkIndex;

/// Answer text shown when an external provider failed or timed out.
pub const PROVIDER_ERROR_ANSWER: &str =
    "Sorry - the knowledge service could not be reached, so I can't answer that \
     right now. Please try again in a moment.";

/// Outcome of the fallback. `provider_error` marks degraded answers so the
/// caller can keep them out of conversation memory.
#[derive(Debug, Clone)]
pub struct RagOutcome {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub provider_error: bool,
}

impl RagOutcome {
    fn degraded() -> Self {
        Self {
            answer: PROVIDER_ERROR_ANSWER.to_string(),
            sources: Vec::new(),
            provider_error: true,
        }
    }
}

pub struct RagFallback {
    embedder: Arc<dyn EmbeddingProvider>,
    chunks: Arc<dyn ChunkIndex>,
    completion: Arc<dyn CompletionProvider>,
    config: RetrievalConfig,
}

impl RagFallback {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        chunks: Arc<dyn ChunkIndex>,
        completion: Arc<dyn CompletionProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            chunks,
            completion,
            config,
        }
    }

    /// Answer a question from retrieved context plus recent history.
    pub async fn answer(
        &self,
        question: &str,
        history: &[ConversationTurn],
        filter: Option<&ChunkFilter>,
    ) -> RagOutcome {
        let timeout = Duration::from_secs(self.config.provider_timeout_secs);

        let vector = match tokio::time::timeout(timeout, self.embedder.embed(question)).await {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "embedding provider failed");
                return RagOutcome::degraded();
            }
            Err(_) => {
                tracing::warn!("embedding provider timed out");
                return RagOutcome::degraded();
            }
        };

        let retrieved = match tokio::time::timeout(
            timeout,
            self.chunks
                .similarity_search(&vector, self.config.top_k, filter),
        )
        .await
        {
            Ok(Ok(chunks)) => chunks,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "similarity search failed");
                return RagOutcome::degraded();
            }
            Err(_) => {
                tracing::warn!("similarity search timed out");
                return RagOutcome::degraded();
            }
        };

        let prompt = compose_prompt(question, &retrieved);
        let qa_pairs: Vec<QaPair> = history.iter().map(QaPair::from).collect();

        let answer = match tokio::time::timeout(
            timeout,
            self.completion.complete(&prompt, &qa_pairs),
        )
        .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "completion provider failed");
                return RagOutcome::degraded();
            }
            Err(_) => {
                tracing::warn!("completion provider timed out");
                return RagOutcome::degraded();
            }
        };

        RagOutcome {
            answer,
            sources: distinct_sources(&retrieved),
            provider_error: false,
        }
    }
}

/// Grounded prompt: retrieved extracts with their citations, then the
/// question. Prior turns travel separately as dialogue context.
fn compose_prompt(question: &str, retrieved: &[RetrievedChunk]) -> String {
    let mut prompt = String::from(
        "Answer the question using the reference extracts below. Cite the source \
         name for anything you take from an extract. If the extracts don't cover \
         the question, say so instead of guessing.\n",
    );

    if retrieved.is_empty() {
        prompt.push_str("\n(No reference extracts matched this question.)\n");
    } else {
        prompt.push_str("\nReference extracts:\n");
        for (i, chunk) in retrieved.iter().enumerate() {
            prompt.push_str(&format!(
                "[{}] ({}) {}\n",
                i + 1,
                chunk.source_title,
                chunk.content.trim()
            ));
        }
    }

    prompt.push_str(&format!("\nQuestion: {}\n", question));
    prompt
}

/// Distinct source titles in retrieval rank order.
fn distinct_sources(retrieved: &[RetrievedChunk]) -> Vec<SourceRef> {
    let mut sources: Vec<SourceRef> = Vec::new();
    for chunk in retrieved {
        if !sources.iter().any(|s| s.title == chunk.source_title) {
            sources.push(SourceRef {
                title: chunk.source_title.clone(),
                url: chunk.source_url.clone(),
            });
        }
    }
    sources
}
