//! Collaborator contracts for the external embedding, similarity-search and
//! text-completion services. The engine only ever sees these traits; wire
//! formats belong to the implementations.

pub mod http;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ChunkFilter, QaPair, RetrievedChunk};

pub use http::HttpProvider;

/// Text-to-vector embedding. Failure is an explicit error, never a silent
/// zero vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Text completion over a grounded prompt, with prior question/answer pairs
/// passed as dialogue context.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str, history: &[QaPair]) -> Result<String>;
}

/// Vector store returning ranked chunks, best-match-first.
#[async_trait]
pub trait ChunkIndex: Send + Sync {
    async fn similarity_search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&ChunkFilter>,
    ) -> Result<Vec<RetrievedChunk>>;
}
