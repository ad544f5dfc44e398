//! In-memory chunk index with cosine-similarity search.
//!
//! Chunks are inserted a document at a time with contiguous ordinal indices;
//! deleting a document cascades to all its chunks.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::providers::ChunkIndex;
use crate::types::{ChunkFilter, KnowledgeChunk, KnowledgeDocument, RetrievedChunk};

#[derive(Default)]
struct IndexInner {
    documents: HashMap<Uuid, KnowledgeDocument>,
    chunks: Vec<KnowledgeChunk>,
}

#[derive(Default)]
pub struct InMemoryChunkIndex {
    inner: RwLock<IndexInner>,
}

impl InMemoryChunkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document and its chunk texts/embeddings. Ordinal indices are
    /// assigned here, contiguous from 0.
    pub fn insert_document(
        &self,
        document: KnowledgeDocument,
        chunks: Vec<(String, Vec<f32>)>,
    ) -> Result<()> {
        if chunks.is_empty() {
            return Err(anyhow!("document '{}' has no chunks", document.title));
        }
        let mut inner = self.inner.write();
        let doc_id = document.id;
        for (index, (content, embedding)) in chunks.into_iter().enumerate() {
            inner.chunks.push(KnowledgeChunk {
                id: Uuid::new_v4(),
                document_id: doc_id,
                chunk_index: index as u32,
                content,
                embedding,
            });
        }
        inner.documents.insert(doc_id, document);
        Ok(())
    }

    /// Remove a document and cascade-delete its chunks.
    pub fn remove_document(&self, document_id: Uuid) {
        let mut inner = self.inner.write();
        inner.documents.remove(&document_id);
        inner.chunks.retain(|c| c.document_id != document_id);
    }

    pub fn chunk_count(&self) -> usize {
        self.inner.read().chunks.len()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl ChunkIndex for InMemoryChunkIndex {
    async fn similarity_search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&ChunkFilter>,
    ) -> Result<Vec<RetrievedChunk>> {
        let inner = self.inner.read();
        let mut scored: Vec<RetrievedChunk> = inner
            .chunks
            .iter()
            .filter_map(|chunk| {
                let document = inner.documents.get(&chunk.document_id)?;
                if let Some(ChunkFilter {
                    organization: Some(org),
                }) = filter
                {
                    if document.organization.as_deref() != Some(org.as_str()) {
                        return None;
                    }
                }
                Some(RetrievedChunk {
                    content: chunk.content.clone(),
                    document_id: chunk.document_id,
                    source_title: document.title.clone(),
                    source_url: document.url.clone(),
                    score: cosine_similarity(vector, &chunk.embedding),
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, organization: Option<&str>) -> KnowledgeDocument {
        KnowledgeDocument {
            id: Uuid::new_v4(),
            title: title.to_string(),
            organization: organization.map(|s| s.to_string()),
            url: None,
        }
    }

    #[tokio::test]
    async fn test_best_match_first() {
        let index = InMemoryChunkIndex::new();
        index
            .insert_document(
                doc("Decking guide", None),
                vec![
                    ("joist spacing".to_string(), vec![1.0, 0.0]),
                    ("board fixing".to_string(), vec![0.0, 1.0]),
                ],
            )
            .unwrap();

        let results = index.similarity_search(&[1.0, 0.1], 2, None).await.unwrap();
        assert_eq!(results[0].content, "joist spacing");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_organization_filter() {
        let index = InMemoryChunkIndex::new();
        index
            .insert_document(
                doc("Shared guide", None),
                vec![("public text".to_string(), vec![1.0, 0.0])],
            )
            .unwrap();
        index
            .insert_document(
                doc("Org guide", Some("acme")),
                vec![("private text".to_string(), vec![1.0, 0.0])],
            )
            .unwrap();

        let filter = ChunkFilter {
            organization: Some("acme".to_string()),
        };
        let results = index
            .similarity_search(&[1.0, 0.0], 10, Some(&filter))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source_title, "Org guide");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_chunks() {
        let index = InMemoryChunkIndex::new();
        let document = doc("Doomed", None);
        let id = document.id;
        index
            .insert_document(
                document,
                vec![
                    ("a".to_string(), vec![1.0]),
                    ("b".to_string(), vec![0.5]),
                ],
            )
            .unwrap();
        assert_eq!(index.chunk_count(), 2);

        index.remove_document(id);
        assert_eq!(index.chunk_count(), 0);
        let results = index.similarity_search(&[1.0], 10, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
