//! Vector Index
//!
//! Information Hiding:
//! - Chunk embeddings and their storage layout hidden behind `retrieve`
//! - Built once from a document set; rebuilding creates a new index
//! - Carries the provider context it was built with, instead of global defaults

pub mod cache;
pub mod chunker;
pub mod similarity;

pub use cache::IndexCache;
pub use chunker::{Chunk, ChunkingOptions};

use crate::core::embedding::EmbeddingProvider;
use crate::core::llm::CompletionProvider;
use crate::corpus::Document;
use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const EMBED_BATCH_SIZE: usize = 64;

/// Providers and defaults an index is built with.
///
/// `temperature` is the build-time default used by strategies that do not
/// bring their own (condense_question and context).
#[derive(Clone)]
pub struct ProviderContext {
    pub completion: Arc<dyn CompletionProvider>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub temperature: f32,
}

impl ProviderContext {
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        temperature: f32,
    ) -> Self {
        Self {
            completion,
            embedder,
            temperature,
        }
    }
}

/// A chunk returned by retrieval, with its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Immutable nearest-neighbour index over the chunks of one corpus.
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    document_count: usize,
    providers: ProviderContext,
}

impl VectorIndex {
    pub async fn build(
        documents: &[Document],
        providers: ProviderContext,
        options: ChunkingOptions,
    ) -> Result<Self, ProviderError> {
        let chunks: Vec<Chunk> = documents
            .iter()
            .enumerate()
            .flat_map(|(i, doc)| chunker::split_into_chunks(&doc.text, &doc.source, i, options))
            .collect();

        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = providers.embedder.embed(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(ProviderError::Decode(format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    vectors.len()
                )));
            }
            embeddings.extend(vectors);
        }

        tracing::info!(
            "[VectorIndex] Built index: {} documents, {} chunks, embedder '{}'",
            documents.len(),
            chunks.len(),
            providers.embedder.model_id()
        );

        Ok(Self {
            chunks,
            embeddings,
            document_count: documents.len(),
            providers,
        })
    }

    /// Top `k` chunks by cosine similarity to `query`.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, ProviderError> {
        if k == 0 || self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.providers.embedder.embed_one(query).await?;
        let ranked = similarity::rank_descending_by_cosine(&query_vector, &self.embeddings)?;

        let results: Vec<ScoredChunk> = ranked
            .into_iter()
            .take(k)
            .map(|(idx, score)| ScoredChunk {
                chunk: self.chunks[idx].clone(),
                score,
            })
            .collect();

        tracing::debug!(
            "[VectorIndex] Retrieved {} chunks for query '{}'",
            results.len(),
            query
        );
        Ok(results)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn providers(&self) -> &ProviderContext {
        &self.providers
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::embedding::HashingEmbedder;
    use crate::core::llm::ChatMessage;
    use async_trait::async_trait;

    /// Completion provider that never gets called.
    pub struct Unused;

    #[async_trait]
    impl CompletionProvider for Unused {
        async fn complete(&self, _: &[ChatMessage], _: f32) -> Result<String, ProviderError> {
            Err(ProviderError::EmptyResponse)
        }

        fn model_id(&self) -> &str {
            "unused"
        }
    }

    pub fn hashing_context() -> ProviderContext {
        ProviderContext::new(Arc::new(Unused), Arc::new(HashingEmbedder::new(4096)), 0.3)
    }
}
