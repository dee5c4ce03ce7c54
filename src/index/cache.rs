//! Content-addressed cache of built indexes
//!
//! Information Hiding:
//! - Key derivation (SHA-256 over corpus identity and provider identity) hidden
//! - Thread-safe access via RwLock hidden behind async interface
//! - Rebuilds never mutate an index in place; callers holding an old
//!   `Arc<VectorIndex>` keep a valid index

use super::{ChunkingOptions, ProviderContext, VectorIndex};
use crate::corpus::DocumentLoader;
use crate::error::ChatError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct CacheEntry {
    source_id: String,
    index: Arc<VectorIndex>,
}

pub struct IndexCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Hex SHA-256 over corpus source and content, embedding model and build temperature.
    pub fn cache_key(
        source_id: &str,
        fingerprint: &str,
        embedding_model: &str,
        temperature: f32,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(fingerprint.as_bytes());
        hasher.update([0u8]);
        hasher.update(embedding_model.as_bytes());
        hasher.update([0u8]);
        hasher.update(temperature.to_bits().to_le_bytes());
        hex::encode(hasher.finalize())
    }

    /// Return the cached index for this corpus and provider context, building it on a miss.
    pub async fn get_or_build(
        &self,
        loader: &dyn DocumentLoader,
        providers: ProviderContext,
        options: ChunkingOptions,
    ) -> Result<Arc<VectorIndex>, ChatError> {
        let source_id = loader.source_id();
        let fingerprint = loader.fingerprint().await?;
        let key = Self::cache_key(
            &source_id,
            &fingerprint,
            providers.embedder.model_id(),
            providers.temperature,
        );

        if let Some(entry) = self.entries.read().await.get(&key) {
            tracing::debug!("[IndexCache] Hit for '{}'", source_id);
            return Ok(Arc::clone(&entry.index));
        }

        tracing::debug!("[IndexCache] Miss for '{}', building", source_id);
        let documents = loader.load().await?;
        let index = Arc::new(VectorIndex::build(&documents, providers, options).await?);

        let mut entries = self.entries.write().await;
        // Drop stale builds of this corpus: older content or other providers
        entries.retain(|_, e| e.source_id != source_id);
        entries.insert(
            key,
            CacheEntry {
                source_id,
                index: Arc::clone(&index),
            },
        );
        Ok(index)
    }

    /// Forget every index built from `source_id`.
    pub async fn invalidate(&self, source_id: &str) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.source_id != source_id);
        tracing::info!(
            "[IndexCache] Invalidated {} entries for '{}'",
            before - entries.len(),
            source_id
        );
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new()
    }
}
