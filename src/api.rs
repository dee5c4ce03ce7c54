//! High-level facade
//!
//! This module ties loading, index building and engine creation together
//! behind one service object. Provider settings travel explicitly with the
//! service; there is no process-wide state.

use crate::config::Settings;
use crate::core::embedding::EmbeddingProvider;
use crate::core::llm::CompletionProvider;
use crate::corpus::DocumentLoader;
use crate::engine::{create_engine, EngineConfig, EngineHandle, StrategyKind};
use crate::error::{ChatError, ConfigurationError};
use crate::index::{ChunkingOptions, IndexCache, ProviderContext, VectorIndex};
use std::sync::Arc;

/// Builds indexes (cached) and chat engines for a corpus.
///
/// # Example
/// ```no_run
/// use parley::{ChatService, DirectoryLoader, EngineConfig, Settings};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let service = ChatService::from_settings(Settings::new()?)?;
///     let loader = DirectoryLoader::new("./data");
///     let chat = service
///         .start_chat(&loader, "context", EngineConfig::default())
///         .await?;
///     println!("{}", chat.respond("When was Albert born?").await?);
///     Ok(())
/// }
/// ```
pub struct ChatService {
    settings: Settings,
    cache: IndexCache,
    completion: Arc<dyn CompletionProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl ChatService {
    pub fn new(
        settings: Settings,
        completion: Arc<dyn CompletionProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            settings,
            cache: IndexCache::new(),
            completion,
            embedder,
        }
    }

    /// Providers chosen by `settings`; OpenAI-backed ones need `OPENAI_API_KEY`.
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigurationError> {
        let completion = crate::core::completion_provider(&settings)?;
        let embedder = crate::core::embedding_provider(&settings)?;
        Ok(Self::new(settings, completion, embedder))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn chunking(&self) -> ChunkingOptions {
        ChunkingOptions {
            chunk_size: self.settings.retrieval.chunk_size,
            chunk_overlap: self.settings.retrieval.chunk_overlap,
        }
    }

    /// Index for `loader`'s corpus built at `temperature`, reused when cached.
    pub async fn index(
        &self,
        loader: &dyn DocumentLoader,
        temperature: f32,
    ) -> Result<Arc<VectorIndex>, ChatError> {
        let providers = ProviderContext::new(
            Arc::clone(&self.completion),
            Arc::clone(&self.embedder),
            temperature,
        );
        self.cache.get_or_build(loader, providers, self.chunking()).await
    }

    /// Validate, build (or reuse) the index, and create an engine.
    ///
    /// The index is built at the engine's temperature, so changing the
    /// temperature yields a fresh index.
    pub async fn start_chat(
        &self,
        loader: &dyn DocumentLoader,
        strategy_name: &str,
        config: EngineConfig,
    ) -> Result<EngineHandle, ChatError> {
        let kind: StrategyKind = strategy_name.parse()?;
        config.validate(kind)?;

        let index = self.index(loader, config.temperature).await?;
        Ok(create_engine(strategy_name, config, index)?)
    }

    /// Drop cached indexes of `loader`'s corpus, e.g. after files changed.
    pub async fn invalidate(&self, loader: &dyn DocumentLoader) {
        self.cache.invalidate(&loader.source_id()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::embedding::HashingEmbedder;
    use crate::corpus::{DirectoryLoader, InMemoryLoader};
    use crate::engine::test_support::ScriptedProvider;
    use crate::error::LoadError;

    fn service(provider: Arc<ScriptedProvider>) -> ChatService {
        ChatService::new(
            Settings::default(),
            provider,
            Arc::new(HashingEmbedder::new(4096)),
        )
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_loading() {
        let provider = ScriptedProvider::new([]);
        let service = service(Arc::clone(&provider));
        // An empty corpus would be a LoadError if loading were attempted
        let loader = InMemoryLoader::from_texts(Vec::<String>::new());

        let config = EngineConfig {
            token_limit: 500,
            ..EngineConfig::default()
        };
        let err = service.start_chat(&loader, "context", config).await.err().unwrap();

        assert!(matches!(
            err,
            ChatError::Configuration(ConfigurationError::TokenLimitOutOfRange(500))
        ));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_corpus_is_load_error() {
        let service = service(ScriptedProvider::new([]));
        let loader = InMemoryLoader::from_texts(["  "]);

        let err = service
            .start_chat(&loader, "condense_question", EngineConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ChatError::Load(LoadError::EmptyCorpus(_))));
    }

    #[tokio::test]
    async fn test_engines_share_cached_index_until_temperature_changes() {
        let service = service(ScriptedProvider::new([]));
        let loader = InMemoryLoader::from_texts(["Albert was born in 1879."]);

        let a = service.index(&loader, 0.3).await.unwrap();
        let b = service.index(&loader, 0.3).await.unwrap();
        let c = service.index(&loader, 0.5).await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));

        service.invalidate(&loader).await;
        let d = service.index(&loader, 0.5).await.unwrap();
        assert!(!Arc::ptr_eq(&c, &d));
    }

    #[tokio::test]
    async fn test_directory_edit_is_picked_up_without_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Albert was born in 1879.").unwrap();
        let service = service(ScriptedProvider::new([]));
        let loader = DirectoryLoader::new(dir.path());

        let before = service.index(&loader, 0.3).await.unwrap();
        std::fs::write(dir.path().join("b.txt"), "Marie won two Nobel prizes.").unwrap();
        let after = service.index(&loader, 0.3).await.unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        let hits = after.retrieve("Marie Nobel", 1).await.unwrap();
        assert_eq!(hits[0].chunk.source, "b.txt");
    }
}
