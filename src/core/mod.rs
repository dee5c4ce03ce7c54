//! Provider clients: completion and embedding.

pub mod embedding;
pub mod llm;

use crate::config::Settings;
use crate::error::ConfigurationError;
use embedding::{EmbeddingProvider, HashingEmbedder, OpenAIEmbeddings};
use llm::{CompletionProvider, OpenAIClient};
use std::sync::Arc;

/// Build the embedding provider named by `settings.embedding.provider`.
///
/// The hashing embedder needs no API key.
pub fn embedding_provider(
    settings: &Settings,
) -> Result<Arc<dyn EmbeddingProvider>, ConfigurationError> {
    match settings.embedding.provider.as_str() {
        "hashing" => Ok(Arc::new(HashingEmbedder::new(settings.embedding.dimensions))),
        "openai" => Ok(Arc::new(OpenAIEmbeddings::new(
            Settings::api_key()?,
            settings.embedding.clone(),
        ))),
        other => Err(ConfigurationError::UnknownEmbeddingProvider(other.to_string())),
    }
}

pub fn completion_provider(
    settings: &Settings,
) -> Result<Arc<dyn CompletionProvider>, ConfigurationError> {
    Ok(Arc::new(OpenAIClient::new(
        Settings::api_key()?,
        settings.llm.clone(),
    )))
}
