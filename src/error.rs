//! Error taxonomy
//!
//! Information Hiding:
//! - Transport and decode failures are folded into `ProviderError`
//! - Callers match on three kinds only: load, configuration, provider

use std::path::PathBuf;
use thiserror::Error;

/// Corpus could not be turned into documents. Fatal to engine construction.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("corpus source does not exist: {0}")]
    SourceNotFound(PathBuf),

    #[error("corpus source yielded no documents: {0}")]
    EmptyCorpus(String),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid strategy name or out-of-range parameter. Raised before any provider call.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unknown chat strategy '{0}' (expected condense_question, context or condense_plus_context)")]
    UnknownStrategy(String),

    #[error("temperature {0} is outside [0, 1]")]
    TemperatureOutOfRange(f32),

    #[error("token_limit {0} is outside [1000, 8000]")]
    TokenLimitOutOfRange(usize),

    #[error("OPENAI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("unknown embedding provider '{0}' (expected openai or hashing)")]
    UnknownEmbeddingProvider(String),

    #[error(transparent)]
    Settings(#[from] config::ConfigError),
}

/// An embedding or completion call failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("response decode error: {0}")]
    Decode(String),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Everything a single chat turn can fail with.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_wraps_provider_error() {
        let err: ChatError = ProviderError::Api {
            status: 429,
            body: "quota".to_string(),
        }
        .into();

        assert!(matches!(err, ChatError::Provider(ProviderError::Api { status: 429, .. })));
        assert_eq!(err.to_string(), "API error 429: quota");
    }

    #[test]
    fn test_configuration_error_messages() {
        let err = ConfigurationError::UnknownStrategy("unknown".to_string());
        assert!(err.to_string().contains("'unknown'"));

        let err = ConfigurationError::TokenLimitOutOfRange(500);
        assert!(err.to_string().contains("500"));
    }
}
