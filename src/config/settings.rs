use crate::error::ConfigurationError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

/// Prompt used for both `system_prompt` and `context_prompt` unless overridden.
pub const DEFAULT_PROMPT: &str = "You are familiar with biographies of Albert and Marie, \
    as well as their professional and social friendships and relationships.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub llm: LLMConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub model: String,
    pub max_tokens: u32,
    /// Default temperature the index is built with.
    pub temperature: f32,
    pub base_url: String,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// `openai` or `hashing`
    pub provider: String,
    pub model: String,
    /// Vector width of the hashing embedder
    pub dimensions: usize,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub strategy: String,
    pub token_limit: usize,
    pub system_prompt: String,
    pub context_prompt: String,
    /// Budget for the history kept by the condense_question strategy
    pub condense_history_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigurationError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Self::with_defaults(Config::builder())?
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn api_key() -> Result<String, ConfigurationError> {
        env::var("OPENAI_API_KEY").map_err(|_| ConfigurationError::MissingApiKey)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        builder
            .set_default("llm.model", "gpt-4o")?
            .set_default("llm.max_tokens", 3000_i64)?
            .set_default("llm.temperature", 0.3_f64)?
            .set_default("llm.base_url", "https://api.openai.com/v1")?
            .set_default("llm.max_retries", 3_i64)?
            .set_default("embedding.provider", "openai")?
            .set_default("embedding.model", "text-embedding-3-small")?
            .set_default("embedding.dimensions", 256_i64)?
            .set_default("embedding.base_url", "https://api.openai.com/v1")?
            .set_default("retrieval.top_k", 2_i64)?
            .set_default("retrieval.chunk_size", 1024_i64)?
            .set_default("retrieval.chunk_overlap", 200_i64)?
            .set_default("chat.strategy", "condense_question")?
            .set_default("chat.token_limit", 3900_i64)?
            .set_default("chat.system_prompt", DEFAULT_PROMPT)?
            .set_default("chat.context_prompt", DEFAULT_PROMPT)?
            .set_default("chat.condense_history_limit", 8000_i64)?
            .set_default("logging.level", "info")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LLMConfig {
                model: "gpt-4o".to_string(),
                max_tokens: 3000,
                temperature: 0.3,
                base_url: "https://api.openai.com/v1".to_string(),
                max_retries: 3,
            },
            embedding: EmbeddingConfig {
                provider: "openai".to_string(),
                model: "text-embedding-3-small".to_string(),
                dimensions: 256,
                base_url: "https://api.openai.com/v1".to_string(),
            },
            retrieval: RetrievalConfig {
                top_k: 2,
                chunk_size: 1024,
                chunk_overlap: 200,
            },
            chat: ChatConfig {
                strategy: "condense_question".to_string(),
                token_limit: 3900,
                system_prompt: DEFAULT_PROMPT.to_string(),
                context_prompt: DEFAULT_PROMPT.to_string(),
                condense_history_limit: 8000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize_without_file() {
        let config = Settings::with_defaults(Config::builder())
            .unwrap()
            .build()
            .unwrap();
        let settings: Settings = config.try_deserialize().unwrap();

        assert_eq!(settings.llm.model, "gpt-4o");
        assert_eq!(settings.retrieval.top_k, 2);
        assert_eq!(settings.chat.token_limit, 3900);
        assert_eq!(settings.chat.system_prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn test_default_impl_matches_builder_defaults() {
        let built: Settings = Settings::with_defaults(Config::builder())
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let default = Settings::default();

        assert_eq!(built.embedding.model, default.embedding.model);
        assert_eq!(built.chat.condense_history_limit, default.chat.condense_history_limit);
        assert!((built.llm.temperature - default.llm.temperature).abs() < f32::EPSILON);
    }
}
