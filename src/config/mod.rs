mod settings;

pub use settings::{
    ChatConfig, EmbeddingConfig, LLMConfig, LoggingConfig, RetrievalConfig, Settings,
    DEFAULT_PROMPT,
};
