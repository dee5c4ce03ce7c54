//! Parley - retrieval-augmented chat over a fixed document corpus
//!
//! This library turns a static document index plus a chosen conversational
//! strategy (condense_question, context or condense_plus_context) into a
//! stateful, multi-turn question-answering engine with bounded memory.

mod config;
pub mod core;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod index;
pub mod memory;
pub mod utils;

pub mod api;
pub mod cli;

pub use api::ChatService;
pub use config::{
    ChatConfig, EmbeddingConfig, LLMConfig, LoggingConfig, RetrievalConfig, Settings,
    DEFAULT_PROMPT,
};

pub use crate::core::embedding::{EmbeddingProvider, HashingEmbedder, OpenAIEmbeddings};
pub use crate::core::llm::{ChatMessage, CompletionProvider, OpenAIClient, Role};
pub use corpus::{DirectoryLoader, Document, DocumentLoader, InMemoryLoader};
pub use engine::{
    create_engine, create_engine_with_counter, EngineConfig, EngineHandle, StrategyKind,
    TurnOutcome,
};
pub use error::{ChatError, ConfigurationError, LoadError, ProviderError};
pub use index::{Chunk, ChunkingOptions, IndexCache, ProviderContext, ScoredChunk, VectorIndex};
pub use memory::{CharEstimateCounter, MemoryBuffer, TokenCounter};
