//! Conversational Retrieval Engine
//!
//! Information Hiding:
//! - Each strategy's turn protocol lives in its own type behind `ChatStrategy`
//! - Memory ownership stays inside the strategy; callers only see `reset`/`history`
//! - Strategy selection validates configuration before anything is built

pub mod condense_plus_context;
pub mod condense_question;
pub mod config;
pub mod context;
pub mod handle;
pub mod prompt;

pub use condense_plus_context::CondensePlusContextEngine;
pub use condense_question::CondenseQuestionEngine;
pub use config::{EngineConfig, StrategyKind};
pub use context::ContextEngine;
pub use handle::{create_engine, create_engine_with_counter, EngineHandle};

use crate::core::llm::ChatMessage;
use crate::error::{ChatError, ConfigurationError};
use crate::index::{ScoredChunk, VectorIndex};
use crate::memory::TokenCounter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of one turn: the answer and what was retrieved to produce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub response: String,
    /// Query the index was searched with
    pub retrieval_query: String,
    pub sources: Vec<ScoredChunk>,
}

/// Uniform turn interface implemented by every strategy.
#[async_trait]
pub trait ChatStrategy: Send {
    fn kind(&self) -> StrategyKind;

    /// Advance the conversation by one user utterance.
    async fn respond(&mut self, utterance: &str) -> Result<TurnOutcome, ChatError>;

    /// Forget the conversation so far.
    fn reset(&mut self);

    /// Turns currently retained, oldest first.
    fn history(&self) -> Vec<ChatMessage>;
}

/// One engine of any strategy.
pub enum Engine {
    CondenseQuestion(CondenseQuestionEngine),
    Context(ContextEngine),
    CondensePlusContext(CondensePlusContextEngine),
}

impl Engine {
    fn strategy(&self) -> &dyn ChatStrategy {
        match self {
            Engine::CondenseQuestion(e) => e,
            Engine::Context(e) => e,
            Engine::CondensePlusContext(e) => e,
        }
    }

    fn strategy_mut(&mut self) -> &mut dyn ChatStrategy {
        match self {
            Engine::CondenseQuestion(e) => e,
            Engine::Context(e) => e,
            Engine::CondensePlusContext(e) => e,
        }
    }

    pub fn kind(&self) -> StrategyKind {
        self.strategy().kind()
    }

    pub async fn respond(&mut self, utterance: &str) -> Result<TurnOutcome, ChatError> {
        self.strategy_mut().respond(utterance).await
    }

    pub fn reset(&mut self) {
        self.strategy_mut().reset()
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.strategy().history()
    }
}

/// Build the engine named by `strategy_name`.
///
/// Validates the name and the options that strategy reads; nothing is
/// constructed on failure.
pub fn select_strategy(
    strategy_name: &str,
    config: EngineConfig,
    index: Arc<VectorIndex>,
    counter: Arc<dyn TokenCounter>,
) -> Result<Engine, ConfigurationError> {
    let kind: StrategyKind = strategy_name.parse()?;
    config.validate(kind)?;

    let engine = match kind {
        StrategyKind::CondenseQuestion => {
            Engine::CondenseQuestion(CondenseQuestionEngine::new(index, config, counter))
        }
        StrategyKind::Context => Engine::Context(ContextEngine::new(index, config, counter)),
        StrategyKind::CondensePlusContext => {
            Engine::CondensePlusContext(CondensePlusContextEngine::new(index, config, counter))
        }
    };

    tracing::info!("[Engine] Created {} engine", kind);
    Ok(engine)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::embedding::HashingEmbedder;
    use crate::core::llm::{ChatMessage, CompletionProvider};
    use crate::corpus::Document;
    use crate::error::ProviderError;
    use crate::index::{ChunkingOptions, ProviderContext, VectorIndex};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// One recorded provider call.
    #[derive(Debug, Clone)]
    pub struct Call {
        pub messages: Vec<ChatMessage>,
        pub temperature: f32,
    }

    /// Replies from a queue and records every request.
    #[derive(Default)]
    pub struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        pub calls: Mutex<Vec<Call>>,
    }

    impl ScriptedProvider {
        pub fn new<I: IntoIterator<Item = Result<String, ProviderError>>>(replies: I) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            temperature: f32,
        ) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(Call {
                messages: messages.to_vec(),
                temperature,
            });
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::EmptyResponse))
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    pub async fn science_index(provider: Arc<ScriptedProvider>, temperature: f32) -> Arc<VectorIndex> {
        let docs = vec![
            Document::new("albert.txt", "Albert was born in 1879."),
            Document::new("marie.txt", "Marie won two Nobel prizes."),
        ];
        let context = ProviderContext::new(provider, Arc::new(HashingEmbedder::new(4096)), temperature);
        Arc::new(
            VectorIndex::build(&docs, context, ChunkingOptions::default())
                .await
                .unwrap(),
        )
    }
}
