//! Condense-question strategy: every turn is rewritten into a standalone
//! question, answered from retrieved context alone.
//!
//! The history used for condensation is capped by `condense_history_limit`
//! rather than the user-facing `token_limit`, which this strategy ignores.

use super::config::{EngineConfig, StrategyKind};
use super::{prompt, ChatStrategy, TurnOutcome};
use crate::core::llm::ChatMessage;
use crate::error::ChatError;
use crate::index::VectorIndex;
use crate::memory::{MemoryBuffer, TokenCounter};
use async_trait::async_trait;
use std::sync::Arc;

pub struct CondenseQuestionEngine {
    index: Arc<VectorIndex>,
    history: MemoryBuffer,
    top_k: usize,
}

impl CondenseQuestionEngine {
    pub fn new(index: Arc<VectorIndex>, config: EngineConfig, counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            index,
            history: MemoryBuffer::new(config.condense_history_limit, counter),
            top_k: config.top_k,
        }
    }
}

#[async_trait]
impl ChatStrategy for CondenseQuestionEngine {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CondenseQuestion
    }

    async fn respond(&mut self, utterance: &str) -> Result<TurnOutcome, ChatError> {
        let prior = self.history.turns();
        self.history.append(ChatMessage::user(utterance));

        let completion = Arc::clone(&self.index.providers().completion);
        let temperature = self.index.providers().temperature;

        let question = prompt::condense(completion.as_ref(), &prior, utterance, temperature).await?;
        tracing::debug!(
            "[CondenseQuestionEngine] Standalone question: '{}'",
            question
        );

        let sources = self.index.retrieve(&question, self.top_k).await?;
        let messages = [prompt::answer_from_context(&question, &sources)];
        let response = completion.complete(&messages, temperature).await?;

        self.history.append(ChatMessage::assistant(response.clone()));

        Ok(TurnOutcome {
            response,
            retrieval_query: question,
            sources,
        })
    }

    fn reset(&mut self) {
        self.history.clear();
        tracing::info!("[CondenseQuestionEngine] History cleared");
    }

    fn history(&self) -> Vec<ChatMessage> {
        self.history.turns()
    }
}
