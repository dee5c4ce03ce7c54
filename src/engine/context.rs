//! Context strategy: bounded memory plus retrieval on the literal utterance.

use super::config::{EngineConfig, StrategyKind};
use super::{prompt, ChatStrategy, TurnOutcome};
use crate::core::llm::ChatMessage;
use crate::error::ChatError;
use crate::index::VectorIndex;
use crate::memory::{MemoryBuffer, TokenCounter};
use async_trait::async_trait;
use std::sync::Arc;

pub struct ContextEngine {
    index: Arc<VectorIndex>,
    memory: MemoryBuffer,
    system_prompt: String,
    top_k: usize,
}

impl ContextEngine {
    pub fn new(index: Arc<VectorIndex>, config: EngineConfig, counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            index,
            memory: MemoryBuffer::new(config.token_limit, counter),
            system_prompt: config.system_prompt,
            top_k: config.top_k,
        }
    }
}

#[async_trait]
impl ChatStrategy for ContextEngine {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Context
    }

    async fn respond(&mut self, utterance: &str) -> Result<TurnOutcome, ChatError> {
        // Kept even if the rest of the turn fails
        self.memory.append(ChatMessage::user(utterance));

        let sources = self.index.retrieve(utterance, self.top_k).await?;
        tracing::debug!(
            "[ContextEngine] Retrieved {} chunks for '{}'",
            sources.len(),
            utterance
        );

        let mut messages = Vec::with_capacity(self.memory.len() + 1);
        messages.push(prompt::system_with_context(&self.system_prompt, &sources));
        messages.extend(self.memory.turns());

        let providers = self.index.providers();
        let response = providers
            .completion
            .complete(&messages, providers.temperature)
            .await?;

        self.memory.append(ChatMessage::assistant(response.clone()));

        Ok(TurnOutcome {
            response,
            retrieval_query: utterance.to_string(),
            sources,
        })
    }

    fn reset(&mut self) {
        self.memory.clear();
        tracing::info!("[ContextEngine] Memory cleared");
    }

    fn history(&self) -> Vec<ChatMessage> {
        self.memory.turns()
    }
}
