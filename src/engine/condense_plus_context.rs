//! Condense-plus-context strategy: a condensed query for retrieval, the full
//! bounded memory for the answer, and the engine's own temperature.

use super::config::{EngineConfig, StrategyKind};
use super::{prompt, ChatStrategy, TurnOutcome};
use crate::core::llm::ChatMessage;
use crate::error::ChatError;
use crate::index::VectorIndex;
use crate::memory::{MemoryBuffer, TokenCounter};
use async_trait::async_trait;
use std::sync::Arc;

pub struct CondensePlusContextEngine {
    index: Arc<VectorIndex>,
    memory: MemoryBuffer,
    context_prompt: String,
    top_k: usize,
    /// May differ from the index's build-time temperature
    temperature: f32,
}

impl CondensePlusContextEngine {
    pub fn new(index: Arc<VectorIndex>, config: EngineConfig, counter: Arc<dyn TokenCounter>) -> Self {
        if (config.temperature - index.providers().temperature).abs() > f32::EPSILON {
            tracing::debug!(
                "[CondensePlusContextEngine] Answering at temperature {} (index built at {})",
                config.temperature,
                index.providers().temperature
            );
        }

        Self {
            index,
            memory: MemoryBuffer::new(config.token_limit, counter),
            context_prompt: config.context_prompt,
            top_k: config.top_k,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl ChatStrategy for CondensePlusContextEngine {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CondensePlusContext
    }

    async fn respond(&mut self, utterance: &str) -> Result<TurnOutcome, ChatError> {
        let prior = self.memory.turns();
        self.memory.append(ChatMessage::user(utterance));

        let completion = Arc::clone(&self.index.providers().completion);
        let query = prompt::condense(completion.as_ref(), &prior, utterance, self.temperature).await?;
        tracing::debug!(
            "[CondensePlusContextEngine] Condensed '{}' into '{}'",
            utterance,
            query
        );

        let sources = self.index.retrieve(&query, self.top_k).await?;

        let mut messages = Vec::with_capacity(self.memory.len() + 1);
        messages.push(prompt::system_with_context(&self.context_prompt, &sources));
        messages.extend(self.memory.turns());

        let response = completion.complete(&messages, self.temperature).await?;
        self.memory.append(ChatMessage::assistant(response.clone()));

        Ok(TurnOutcome {
            response,
            retrieval_query: query,
            sources,
        })
    }

    fn reset(&mut self) {
        self.memory.clear();
        tracing::info!("[CondensePlusContextEngine] Memory cleared");
    }

    fn history(&self) -> Vec<ChatMessage> {
        self.memory.turns()
    }
}
