//! Caller-facing engine handle
//!
//! Information Hiding:
//! - Strategy type erased behind one handle
//! - Turn serialisation via an async mutex hidden from callers; concurrent
//!   `respond` calls on one handle run one after another

use super::{select_strategy, Engine, EngineConfig, StrategyKind, TurnOutcome};
use crate::core::llm::ChatMessage;
use crate::error::{ChatError, ConfigurationError};
use crate::index::VectorIndex;
use crate::memory::{CharEstimateCounter, TokenCounter};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable handle to one engine instance. Clones share the same conversation.
#[derive(Clone)]
pub struct EngineHandle {
    kind: StrategyKind,
    engine: Arc<Mutex<Engine>>,
}

/// Create an engine using the default character-based token estimate.
pub fn create_engine(
    strategy_name: &str,
    config: EngineConfig,
    index: Arc<VectorIndex>,
) -> Result<EngineHandle, ConfigurationError> {
    create_engine_with_counter(
        strategy_name,
        config,
        index,
        Arc::new(CharEstimateCounter::default()),
    )
}

pub fn create_engine_with_counter(
    strategy_name: &str,
    config: EngineConfig,
    index: Arc<VectorIndex>,
    counter: Arc<dyn TokenCounter>,
) -> Result<EngineHandle, ConfigurationError> {
    let engine = select_strategy(strategy_name, config, index, counter)?;
    Ok(EngineHandle {
        kind: engine.kind(),
        engine: Arc::new(Mutex::new(engine)),
    })
}

impl EngineHandle {
    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    /// Advance the conversation and return the answer text.
    pub async fn respond(&self, utterance: &str) -> Result<String, ChatError> {
        Ok(self.respond_detailed(utterance).await?.response)
    }

    /// Like `respond`, also reporting the retrieval query and retrieved chunks.
    pub async fn respond_detailed(&self, utterance: &str) -> Result<TurnOutcome, ChatError> {
        let mut engine = self.engine.lock().await;
        engine.respond(utterance).await
    }

    /// Clear the conversation memory.
    pub async fn reset(&self) {
        self.engine.lock().await.reset();
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.engine.lock().await.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{science_index, ScriptedProvider};

    #[tokio::test]
    async fn test_unknown_strategy_builds_nothing() {
        let provider = ScriptedProvider::new([]);
        let index = science_index(Arc::clone(&provider), 0.3).await;

        let result = create_engine("unknown", EngineConfig::default(), Arc::clone(&index));
        assert!(matches!(result, Err(ConfigurationError::UnknownStrategy(_))));
        // The index is not retained by anything
        assert_eq!(Arc::strong_count(&index), 1);
    }

    #[tokio::test]
    async fn test_concurrent_turns_keep_append_order() {
        let provider = ScriptedProvider::new([
            Ok("first answer".to_string()),
            Ok("second answer".to_string()),
        ]);
        let index = science_index(Arc::clone(&provider), 0.3).await;
        let handle = create_engine("context", EngineConfig::default(), index).unwrap();

        let a = handle.clone();
        let b = handle.clone();
        let (first, second) = tokio::join!(a.respond("one"), b.respond("two"));
        first.unwrap();
        second.unwrap();

        let history = handle.history().await;
        assert_eq!(history.len(), 4);
        // Each user turn is immediately followed by its own answer
        assert_eq!(history[0].content, "one");
        assert_eq!(history[1].content, "first answer");
        assert_eq!(history[2].content, "two");
        assert_eq!(history[3].content, "second answer");
    }

    #[tokio::test]
    async fn test_reset_through_handle() {
        let provider = ScriptedProvider::new([Ok("1879".to_string())]);
        let index = science_index(Arc::clone(&provider), 0.3).await;
        let handle = create_engine("context", EngineConfig::default(), index).unwrap();

        handle.respond("When was Albert born?").await.unwrap();
        assert_eq!(handle.history().await.len(), 2);

        handle.reset().await;
        assert!(handle.history().await.is_empty());
        assert_eq!(handle.kind(), StrategyKind::Context);
    }
}
