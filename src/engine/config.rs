use crate::config::{Settings, DEFAULT_PROMPT};
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_TOKEN_LIMIT: usize = 1000;
pub const MAX_TOKEN_LIMIT: usize = 8000;

/// The three conversational protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    CondenseQuestion,
    Context,
    CondensePlusContext,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::CondenseQuestion,
        StrategyKind::Context,
        StrategyKind::CondensePlusContext,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::CondenseQuestion => "condense_question",
            StrategyKind::Context => "context",
            StrategyKind::CondensePlusContext => "condense_plus_context",
        }
    }

    /// Whether the strategy keeps a user-sized memory buffer.
    pub fn uses_token_limit(&self) -> bool {
        !matches!(self, StrategyKind::CondenseQuestion)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnknownStrategy(s.to_string()))
    }
}

/// Per-engine options. Fixed for the lifetime of one engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Used by condense_plus_context for its own completion calls
    pub temperature: f32,
    /// Memory budget; ignored by condense_question
    pub token_limit: usize,
    /// Used only by context
    pub system_prompt: String,
    /// Used only by condense_plus_context
    pub context_prompt: String,
    /// Chunks retrieved per turn
    pub top_k: usize,
    /// Budget of the history condense_question keeps for condensation
    pub condense_history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            token_limit: 3900,
            system_prompt: DEFAULT_PROMPT.to_string(),
            context_prompt: DEFAULT_PROMPT.to_string(),
            top_k: 2,
            condense_history_limit: MAX_TOKEN_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            temperature: settings.llm.temperature,
            token_limit: settings.chat.token_limit,
            system_prompt: settings.chat.system_prompt.clone(),
            context_prompt: settings.chat.context_prompt.clone(),
            top_k: settings.retrieval.top_k,
            condense_history_limit: settings.chat.condense_history_limit,
        }
    }

    /// Range checks for the options `kind` actually reads.
    pub fn validate(&self, kind: StrategyKind) -> Result<(), ConfigurationError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigurationError::TemperatureOutOfRange(self.temperature));
        }

        if kind.uses_token_limit()
            && !(MIN_TOKEN_LIMIT..=MAX_TOKEN_LIMIT).contains(&self.token_limit)
        {
            return Err(ConfigurationError::TokenLimitOutOfRange(self.token_limit));
        }

        Ok(())
    }
}
