use crate::config::Settings;
use crate::engine::EngineConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "parley")]
#[command(author, version, about = "Multi-turn chat over a fixed document corpus", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session over a corpus
    Chat {
        #[command(flatten)]
        engine: EngineArgs,

        /// Print the retrieval query and retrieved chunks after each answer
        #[arg(long)]
        show_sources: bool,
    },

    /// Ask a single question and exit
    Ask {
        prompt: String,

        #[command(flatten)]
        engine: EngineArgs,

        #[arg(long)]
        show_sources: bool,
    },

    /// Load and chunk a corpus, then report what would be indexed
    Index {
        /// Directory (or single file) of .txt/.md documents
        #[arg(short, long, default_value = "./data")]
        corpus: PathBuf,

        /// Embed the chunks too, exercising the embedding provider
        #[arg(long)]
        embed: bool,
    },
}

/// Options shared by every command that builds an engine. Unset options
/// fall back to the loaded settings.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Directory (or single file) of .txt/.md documents
    #[arg(short, long, default_value = "./data")]
    pub corpus: PathBuf,

    /// condense_question, context or condense_plus_context
    #[arg(short, long)]
    pub strategy: Option<String>,

    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Memory budget in tokens (context and condense_plus_context)
    #[arg(long)]
    pub token_limit: Option<usize>,

    #[arg(long)]
    pub system_prompt: Option<String>,

    #[arg(long)]
    pub context_prompt: Option<String>,

    /// Chunks retrieved per turn
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Embedding provider: openai or hashing
    #[arg(long)]
    pub embedder: Option<String>,
}

impl EngineArgs {
    pub fn strategy(&self, settings: &Settings) -> String {
        self.strategy
            .clone()
            .unwrap_or_else(|| settings.chat.strategy.clone())
    }

    pub fn engine_config(&self, settings: &Settings) -> EngineConfig {
        let mut config = EngineConfig::from_settings(settings);
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(token_limit) = self.token_limit {
            config.token_limit = token_limit;
        }
        if let Some(prompt) = &self.system_prompt {
            config.system_prompt = prompt.clone();
        }
        if let Some(prompt) = &self.context_prompt {
            config.context_prompt = prompt.clone();
        }
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        config
    }

    /// Settings with command-line provider overrides applied.
    pub fn apply_to(&self, mut settings: Settings) -> Settings {
        if let Some(embedder) = &self.embedder {
            settings.embedding.provider = embedder.clone();
        }
        settings
    }
}
