//! Prompt templates shared by the strategies, and question condensation.

use crate::core::llm::{ChatMessage, CompletionProvider, Role};
use crate::error::ProviderError;
use crate::index::ScoredChunk;

const CONDENSE_INSTRUCTIONS: &str = "Given a conversation between a user and an assistant \
and a follow-up message from the user, rewrite the follow-up message as a standalone question \
that keeps every piece of context it depends on. Replace pronouns and references to earlier \
turns with the names or things they refer to. Reply with the standalone question only.";

/// Retrieved chunks rendered for inclusion in a prompt.
pub fn context_block(chunks: &[ScoredChunk]) -> String {
    let body = chunks
        .iter()
        .map(|c| format!("source: {}\n{}", c.chunk.source, c.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Context information is below.\n--------------------\n{}\n--------------------",
        body
    )
}

/// System message: instructions followed by the retrieved context.
pub fn system_with_context(instructions: &str, chunks: &[ScoredChunk]) -> ChatMessage {
    let block = context_block(chunks);
    if instructions.trim().is_empty() {
        ChatMessage::system(block)
    } else {
        ChatMessage::system(format!("{}\n\n{}", instructions, block))
    }
}

/// Single question-answering message used by condense_question.
pub fn answer_from_context(question: &str, chunks: &[ScoredChunk]) -> ChatMessage {
    ChatMessage::user(format!(
        "{}\nGiven the context information and not prior knowledge, answer the query.\n\
         Query: {}\nAnswer:",
        context_block(chunks),
        question
    ))
}

fn render_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rewrite `utterance` into a question that stands without `history`.
///
/// With no prior turns there is nothing to resolve and the utterance is
/// returned unchanged without calling the provider.
pub async fn condense(
    provider: &dyn CompletionProvider,
    history: &[ChatMessage],
    utterance: &str,
    temperature: f32,
) -> Result<String, ProviderError> {
    if history.iter().all(|m| m.role == Role::System) {
        return Ok(utterance.to_string());
    }

    let messages = [
        ChatMessage::system(CONDENSE_INSTRUCTIONS),
        ChatMessage::user(format!(
            "<Chat History>\n{}\n\n<Follow Up Message>\n{}\n\n<Standalone question>",
            render_history(history),
            utterance
        )),
    ];

    let condensed = provider.complete(&messages, temperature).await?;
    let condensed = condensed.trim();
    if condensed.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(condensed.to_string())
}
