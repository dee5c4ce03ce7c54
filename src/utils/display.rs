use crate::core::llm::{ChatMessage, Role};
use crate::index::ScoredChunk;
use colored::*;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.chars().count()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

pub fn print_prompt(text: &str) {
    print!("{}", text.yellow().bold());
}

/// Retrieved chunks, one line each, with their similarity scores.
pub fn print_sources(query: &str, sources: &[ScoredChunk]) {
    println!("{} {}", "retrieval query:".dimmed(), query.dimmed());
    for source in sources {
        println!(
            "{}",
            format!(
                "  [{:.3}] {} #{}",
                source.score, source.chunk.source, source.chunk.chunk_index
            )
            .dimmed()
        );
    }
}

pub fn print_history(history: &[ChatMessage]) {
    if history.is_empty() {
        print_info("(no retained turns)");
        return;
    }
    for turn in history {
        let label = match turn.role {
            Role::User => "You".yellow().bold(),
            Role::Assistant => "Assistant".green().bold(),
            Role::System => "System".blue().bold(),
        };
        println!("{}: {}", label, turn.content);
    }
}
