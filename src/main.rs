use anyhow::Result;
use clap::Parser;
use parley::cli::{Cli, Commands, EngineArgs};
use parley::index::chunker::split_into_chunks;
use parley::{
    utils, ChatService, ChunkingOptions, DirectoryLoader, DocumentLoader, EngineHandle, Settings,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            engine,
            show_sources,
        } => handle_chat(settings, engine, show_sources).await,
        Commands::Ask {
            prompt,
            engine,
            show_sources,
        } => handle_ask(settings, prompt, engine, show_sources).await,
        Commands::Index { corpus, embed } => handle_index(settings, corpus, embed).await,
    }
}

async fn start(settings: Settings, args: &EngineArgs) -> Result<EngineHandle> {
    let settings = args.apply_to(settings);
    let strategy = args.strategy(&settings);
    let config = args.engine_config(&settings);

    let service = ChatService::from_settings(settings)?;
    let loader = DirectoryLoader::new(&args.corpus);

    utils::print_info(&format!(
        "Indexing {} for the {} strategy...",
        args.corpus.display(),
        strategy
    ));
    Ok(service.start_chat(&loader, &strategy, config).await?)
}

async fn answer(chat: &EngineHandle, prompt: &str, show_sources: bool) -> Result<()> {
    let outcome = chat.respond_detailed(prompt).await?;
    println!("{}\n", outcome.response);
    if show_sources {
        utils::print_sources(&outcome.retrieval_query, &outcome.sources);
        println!();
    }
    Ok(())
}

async fn handle_ask(
    settings: Settings,
    prompt: String,
    args: EngineArgs,
    show_sources: bool,
) -> Result<()> {
    let chat = start(settings, &args).await?;
    answer(&chat, &prompt, show_sources).await
}

async fn handle_chat(settings: Settings, args: EngineArgs, show_sources: bool) -> Result<()> {
    let chat = start(settings, &args).await?;

    utils::print_header(&format!("Chat ({})", chat.kind()));
    utils::print_info("Type your questions, /help for commands (Ctrl+D to exit)\n");

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        utils::print_prompt("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            return Ok(());
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/reset" => {
                chat.reset().await;
                utils::print_success("Conversation memory cleared\n");
                continue;
            }
            "/history" => {
                utils::print_history(&chat.history().await);
                println!();
                continue;
            }
            "/help" => {
                println!("Special commands:");
                println!("  /reset    - Clear conversation memory");
                println!("  /history  - Show retained turns");
                println!("  /help     - Show this help");
                println!("  Ctrl+D    - Exit\n");
                continue;
            }
            _ => {}
        }

        utils::print_info("Assistant: ");
        // A failed turn is reported and the session goes on
        if let Err(e) = answer(&chat, input, show_sources).await {
            utils::print_error(&format!("Error: {}", e));
        }
    }
}

async fn handle_index(settings: Settings, corpus: PathBuf, embed: bool) -> Result<()> {
    let loader = DirectoryLoader::new(&corpus);
    let documents = loader.load().await?;
    let options = ChunkingOptions {
        chunk_size: settings.retrieval.chunk_size,
        chunk_overlap: settings.retrieval.chunk_overlap,
    };

    utils::print_header(&format!("Corpus {}", corpus.display()));
    let mut total = 0;
    for (i, document) in documents.iter().enumerate() {
        let chunks = split_into_chunks(&document.text, &document.source, i, options);
        total += chunks.len();
        println!(
            "  {} ({} chars, {} chunks)",
            document.source,
            document.text.chars().count(),
            chunks.len()
        );
    }
    utils::print_success(&format!(
        "{} documents, {} chunks",
        documents.len(),
        total
    ));

    if embed {
        let temperature = settings.llm.temperature;
        let service = ChatService::from_settings(settings)?;
        let index = service.index(&loader, temperature).await?;
        utils::print_success(&format!("Embedded {} chunks", index.chunks().len()));
    }

    Ok(())
}
