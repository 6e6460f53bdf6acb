//! NoteChat: ask questions about an uploaded document.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use notechat_chat::{CohereCompleter, GenerationConfig};
use notechat_core::{NoteChatConfig, RetrievalSettings};
use notechat_infer::CohereEmbedder;
use notechat_ingest::{extract_path, RecursiveChunker};
use notechat_runtime::Orchestrator;
use notechat_server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "serve" => {}
            "check" | "--check" => return check().await,
            "extract" => {
                let Some(path) = args.get(2) else {
                    eprintln!("Usage: notechat extract <path>");
                    std::process::exit(1);
                };
                return extract(Path::new(path));
            }
            "--help" | "-h" | "help" => {
                println!("NoteChat — chat with your documents");
                println!();
                println!("Usage: notechat [command]");
                println!();
                println!("Commands:");
                println!("  serve (default)          Start the server");
                println!("  check                    Test the embedding service connection");
                println!("  extract <path>           Print the text and chunk count of a file");
                println!("  help                     Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'notechat help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    serve().await
}

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

async fn serve() -> anyhow::Result<()> {
    // A missing API key stops startup here, before any document is accepted.
    let config = NoteChatConfig::from_env()?;
    let port = config.port;

    let embedder = notechat_infer::create_embedder(&config)?;
    let completer = CohereCompleter::new(
        &config.cohere.base_url,
        &config.cohere.api_key,
        GenerationConfig::from(&config.cohere),
        config.timeouts.generation,
    )?;
    let orchestrator = Orchestrator::new(
        embedder,
        Arc::new(completer),
        config.retrieval,
        config.timeouts,
    );

    let state = Arc::new(AppState::new(config, orchestrator));
    if !state.config.session_ttl.is_zero() {
        let sweeper = Arc::clone(&state);
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(SESSION_SWEEP_INTERVAL);
            loop {
                ticks.tick().await;
                sweeper.evict_idle();
            }
        });
    }
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("NoteChat server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn check() -> anyhow::Result<()> {
    let config = NoteChatConfig::from_env()?;
    let embedder = CohereEmbedder::new(&config.cohere, config.timeouts.connect)?;
    match embedder.check_connection().await {
        Ok(dim) => {
            println!(
                "Embedding service OK: {} ({} dimensions)",
                config.cohere.embed_model, dim
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Embedding service check failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn extract(path: &Path) -> anyhow::Result<()> {
    let (file_type, text) = extract_path(path)?;
    let chunker = RecursiveChunker::from_settings(&RetrievalSettings::default());
    let chunks = chunker.split_text(&text);

    println!("{}", text);
    eprintln!(
        "{}: {} ({} characters, {} chunks)",
        path.display(),
        file_type,
        text.chars().count(),
        chunks.len()
    );
    Ok(())
}
