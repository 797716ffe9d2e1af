//! Mindful: retrieval-grounded mental-health chatbot server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mindful_chat::{LLMConfig, ProviderClient};
use mindful_core::MindfulConfig;
use mindful_server::{build_router, cli, AppState};
use mindful_store::SqliteStore;

fn resolve_data_dir() -> PathBuf {
    std::env::var("MINDFUL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn open_store(config: &MindfulConfig) -> anyhow::Result<SqliteStore> {
    let path = config.index_path();
    SqliteStore::open(&path, config.embedding_dim)
        .with_context(|| format!("Failed to open index at {}", path.display()))
}

fn print_help() {
    println!("Mindful: mental-health support chatbot backend");
    println!();
    println!("Usage: mindful [command]");
    println!();
    println!("Commands:");
    println!("  (none) | serve           Start the HTTP server");
    println!("  ingest [pdf-dir]         Index every PDF in the folder (default: data/pdfs)");
    println!("  help                     Show this help message");
}

fn run_ingest(config: &MindfulConfig, dir: Option<&String>) -> anyhow::Result<()> {
    let dir = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data_paths.pdfs.clone());
    let (report, stats) = cli::ingest(config, &dir)
        .with_context(|| format!("Failed to ingest {}", dir.display()))?;
    print!("{}", cli::render_summary(&dir, &report, &stats));
    Ok(())
}

async fn serve(config: MindfulConfig) -> anyhow::Result<()> {
    let port = config.port;

    let store = Arc::new(open_store(&config)?);
    let embedder = mindful_infer::create_embedder(&config.data_paths.models);

    let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);
    let client = ProviderClient::from_config(&llm_config).context("No usable LLM provider")?;
    info!("LLM provider: {}", client.provider());

    let state = Arc::new(AppState::new(config, store, embedder, Arc::new(client)));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Mindful server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("serve");

    if matches!(command, "--help" | "-h" | "help") {
        print_help();
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());
    let config = MindfulConfig::from_env(&data_dir)?;

    match command {
        "serve" => serve(config).await,
        "ingest" => {
            let dir = args.get(2).cloned();
            tokio::task::spawn_blocking(move || run_ingest(&config, dir.as_ref())).await?
        }
        other => {
            eprintln!("Unknown command: {}. Use 'mindful help' for usage.", other);
            std::process::exit(1);
        }
    }
}
