//! rag-mcp - Main CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;
use tracing::info;

use rag_mcp::cli::{Args, Commands};
use rag_mcp::embedding::EmbeddingEngine;
use rag_mcp::rag::service::KnowledgeBaseStats;
use rag_mcp::rag::RagService;
use rag_mcp::server::RagMcpServer;
use rag_mcp::store::VectorStore;
use rag_mcp::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.clone())?;
    config.ensure_directories()?;
    rag_mcp::logging::init(&config.log_dir(), args.log_level());

    match args.command {
        None | Some(Commands::Serve) => serve(config).await,
        Some(Commands::Load) => load(config).await,
        Some(Commands::Stats) => stats(config).await,
        Some(Commands::Config) => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render configuration")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}

/// Run the MCP server over stdio until the client disconnects
async fn serve(config: Config) -> Result<()> {
    let service = Arc::new(build_service(config).await?);
    let server = RagMcpServer::new(service);

    info!("starting MCP server on stdio");

    let running = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    running
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}

/// Ingest the data directory from the command line
async fn load(config: Config) -> Result<()> {
    let service = build_service(config).await?;
    let report = service.load_data_directory().await?;

    println!("Loaded {} file(s):", report.total_files);
    for file in &report.loaded_files {
        println!("  {} ({} chunks)", file.file, file.chunks);
    }
    Ok(())
}

/// Print knowledge-base statistics without loading the embedding model
async fn stats(config: Config) -> Result<()> {
    let store = connect_store(&config).await?;
    let stats = KnowledgeBaseStats {
        collection_name: store.collection_name().to_string(),
        chunk_count: store.count().await?,
        storage_url: config.storage.qdrant_url.clone(),
        data_dir: config.data_dir().display().to_string(),
    };
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Wire up the full pipeline: embedding engine, vector store, RAG service
async fn build_service(config: Config) -> Result<RagService> {
    let embedding_config = config.embedding.clone();
    info!(model = %embedding_config.model_id, "loading embedding model");

    // Model download and weight loading are blocking; keep them off the
    // async runtime threads.
    let embedding = tokio::task::spawn_blocking(move || {
        EmbeddingEngine::new(&embedding_config.model_id, embedding_config.dimension)
    })
    .await
    .context("embedding engine startup task panicked")??;

    let store = connect_store(&config).await?;

    Ok(RagService::new(Arc::new(embedding), Arc::new(store), config))
}

async fn connect_store(config: &Config) -> Result<VectorStore> {
    VectorStore::connect(
        &config.storage.qdrant_url,
        &config.storage.collection_name,
        config.embedding.dimension,
    )
    .await
    .context("failed to connect to qdrant")
}
