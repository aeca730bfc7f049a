//! Pipeline integration tests
//!
//! Pure chunking/formatting paths run everywhere; the end-to-end test needs a
//! local qdrant instance and the embedding model, so it is ignored by default.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use rag_mcp::config::Config;
use rag_mcp::rag::chunker::{chunk_text, ChunkParams};
use rag_mcp::rag::service::format_context;
use rag_mcp::store::ScoredChunk;

fn scored(title: &str, text: &str, score: f32) -> ScoredChunk {
    let mut metadata = HashMap::new();
    metadata.insert("title".to_string(), json!(title));
    ScoredChunk {
        id: "test-id".to_string(),
        score,
        text: text.to_string(),
        metadata,
    }
}

#[test]
fn chunking_then_formatting_produces_readable_context() {
    let document = "Retrieval-augmented generation grounds model answers in stored text. \
                    The knowledge base holds chunk embeddings. \
                    Queries return the closest chunks by cosine similarity. "
        .repeat(5);

    let chunks = chunk_text(
        &document,
        &ChunkParams {
            chunk_size: 200,
            overlap: 30,
        },
    );
    assert!(chunks.len() > 1);

    let retrieved: Vec<ScoredChunk> = chunks
        .iter()
        .take(3)
        .enumerate()
        .map(|(i, c)| scored("rag-notes.txt", c, 0.9 - i as f32 * 0.1))
        .collect();

    let context = format_context(&retrieved, 8000);
    assert!(context.contains("[Document 1] Source: rag-notes.txt, Score: 0.90"));
    assert!(context.contains("[Document 3]"));
    assert_eq!(context.matches("\n\n---\n\n").count(), 2);
}

#[test]
fn chunk_params_from_config_respect_defaults() {
    let config = Config::default();
    let params = ChunkParams {
        chunk_size: config.chunking.chunk_size,
        overlap: config.chunking.overlap,
    };

    let text = "word ".repeat(300);
    let chunks = chunk_text(&text, &params);

    for chunk in &chunks {
        assert!(chunk.chars().count() <= config.chunking.chunk_size);
    }
}

#[test]
fn config_file_flows_into_validation() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");

    std::fs::write(
        &path,
        "[chunking]\nchunk_size = 100\noverlap = 120\n",
    )
    .unwrap();

    // overlap >= chunk_size must be rejected at load time
    assert!(Config::load_from_file(&path).is_err());
}

#[tokio::test]
#[ignore] // End-to-end - requires qdrant at localhost:6334 and model download
async fn end_to_end_ingest_and_retrieve() {
    use rag_mcp::embedding::EmbeddingEngine;
    use rag_mcp::rag::RagService;
    use rag_mcp::store::VectorStore;

    let temp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.storage.collection_name = "rag_pipeline_test".to_string();
    config.paths.data_dir = temp.path().join("data").display().to_string();
    config.paths.log_dir = temp.path().join("logs").display().to_string();
    config.ensure_directories().unwrap();

    let embedding = Arc::new(
        EmbeddingEngine::new(&config.embedding.model_id, config.embedding.dimension).unwrap(),
    );
    let store = Arc::new(
        VectorStore::connect(
            &config.storage.qdrant_url,
            &config.storage.collection_name,
            config.embedding.dimension,
        )
        .await
        .unwrap(),
    );
    let service = RagService::new(embedding, store, config.clone());
    service.clear().await.unwrap();

    // Ingest two documents with distinct topics
    service
        .add_document(
            "Rust is a systems programming language focused on safety and speed.",
            "rust.txt",
            None,
        )
        .await
        .unwrap();
    service
        .add_document(
            "Basil, oregano and thyme are common herbs in Italian cooking.",
            "cooking.txt",
            None,
        )
        .await
        .unwrap();

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.chunk_count, 2);

    // The programming query must rank the programming chunk first
    let results = service.retrieve("memory safe language", Some(2)).await.unwrap();
    assert!(!results.is_empty());
    assert_eq!(
        results[0].metadata.get("title").and_then(|v| v.as_str()),
        Some("rust.txt")
    );

    // Data-directory ingestion picks up text files
    std::fs::write(
        config.data_dir().join("extra.md"),
        "Qdrant stores vectors and answers similarity queries.",
    )
    .unwrap();
    let report = service.load_data_directory().await.unwrap();
    assert_eq!(report.total_files, 1);
    assert_eq!(report.loaded_files[0].file, "extra.md");

    service.clear().await.unwrap();
    assert_eq!(service.stats().await.unwrap().chunk_count, 0);
}
