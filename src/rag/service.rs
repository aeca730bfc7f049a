// RAG service - document ingestion and semantic retrieval
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::embedding::EmbeddingEngine;
use crate::rag::chunker::{chunk_text, ChunkParams};
use crate::store::{ScoredChunk, StoredChunk, VectorStore};

/// Result of ingesting one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDocumentResult {
    pub title: String,
    pub chunk_count: usize,
    pub ids: Vec<String>,
}

/// One file processed by a data-directory load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedFile {
    pub file: String,
    pub chunks: usize,
}

/// Result of loading the data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub loaded_files: Vec<LoadedFile>,
    pub total_files: usize,
}

/// Knowledge-base statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseStats {
    pub collection_name: String,
    pub chunk_count: u64,
    pub storage_url: String,
    pub data_dir: String,
}

/// RAG service tying chunking, embedding and storage together
pub struct RagService {
    embedding: Arc<EmbeddingEngine>,
    store: Arc<VectorStore>,
    config: Config,
}

impl RagService {
    /// Create a new service over already-initialized components
    pub fn new(embedding: Arc<EmbeddingEngine>, store: Arc<VectorStore>, config: Config) -> Self {
        Self {
            embedding,
            store,
            config,
        }
    }

    /// Chunk, embed and store a document.
    ///
    /// `chunk_size` overrides the configured window for this document only.
    pub async fn add_document(
        &self,
        content: &str,
        title: &str,
        chunk_size: Option<usize>,
    ) -> Result<AddDocumentResult> {
        let params = ChunkParams {
            chunk_size: chunk_size.unwrap_or(self.config.chunking.chunk_size),
            overlap: self.config.chunking.overlap,
        };
        let chunks = chunk_text(content, &params);
        debug!(title, chunk_count = chunks.len(), "chunked document");

        if chunks.is_empty() {
            return Ok(AddDocumentResult {
                title: title.to_string(),
                chunk_count: 0,
                ids: Vec::new(),
            });
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.as_str()).collect();
        let embeddings = self
            .embedding
            .embed_batch(&texts)
            .context("Failed to embed document chunks")?;

        let added_at = chrono::Utc::now().timestamp();
        let total_chunks = chunks.len();
        let stored: Vec<StoredChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (text, embedding))| {
                let mut metadata = HashMap::new();
                metadata.insert("title".to_string(), json!(title));
                metadata.insert("chunk_index".to_string(), json!(i));
                metadata.insert("total_chunks".to_string(), json!(total_chunks));
                metadata.insert("added_at".to_string(), json!(added_at));
                StoredChunk::new(text, embedding, metadata)
            })
            .collect();

        let ids = self
            .store
            .add_batch(stored)
            .await
            .context("Failed to store document chunks")?;

        info!(title, chunk_count = total_chunks, "document added");

        Ok(AddDocumentResult {
            title: title.to_string(),
            chunk_count: total_chunks,
            ids,
        })
    }

    /// Retrieve the chunks most similar to a query
    pub async fn retrieve(&self, query: &str, top_k: Option<usize>) -> Result<Vec<ScoredChunk>> {
        let top_k = top_k.unwrap_or(self.config.retrieval.default_top_k);

        let query_embedding = self
            .embedding
            .embed(query)
            .context("Failed to embed query")?;

        let results = self
            .store
            .query(&query_embedding, top_k, self.config.retrieval.score_threshold)
            .await
            .context("Failed to query vector store")?;

        debug!(query, result_count = results.len(), "retrieval complete");

        Ok(results)
    }

    /// Format retrieved chunks as a context block for prompt augmentation
    pub fn format_context(&self, chunks: &[ScoredChunk]) -> String {
        format_context(chunks, self.config.retrieval.max_context_chars)
    }

    /// Ingest every `.txt` and `.md` file under the data directory
    pub async fn load_data_directory(&self) -> Result<LoadReport> {
        let data_dir = self.config.data_dir();
        let mut loaded_files = Vec::new();

        let mut paths: Vec<_> = std::fs::read_dir(&data_dir)
            .with_context(|| format!("Failed to read data directory: {}", data_dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_text_file(path))
            .collect();
        paths.sort();

        for path in paths {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;

            let result = self.add_document(&content, &file_name, None).await?;
            loaded_files.push(LoadedFile {
                file: file_name,
                chunks: result.chunk_count,
            });
        }

        info!(total_files = loaded_files.len(), "data directory loaded");

        Ok(LoadReport {
            total_files: loaded_files.len(),
            loaded_files,
        })
    }

    /// List stored chunks without ranking
    pub async fn list(&self, limit: usize) -> Result<Vec<ScoredChunk>> {
        self.store.list(limit).await
    }

    /// Drop the whole knowledge base
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }

    /// Current knowledge-base statistics
    pub async fn stats(&self) -> Result<KnowledgeBaseStats> {
        let chunk_count = self.store.count().await?;

        Ok(KnowledgeBaseStats {
            collection_name: self.store.collection_name().to_string(),
            chunk_count,
            storage_url: self.config.storage.qdrant_url.clone(),
            data_dir: self.config.data_dir().display().to_string(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Format scored chunks into a readable context block.
///
/// One section per chunk with its source title and score, separated by `---`.
/// Output is capped at `max_chars` characters.
pub fn format_context(chunks: &[ScoredChunk], max_chars: usize) -> String {
    if chunks.is_empty() {
        return "No relevant documents found.".to_string();
    }

    let parts: Vec<String> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let title = chunk
                .metadata
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown");
            format!(
                "[Document {}] Source: {}, Score: {:.2}\n{}",
                i + 1,
                title,
                chunk.score,
                chunk.text
            )
        })
        .collect();

    truncate_chars(&parts.join("\n\n---\n\n"), max_chars)
}

/// Truncate to a character count without splitting a scalar value
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

fn is_text_file(path: &Path) -> bool {
    path.is_file()
        && matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("txt") | Some("md")
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scored(title: &str, text: &str, score: f32) -> ScoredChunk {
        let mut metadata = HashMap::new();
        metadata.insert("title".to_string(), json!(title));
        ScoredChunk {
            id: "id".to_string(),
            score,
            text: text.to_string(),
            metadata,
        }
    }

    #[test]
    fn test_format_context_empty() {
        assert_eq!(format_context(&[], 1000), "No relevant documents found.");
    }

    #[test]
    fn test_format_context_single() {
        let chunks = vec![scored("notes.txt", "Chunk body", 0.87)];
        let context = format_context(&chunks, 1000);

        assert!(context.contains("[Document 1]"));
        assert!(context.contains("Source: notes.txt"));
        assert!(context.contains("Score: 0.87"));
        assert!(context.contains("Chunk body"));
        assert!(!context.contains("---"));
    }

    #[test]
    fn test_format_context_separator_between_documents() {
        let chunks = vec![
            scored("a.txt", "First", 0.9),
            scored("b.txt", "Second", 0.8),
        ];
        let context = format_context(&chunks, 1000);

        assert!(context.contains("[Document 1]"));
        assert!(context.contains("[Document 2]"));
        assert!(context.contains("\n\n---\n\n"));
    }

    #[test]
    fn test_format_context_missing_title() {
        let chunks = vec![ScoredChunk {
            id: "id".to_string(),
            score: 0.5,
            text: "orphan chunk".to_string(),
            metadata: HashMap::new(),
        }];
        let context = format_context(&chunks, 1000);
        assert!(context.contains("Source: Unknown"));
    }

    #[test]
    fn test_format_context_respects_cap() {
        let chunks = vec![scored("big.txt", &"z".repeat(500), 0.9)];
        let context = format_context(&chunks, 100);
        assert_eq!(context.chars().count(), 100);
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        let text = "漢字".repeat(100);
        let truncated = truncate_chars(&text, 7);
        assert_eq!(truncated.chars().count(), 7);
    }

    #[test]
    fn test_is_text_file_extensions() {
        let temp = tempfile::TempDir::new().unwrap();
        for (name, expected) in [
            ("a.txt", true),
            ("b.md", true),
            ("c.pdf", false),
            ("noext", false),
        ] {
            let path = temp.path().join(name);
            std::fs::write(&path, "x").unwrap();
            assert_eq!(is_text_file(&path), expected, "{}", name);
        }
    }
}
