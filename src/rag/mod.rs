//! RAG pipeline
//!
//! Ingestion and retrieval on top of the embedding engine and vector store:
//! chunk documents, embed each chunk, store, and answer semantic queries with
//! the top-matching chunks plus a formatted context block.

pub mod chunker;
pub mod service;

pub use chunker::{chunk_text, ChunkParams};
pub use service::RagService;
