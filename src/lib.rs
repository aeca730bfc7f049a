//! rag-mcp - RAG knowledge base over MCP
//!
//! A retrieval-augmented-generation service for LLM agent hosts. Documents
//! are split into boundary-aware overlapping chunks, embedded locally with a
//! MiniLM sentence encoder, and stored in a qdrant collection. Agents reach
//! the knowledge base through MCP tools and resources (stdio transport).
//!
//! # Architecture
//!
//! - **rag**: chunking, ingestion and retrieval pipeline
//! - **embedding**: local sentence embeddings via Candle
//! - **store**: qdrant-backed vector store
//! - **server**: MCP tool/resource surface

pub mod errors;
pub mod config;
pub mod logging;
pub mod cli;

pub mod embedding;
pub mod store;
pub mod rag;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use errors::{RagError, Result};
