//! Local sentence embeddings
//!
//! Embeds chunks and queries with a MiniLM sentence encoder running on
//! Candle. No network access after the first model download.

pub mod engine;

pub use engine::EmbeddingEngine;
