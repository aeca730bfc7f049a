//! Vector storage
//!
//! One qdrant collection holds every chunk of the knowledge base; similarity
//! ranking and persistence are the database's job, not ours.

pub mod qdrant;

pub use qdrant::{ScoredChunk, StoredChunk, VectorStore};
