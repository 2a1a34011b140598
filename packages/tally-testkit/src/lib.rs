//! Deterministic stand-ins for the index and the embedding model, plus receipt fixtures.

pub mod chunker;
pub mod embedder;
pub mod fixtures;
pub mod memory_index;

pub use chunker::chunk_receipt;
pub use embedder::hash_embed;
pub use fixtures::{ReceiptBuilder, sample_receipts};
pub use memory_index::MemoryIndex;
