//! prlens-core
//!
//! Shared domain types, the `Embedder` seam, layered configuration and the
//! word-window chunker used by the embedding, vector and indexer crates.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use chunker::{chunk_text, ChunkingConfig};
pub use config::Settings;
pub use error::{Error, Result};
pub use traits::Embedder;
pub use types::{Document, Embedding, EmbeddingSource, Meta, SearchResult};
