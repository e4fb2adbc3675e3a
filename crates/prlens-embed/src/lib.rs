//! prlens-embed
//!
//! Text embedding for the document store: an Ollama-compatible remote client
//! (`remote`), a deterministic bag-of-words hashing scheme (`hashing`), and
//! `EmbeddingProvider`, which tries the former and falls back to the latter.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod hashing;
pub mod provider;
pub mod remote;

pub use hashing::HashingEmbedder;
pub use provider::EmbeddingProvider;
pub use remote::RemoteEmbedder;
