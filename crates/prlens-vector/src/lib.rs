//! prlens-vector
//!
//! In-memory document store with brute-force cosine ranking and JSON
//! persistence. See `store` for the caller-facing API.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod similarity;
pub mod store;

pub use similarity::cosine_similarity;
pub use store::DocumentStore;
