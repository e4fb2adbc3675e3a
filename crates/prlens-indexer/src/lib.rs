//! prlens-indexer
//!
//! Feeds the document store: full directory rebuilds (`Indexer::index_directory`)
//! and pull-request diffs (`Indexer::index_diff`).

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod diff;
pub mod indexer;
pub mod walker;

pub use diff::{parse_unified_diff, FileDiff, FileStatus};
pub use indexer::{IndexReport, Indexer};
