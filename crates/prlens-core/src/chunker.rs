//! Word-window chunking with overlap.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Chunk sizing in words. `overlap` is always strictly smaller than `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    size: usize,
    overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { size: 500, overlap: 50 }
    }
}

impl ChunkingConfig {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfig("chunk size must be greater than zero".to_string()));
        }
        if overlap >= size {
            return Err(Error::InvalidConfig(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({size})"
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Number of words the window start advances per chunk.
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        split_words(text, self.size, self.step())
    }
}

/// Split `text` into windows of `size` words advancing by `size - overlap`.
///
/// Text with at most `size` words comes back unchanged as a single chunk;
/// text without any words yields no chunks.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>> {
    Ok(ChunkingConfig::new(size, overlap)?.chunk(text))
}

fn split_words(text: &str, size: usize, step: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    if words.len() <= size {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + size).min(words.len());
        chunks.push(words[start..end].join(" "));
        start += step;
    }
    chunks
}
