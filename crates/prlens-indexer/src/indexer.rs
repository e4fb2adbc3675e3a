use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use prlens_core::{ChunkingConfig, EmbeddingSource, Error, Meta, Result, Settings};
use prlens_vector::DocumentStore;

use crate::diff::parse_unified_diff;
use crate::walker::{discover_files, extension_of};

const README: &str = "README.md";

/// What one indexing call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub chunks_added: usize,
    pub fallback_embeddings: usize,
}

/// Chunks files and diffs into a [`DocumentStore`].
pub struct Indexer {
    chunking: ChunkingConfig,
    working_root: PathBuf,
    extensions: Vec<String>,
    max_depth: usize,
    show_progress: bool,
}

impl Indexer {
    pub fn new(chunking: ChunkingConfig, working_root: impl Into<PathBuf>) -> Self {
        let defaults = Settings::default().indexer;
        Self {
            chunking,
            working_root: working_root.into(),
            extensions: defaults.extensions,
            max_depth: defaults.max_depth,
            show_progress: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.chunking()?, settings.working_root())
            .with_extensions(settings.indexer.extensions.iter().cloned())
            .with_max_depth(settings.indexer.max_depth))
    }

    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Rebuild `store` from the files under `path` and persist it.
    ///
    /// A `README.md` in the working root goes in first. Fails with
    /// [`Error::NotFound`] (store untouched) when `path` is not a directory.
    pub async fn index_directory(
        &self,
        store: &mut DocumentStore,
        path: &Path,
    ) -> Result<IndexReport> {
        if !path.is_dir() {
            return Err(Error::NotFound(format!("directory {}", path.display())));
        }
        store.clear();

        let mut files = Vec::new();
        let readme = self.working_root.join(README);
        let readme_key = readme.is_file().then(|| canonical(&readme));
        if readme_key.is_some() {
            files.push(readme);
        }

        let discovered = discover_files(path, &self.extensions, self.max_depth);
        files.extend(
            discovered
                .files
                .into_iter()
                .filter(|f| readme_key.as_ref() != Some(&canonical(f))),
        );
        info!("indexing {} files from {}", files.len(), path.display());

        let mut report = IndexReport { files_skipped: discovered.errors, ..IndexReport::default() };
        self.index_files(store, &files, &mut report).await;
        store.save()?;

        info!(
            "indexed {} files into {} chunks ({} skipped, {} fallback embeddings)",
            report.files_indexed,
            report.chunks_added,
            report.files_skipped,
            report.fallback_embeddings
        );
        Ok(report)
    }

    /// Add every file section of a unified diff under `pr:<pr_ref>:<filename>`.
    ///
    /// Chunks previously added for the same `pr_ref` are replaced. The store is
    /// neither cleared nor saved. Renamed files also carry `old_path`.
    pub async fn index_diff(
        &self,
        store: &mut DocumentStore,
        pr_ref: &str,
        diff: &str,
    ) -> Result<IndexReport> {
        let pr_ref = pr_ref.trim();
        if pr_ref.is_empty() {
            return Err(Error::InvalidConfig(
                "pull request reference must not be empty".to_string(),
            ));
        }
        let removed = store.remove_by_source_prefix(&format!("pr:{pr_ref}:"));
        if removed > 0 {
            debug!("replacing {removed} chunks from an earlier run of {pr_ref}");
        }

        let mut report = IndexReport::default();
        for file in parse_unified_diff(diff) {
            let source = format!("pr:{pr_ref}:{}", file.filename);
            let file_type = extension_of(Path::new(&file.filename)).unwrap_or_default();
            let chunks = self.chunking.chunk(&file.patch);
            let total = chunks.len();
            for (i, chunk) in chunks.iter().enumerate() {
                let mut metadata = Meta::from([
                    ("chunk_index".to_string(), i.to_string()),
                    ("total_chunks".to_string(), total.to_string()),
                    ("file_type".to_string(), file_type.clone()),
                    ("status".to_string(), file.status.as_str().to_string()),
                    ("pr_ref".to_string(), pr_ref.to_string()),
                ]);
                if let Some(old_path) = &file.old_path {
                    metadata.insert("old_path".to_string(), old_path.clone());
                }
                record(&mut report, store.add(chunk, &source, metadata).await);
            }
            report.files_indexed += 1;
        }
        info!(
            "added {} chunks from {} files of {pr_ref}",
            report.chunks_added, report.files_indexed
        );
        Ok(report)
    }

    async fn index_files(
        &self,
        store: &mut DocumentStore,
        files: &[PathBuf],
        report: &mut IndexReport,
    ) {
        let pb = self.progress_bar(files.len());
        for file in files {
            pb.set_message(file.display().to_string());
            match read_file_content(file) {
                Ok(content) => {
                    self.index_file(store, file, &content, report).await;
                    report.files_indexed += 1;
                }
                Err(e) => {
                    warn!("skipping {}: {e}", file.display());
                    report.files_skipped += 1;
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
    }

    async fn index_file(
        &self,
        store: &mut DocumentStore,
        file: &Path,
        content: &str,
        report: &mut IndexReport,
    ) {
        let source = file.display().to_string();
        let file_type = extension_of(file).unwrap_or_default();
        let chunks = self.chunking.chunk(content);
        let total = chunks.len();
        debug!("{source}: {total} chunks");
        for (i, chunk) in chunks.iter().enumerate() {
            let metadata = Meta::from([
                ("chunk_index".to_string(), i.to_string()),
                ("total_chunks".to_string(), total.to_string()),
                ("file_type".to_string(), file_type.clone()),
            ]);
            record(report, store.add(chunk, &source, metadata).await);
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

fn record(report: &mut IndexReport, source: EmbeddingSource) {
    report.chunks_added += 1;
    if source == EmbeddingSource::Fallback {
        report.fallback_embeddings += 1;
    }
}

fn read_file_content(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prlens_embed::EmbeddingProvider;
    use std::sync::Arc;

    fn offline_store(dir: &Path) -> DocumentStore {
        let provider = EmbeddingProvider::offline(64).expect("provider");
        DocumentStore::new(Arc::new(provider), dir.join("index.json"))
    }

    #[tokio::test]
    async fn vanished_files_are_skipped_and_the_rest_indexed() {
        let tmp = tempfile::tempdir().expect("tmp");
        let present = tmp.path().join("present.md");
        fs::write(&present, "still here").expect("write");
        let mut store = offline_store(tmp.path());
        let indexer = Indexer::new(ChunkingConfig::default(), tmp.path());

        let mut report = IndexReport::default();
        let files = vec![tmp.path().join("gone.md"), present.clone()];
        indexer.index_files(&mut store, &files, &mut report).await;

        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.files_indexed, 1);
        assert_eq!(store.size(), 1);
        assert_eq!(store.documents()[0].source, present.display().to_string());
    }

    #[test]
    fn invalid_utf8_is_read_lossily() {
        let tmp = tempfile::tempdir().expect("tmp");
        let path = tmp.path().join("latin1.txt");
        fs::write(&path, b"caf\xe9 au lait").expect("write");
        let content = read_file_content(&path).expect("read");
        assert!(content.starts_with("caf"));
        assert!(content.ends_with(" au lait"));
    }

    #[test]
    fn extensions_are_normalized() {
        let indexer = Indexer::new(ChunkingConfig::default(), ".").with_extensions([".MD", "rs"]);
        assert_eq!(indexer.extensions, vec!["md", "rs"]);
    }
}
