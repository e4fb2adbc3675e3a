use std::fs;
use std::sync::Arc;

use prlens_core::{Document, EmbeddingSource, Meta};
use prlens_embed::EmbeddingProvider;
use prlens_vector::DocumentStore;

fn offline_store(index_path: std::path::PathBuf) -> DocumentStore {
    let provider = EmbeddingProvider::offline(384).expect("provider");
    DocumentStore::new(Arc::new(provider), index_path)
}

fn meta(pairs: &[(&str, &str)]) -> Meta {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

#[tokio::test]
async fn save_clear_load_round_trips_in_order() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("nested/dir/index.json");
    let mut store = offline_store(path.clone());

    let release_meta = meta(&[("chunk_index", "0")]);
    let source = store
        .add("Release checklist: bump the version", "docs/release.md", release_meta)
        .await;
    assert_eq!(source, EmbeddingSource::Fallback);
    store.add("Привет, unicode survives", "docs/ru.md", Meta::new()).await;
    let pr_meta = meta(&[("status", "modified"), ("pr_ref", "12")]);
    store.add("+ fn parse() {}", "pr:12:src/parse.rs", pr_meta).await;
    let before: Vec<Document> = store.documents().to_vec();

    store.save()?;
    assert!(path.exists(), "parent directories are created");

    store.clear();
    assert_eq!(store.size(), 0);
    assert!(path.exists(), "clear does not touch the file");

    assert!(store.load());
    assert_eq!(store.documents(), before.as_slice());
    Ok(())
}

#[tokio::test]
async fn index_file_is_a_json_array_of_documents() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("index.json");
    let mut store = offline_store(path.clone());
    store.add("alpha", "a.md", Meta::new()).await;
    store.save()?;

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let first = &value.as_array().expect("array")[0];
    for field in ["id", "content", "source", "embedding", "metadata"] {
        assert!(first.get(field).is_some(), "missing {field}");
    }
    assert_eq!(first["id"], "a.md:0");
    Ok(())
}

#[tokio::test]
async fn missing_or_corrupt_index_leaves_state_unchanged() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("index.json");
    let mut store = offline_store(path.clone());

    assert!(!store.load(), "missing file");
    assert!(store.is_empty());

    store.add("kept", "k.md", Meta::new()).await;
    fs::write(&path, "{ not json ]")?;
    assert!(!store.load(), "corrupt file");
    assert_eq!(store.size(), 1);
    assert_eq!(store.documents()[0].content, "kept");
    Ok(())
}

#[tokio::test]
async fn documents_without_embeddings_are_not_persisted() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("index.json");
    let mut store = offline_store(path);
    store.add("embedded", "e.md", Meta::new()).await;
    store.insert(Document {
        id: "raw:1".to_string(),
        content: "raw".to_string(),
        source: "raw".to_string(),
        embedding: Vec::new(),
        metadata: Meta::new(),
    });
    store.save()?;
    store.clear();
    assert!(store.load());
    assert_eq!(store.size(), 1);
    assert_eq!(store.documents()[0].source, "e.md");
    Ok(())
}

#[tokio::test]
async fn hashed_search_prefers_overlapping_vocabulary() {
    let mut store = offline_store("unused.json".into());
    store
        .add("How to configure the embedding endpoint and model", "docs/config.md", Meta::new())
        .await;
    store.add("Changelog for the previous release", "CHANGELOG.md", Meta::new()).await;
    store.add("Running the test suite locally", "docs/testing.md", Meta::new()).await;

    let results = store.search("configure embedding endpoint", 10).await;
    assert_eq!(results.len(), 3, "top_k larger than the store returns everything");
    assert_eq!(results[0].document.source, "docs/config.md");
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));

    assert_eq!(store.search("configure embedding endpoint", 1).await.len(), 1);
}
