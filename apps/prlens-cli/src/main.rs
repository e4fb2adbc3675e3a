use anyhow::{Context, Result};
use clap::Parser as _;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use prlens_core::{Embedder, SearchResult, Settings};
use prlens_embed::EmbeddingProvider;
use prlens_indexer::Indexer;
use prlens_vector::DocumentStore;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prlens=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = match &cli.env {
        Some(env) => Settings::load_for_env(env),
        None => Settings::load(),
    }
    .context("Error loading config")?;

    let provider = EmbeddingProvider::from_settings(&settings)?;
    if !provider.has_remote() {
        tracing::info!("no embedding endpoint configured; using hashed embeddings");
    }
    let mut store = DocumentStore::new(Arc::new(provider), settings.index_path());

    match cli.command {
        Commands::Index { path, no_progress } => {
            handle_index(&settings, &mut store, path, !no_progress).await
        }
        Commands::Search { query, top_k, json } => {
            handle_search(&settings, &mut store, &query, top_k, json).await
        }
        Commands::Diff { pr_ref, file, query, top_k } => {
            handle_diff(&settings, &mut store, &pr_ref, file, query, top_k).await
        }
        Commands::Stats => {
            handle_stats(&mut store);
            Ok(())
        }
    }
}

async fn handle_index(
    settings: &Settings,
    store: &mut DocumentStore,
    path: Option<PathBuf>,
    progress: bool,
) -> Result<()> {
    let path = path.unwrap_or_else(|| settings.docs_root());
    let indexer = Indexer::from_settings(settings)?.with_progress(progress);
    let report = indexer
        .index_directory(store, &path)
        .await
        .with_context(|| format!("indexing {} failed", path.display()))?;
    println!(
        "Indexed {} files into {} chunks ({} skipped) -> {}",
        report.files_indexed,
        report.chunks_added,
        report.files_skipped,
        store.index_path().display()
    );
    if report.fallback_embeddings > 0 {
        println!("{} chunks used hashed fallback embeddings", report.fallback_embeddings);
    }
    Ok(())
}

async fn handle_search(
    settings: &Settings,
    store: &mut DocumentStore,
    query: &str,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    if !store.load() {
        anyhow::bail!(
            "no usable index at {}; run `prlens index` first",
            store.index_path().display()
        );
    }
    let results = store.search(query, top_k.unwrap_or(settings.search.default_top_k)).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(query, &results);
    }
    Ok(())
}

async fn handle_diff(
    settings: &Settings,
    store: &mut DocumentStore,
    pr_ref: &str,
    file: Option<PathBuf>,
    query: Option<String>,
    top_k: Option<usize>,
) -> Result<()> {
    let diff = match &file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading diff from stdin")?;
            buf
        }
    };
    if !store.load() {
        tracing::warn!("starting from an empty index; run `prlens index` to include project docs");
    }
    let indexer = Indexer::from_settings(settings)?;
    let report = indexer.index_diff(store, pr_ref, &diff).await?;
    store.save()?;
    println!(
        "Added {} chunks from {} changed files of {}",
        report.chunks_added, report.files_indexed, pr_ref
    );

    if let Some(query) = query {
        let results = store.search(&query, top_k.unwrap_or(settings.search.default_top_k)).await;
        print_results(&query, &results);
    }
    Ok(())
}

fn handle_stats(store: &mut DocumentStore) {
    let loaded = store.load();
    println!("Index: {}{}", store.index_path().display(), if loaded { "" } else { " (missing)" });
    println!("Embedder: {}", store.embedder().embedder_id());
    println!("Documents: {}", store.size());
    let sources: BTreeSet<&str> = store.documents().iter().map(|d| d.source.as_str()).collect();
    let pr_sources = sources.iter().filter(|s| s.starts_with("pr:")).count();
    println!("Sources: {} ({} from pull requests)", sources.len(), pr_sources);
    let dims: BTreeSet<usize> = store.documents().iter().map(|d| d.embedding.len()).collect();
    if !dims.is_empty() {
        println!("Embedding dims: {dims:?}");
    }
}

fn print_results(query: &str, results: &[SearchResult]) {
    println!("Found {} results for: \"{}\"", results.len(), query);
    for (i, result) in results.iter().enumerate() {
        println!("\n  {}. score={:.4}  id={}", i + 1, result.score, result.document.id);
        println!("     {}", preview(&result.document.content, 240));
    }
}

fn preview(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}
