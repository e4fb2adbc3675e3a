use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

/// Run parameters, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub data: DataSettings,
    pub indexer: IndexerSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Base URL of an Ollama-compatible server. Unset or empty disables the remote path.
    pub endpoint: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub fallback_dim: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingSettings {
    pub size: usize,
    pub overlap: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    pub working_root: String,
    pub docs_root: String,
    pub index_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerSettings {
    pub extensions: Vec<String>,
    pub max_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    pub default_top_k: usize,
}

const DEFAULT_EXTENSIONS: &[&str] = &[
    "md", "markdown", "txt", "rst", "adoc", "rs", "py", "js", "jsx", "ts", "tsx", "go", "java",
    "kt", "c", "h", "cpp", "hpp", "cs", "rb", "php", "swift", "sh", "toml", "yaml", "yml",
];

impl Default for Settings {
    fn default() -> Self {
        Self {
            embedding: EmbeddingSettings {
                endpoint: Some("http://localhost:11434".to_string()),
                model: "nomic-embed-text".to_string(),
                timeout_secs: 10,
                fallback_dim: 384,
            },
            chunking: ChunkingSettings { size: 500, overlap: 50 },
            data: DataSettings {
                working_root: ".".to_string(),
                docs_root: "docs".to_string(),
                index_path: ".prlens/index.json".to_string(),
            },
            indexer: IndexerSettings {
                extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
                max_depth: 32,
            },
            search: SearchSettings { default_top_k: 5 },
        }
    }
}

impl Settings {
    /// Load for the environment named by `RUST_ENV` (default `dev`).
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> {
        let settings = Self::from_figment(Self::figment(env_name))?;
        debug!(
            env = env_name,
            remote = settings.embedding_endpoint().is_some(),
            chunk_size = settings.chunking.size,
            chunk_overlap = settings.chunking.overlap,
            "loaded settings"
        );
        Ok(settings)
    }

    /// Defaults, then `config.toml`, then `config.<env>.toml`, then `APP_*` env vars
    /// (`__` separates nested keys, e.g. `APP_CHUNKING__SIZE`).
    pub fn figment(env_name: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment.merge(Env::prefixed("APP_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking()?;
        if self.embedding.fallback_dim == 0 {
            return Err(Error::InvalidConfig(
                "embedding.fallback_dim must be greater than zero".to_string(),
            ));
        }
        if self.embedding.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "embedding.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.embedding_endpoint().is_some() && self.embedding.model.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "embedding.model is required when an endpoint is set".to_string(),
            ));
        }
        if self.indexer.extensions.is_empty() {
            return Err(Error::InvalidConfig("indexer.extensions must not be empty".to_string()));
        }
        if self.search.default_top_k == 0 {
            return Err(Error::InvalidConfig(
                "search.default_top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn chunking(&self) -> Result<ChunkingConfig> {
        ChunkingConfig::new(self.chunking.size, self.chunking.overlap)
    }

    pub fn embedding_endpoint(&self) -> Option<&str> {
        self.embedding
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding.timeout_secs)
    }

    pub fn working_root(&self) -> PathBuf {
        expand_path(&self.data.working_root)
    }

    pub fn docs_root(&self) -> PathBuf {
        resolve_with_base(&self.working_root(), &self.data.docs_root)
    }

    pub fn index_path(&self) -> PathBuf {
        resolve_with_base(&self.working_root(), &self.data.index_path)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
