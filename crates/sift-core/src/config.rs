use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SiftError;

/// Top-level configuration loaded from `.sift.toml`.
///
/// Resolution order: CLI flags > config file > defaults. Every field has a
/// default, so an empty file is a valid configuration.
///
/// # Examples
///
/// ```
/// use sift_core::SiftConfig;
///
/// let config = SiftConfig::default();
/// assert_eq!(config.index.max_tokens, 500);
/// assert_eq!(config.search.top_k, 5);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiftConfig {
    /// Discovery, chunking and store location.
    #[serde(default)]
    pub index: IndexConfig,
    /// Embedding provider settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Retrieval settings.
    #[serde(default)]
    pub search: SearchConfig,
}

impl SiftConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Io`] if the file cannot be read, or
    /// [`SiftError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sift_core::SiftConfig;
    /// use std::path::Path;
    ///
    /// let config = SiftConfig::from_file(Path::new(".sift.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, SiftError> {
        if !path.exists() {
            return Err(SiftError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_core::SiftConfig;
    ///
    /// let toml = r#"
    /// [index]
    /// max_tokens = 256
    /// "#;
    /// let config = SiftConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.index.max_tokens, 256);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, SiftError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SiftError> {
        if self.index.max_tokens == 0 {
            return Err(SiftError::Config("index.max_tokens must be at least 1".into()));
        }
        if self.index.store_path.as_os_str().is_empty() {
            return Err(SiftError::Config("index.store_path must not be empty".into()));
        }
        if self.index.collection.trim().is_empty() {
            return Err(SiftError::Config("index.collection must not be empty".into()));
        }
        if self.embedding.dimensions == 0 {
            return Err(SiftError::Config(
                "embedding.dimensions must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Document discovery and chunking configuration.
///
/// # Examples
///
/// ```
/// use sift_core::IndexConfig;
///
/// let config = IndexConfig::default();
/// assert_eq!(config.collection, "codebase");
/// assert!(config.skip_dirs.iter().any(|d| d == "node_modules"));
/// assert_eq!(config.reserved_prefix, ".");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory holding the vector store. Wiped on every index run.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Name of the single collection shared by indexer and retriever.
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Token budget per source-code chunk (default: 500).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Source file extensions chunked as code (without the dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Whether `.pdf` files are indexed line by line.
    #[serde(default = "default_true")]
    pub include_pdfs: bool,
    /// Directory names never descended into.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
    /// Directories whose name starts with this prefix are pruned.
    #[serde(default = "default_reserved_prefix")]
    pub reserved_prefix: String,
    /// Honour `.gitignore` files while walking.
    #[serde(default)]
    pub respect_gitignore: bool,
    /// Files larger than this are skipped (default: 1 MiB).
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".sift")
}

fn default_collection() -> String {
    "codebase".into()
}

fn default_max_tokens() -> usize {
    500
}

fn default_extensions() -> Vec<String> {
    [
        "py", "rs", "go", "js", "ts", "java", "c", "h", "cpp", "hpp", "rb", "sh",
    ]
    .iter()
    .map(|e| e.to_string())
    .collect()
}

fn default_true() -> bool {
    true
}

fn default_skip_dirs() -> Vec<String> {
    [
        ".git",
        ".hg",
        ".svn",
        "__pycache__",
        "node_modules",
        ".venv",
        "venv",
        "env",
        "py_env",
        "site-packages",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

fn default_reserved_prefix() -> String {
    ".".into()
}

fn default_max_file_bytes() -> u64 {
    1_048_576
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            collection: default_collection(),
            max_tokens: default_max_tokens(),
            extensions: default_extensions(),
            include_pdfs: true,
            skip_dirs: default_skip_dirs(),
            reserved_prefix: default_reserved_prefix(),
            respect_gitignore: false,
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Any server exposing an OpenAI-compatible `/embeddings` endpoint.
    #[default]
    OpenAi,
    /// Offline feature-hashing embedder.
    Hash,
}

impl fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingProvider::OpenAi => write!(f, "openai"),
            EmbeddingProvider::Hash => write!(f, "hash"),
        }
    }
}

/// Configuration for the embedding provider.
///
/// Index and query time must use identical settings, otherwise similarity
/// scores are meaningless.
///
/// # Examples
///
/// ```
/// use sift_core::{EmbeddingConfig, EmbeddingProvider};
///
/// let config = EmbeddingConfig::default();
/// assert_eq!(config.provider, EmbeddingProvider::OpenAi);
/// assert_eq!(config.model, "all-minilm");
/// assert_eq!(config.dimensions, 384);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding backend (default: `"openai"`).
    #[serde(default)]
    pub provider: EmbeddingProvider,
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name (default: `"all-minilm"`).
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// API key; falls back to the `SIFT_API_KEY` env var. Optional for local servers.
    pub api_key: Option<String>,
    /// Vector length produced by the hash embedder (default: 384).
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".into()
}

fn default_embedding_model() -> String {
    "all-minilm".into()
}

fn default_dimensions() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            base_url: default_base_url(),
            model: default_embedding_model(),
            api_key: None,
            dimensions: default_dimensions(),
        }
    }
}

/// Distance space the store uses to rank nearest neighbours.
///
/// This only affects which records come back and in what order; the
/// retriever re-scores every hit with exact cosine similarity.
///
/// # Examples
///
/// ```
/// use sift_core::DistanceSpace;
///
/// let space: DistanceSpace = "ip".parse().unwrap();
/// assert_eq!(space, DistanceSpace::InnerProduct);
/// assert_eq!(DistanceSpace::default().to_string(), "l2");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceSpace {
    /// Squared Euclidean distance.
    #[default]
    L2,
    /// `1 - cosine similarity`.
    Cosine,
    /// `1 - dot product`.
    #[serde(rename = "ip")]
    InnerProduct,
}

impl fmt::Display for DistanceSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceSpace::L2 => write!(f, "l2"),
            DistanceSpace::Cosine => write!(f, "cosine"),
            DistanceSpace::InnerProduct => write!(f, "ip"),
        }
    }
}

impl FromStr for DistanceSpace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "l2" => Ok(DistanceSpace::L2),
            "cosine" => Ok(DistanceSpace::Cosine),
            "ip" => Ok(DistanceSpace::InnerProduct),
            other => Err(format!("unknown distance space: {other}")),
        }
    }
}

/// Retrieval configuration.
///
/// # Examples
///
/// ```
/// use sift_core::SearchConfig;
///
/// let config = SearchConfig::default();
/// assert_eq!(config.top_k, 5);
/// assert!(!config.sort_by_similarity);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of nearest neighbours requested per query (default: 5).
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Re-sort hits by exact similarity instead of keeping store order.
    #[serde(default)]
    pub sort_by_similarity: bool,
    /// Distance space for new collections (default: `l2`).
    #[serde(default)]
    pub distance: DistanceSpace,
}

fn default_top_k() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            sort_by_similarity: false,
            distance: DistanceSpace::default(),
        }
    }
}
