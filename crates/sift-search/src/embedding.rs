//! Embedding backends.
//!
//! [`HttpEmbedder`] talks to any OpenAI-compatible `/embeddings` endpoint
//! (Ollama, llama.cpp server, OpenAI itself). [`HashEmbedder`] is a
//! deterministic offline backend based on feature hashing, used in tests
//! and for air-gapped setups.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sift_core::{EmbeddingConfig, EmbeddingProvider, SiftError};

const BATCH_SIZE: usize = 64;
const API_KEY_ENV: &str = "SIFT_API_KEY";

/// Maps text to a fixed-length vector.
///
/// The same embedder must be used for indexing and for querying a
/// collection; nothing checks that at runtime beyond the vector length.
#[allow(async_fn_in_trait)]
pub trait Embedder {
    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Embedding`] if the backend fails.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SiftError>;

    /// Embed several texts, returning vectors in input order.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Embedding`] if the backend fails.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SiftError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

impl<E: Embedder + ?Sized> Embedder for &E {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SiftError> {
        (**self).embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SiftError> {
        (**self).embed_batch(texts).await
    }
}

/// Client for an OpenAI-compatible embeddings API.
///
/// # Examples
///
/// ```
/// use sift_search::embedding::HttpEmbedder;
///
/// let client = HttpEmbedder::new("http://localhost:11434/v1", "all-minilm");
/// assert_eq!(client.model(), "all-minilm");
/// ```
pub struct HttpEmbedder {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("authenticated", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDataItem>,
}

#[derive(Deserialize)]
struct EmbedDataItem {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl HttpEmbedder {
    /// Create an unauthenticated client for `base_url` and `model`.
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: None,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Attach a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Create a client from an [`EmbeddingConfig`].
    ///
    /// Falls back to the `SIFT_API_KEY` env var if no key is configured. A
    /// missing key is fine for local servers.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] if `base_url` or `model` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_core::EmbeddingConfig;
    /// use sift_search::embedding::HttpEmbedder;
    ///
    /// let client = HttpEmbedder::with_config(&EmbeddingConfig::default()).unwrap();
    /// assert_eq!(client.base_url(), "http://localhost:11434/v1");
    /// ```
    pub fn with_config(config: &EmbeddingConfig) -> Result<Self, SiftError> {
        if config.base_url.trim().is_empty() {
            return Err(SiftError::Config(
                "embedding.base_url is empty: set it in .sift.toml".into(),
            ));
        }
        if config.model.trim().is_empty() {
            return Err(SiftError::Config(
                "embedding.model is empty: set it in .sift.toml".into(),
            ));
        }

        let mut client = Self::new(&config.base_url, &config.model);
        client.api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.is_empty());
        Ok(client)
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the API base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>, SiftError> {
        let body = EmbedRequest {
            model: &self.model,
            input,
        };
        let mut request = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SiftError::Embedding(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".into());
            return Err(SiftError::Embedding(format!(
                "embedding API returned {status}: {body}"
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| SiftError::Embedding(format!("failed to parse response: {e}")))?;

        into_ordered_vectors(parsed, input.len())
    }
}

fn into_ordered_vectors(
    mut response: EmbedResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, SiftError> {
    if response.data.len() != expected {
        return Err(SiftError::Embedding(format!(
            "expected {expected} embeddings, got {}",
            response.data.len()
        )));
    }
    response.data.sort_by_key(|item| item.index);
    Ok(response.data.into_iter().map(|item| item.embedding).collect())
}

impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SiftError> {
        self.request(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SiftError::Embedding("empty response from embedding API".into()))
    }

    /// Sends sub-batches of 64 texts per request.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SiftError> {
        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            all.extend(self.request(batch).await?);
        }
        Ok(all)
    }
}

/// Deterministic feature-hashing embedder.
///
/// Lowercased alphanumeric words are hashed with SHA-256 into a signed bucket;
/// the result is L2-normalized. Texts sharing words get similar vectors.
///
/// # Examples
///
/// ```
/// use sift_search::embedding::HashEmbedder;
///
/// let embedder = HashEmbedder::new(64);
/// let v = embedder.vector("open the database connection");
/// assert_eq!(v.len(), 64);
/// assert_eq!(v, embedder.vector("Open the DATABASE connection"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Create an embedder producing vectors of `dimensions` components (at least 1).
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Vector length.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Compute the vector for `text`. Text without any word maps to the zero vector.
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty())
        {
            let digest = Sha256::digest(word.to_lowercase().as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let slot = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SiftError> {
        Ok(self.vector(text))
    }
}

/// The embedder selected by configuration.
#[derive(Debug)]
pub enum EmbeddingBackend {
    /// OpenAI-compatible HTTP endpoint.
    Http(HttpEmbedder),
    /// Offline feature hashing.
    Hash(HashEmbedder),
}

impl EmbeddingBackend {
    /// Build the backend named by `config.provider`.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] if the HTTP backend is misconfigured.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_core::{EmbeddingConfig, EmbeddingProvider};
    /// use sift_search::embedding::EmbeddingBackend;
    ///
    /// let config = EmbeddingConfig {
    ///     provider: EmbeddingProvider::Hash,
    ///     dimensions: 32,
    ///     ..EmbeddingConfig::default()
    /// };
    /// let backend = EmbeddingBackend::from_config(&config).unwrap();
    /// assert!(matches!(backend, EmbeddingBackend::Hash(_)));
    /// ```
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, SiftError> {
        match config.provider {
            EmbeddingProvider::OpenAi => Ok(Self::Http(HttpEmbedder::with_config(config)?)),
            EmbeddingProvider::Hash => Ok(Self::Hash(HashEmbedder::new(config.dimensions))),
        }
    }

    /// Short human-readable description, e.g. for `sift doctor`.
    pub fn describe(&self) -> String {
        match self {
            Self::Http(client) => format!("{} via {}", client.model(), client.base_url()),
            Self::Hash(hash) => format!("feature hashing, {} dimensions", hash.dimensions()),
        }
    }
}

impl Embedder for EmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SiftError> {
        match self {
            Self::Http(client) => client.embed(text).await,
            Self::Hash(hash) => hash.embed(text).await,
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SiftError> {
        match self {
            Self::Http(client) => client.embed_batch(texts).await,
            Self::Hash(hash) => hash.embed_batch(texts).await,
        }
    }
}
