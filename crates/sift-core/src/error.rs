use std::path::PathBuf;

/// Errors that can occur across the sift pipeline.
///
/// Library crates return this type directly; the binary renders it through
/// `miette` at the boundary. [`SiftError::SourceRead`] is recovered per
/// document during indexing, while [`SiftError::EmptyCollection`] and
/// [`SiftError::NoMatches`] end a single query without ending a session.
///
/// # Examples
///
/// ```
/// use sift_core::SiftError;
///
/// let err = SiftError::Config("missing base_url".into());
/// assert!(err.to_string().contains("missing base_url"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum SiftError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A document could not be read or its text extracted.
    #[error("could not read {}: {reason}", path.display())]
    SourceRead { path: PathBuf, reason: String },

    /// Embedding provider failure.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Vector store failure.
    #[error("database error: {0}")]
    Database(String),

    /// A vector's length does not match the collection's recorded dimension.
    #[error("vector has {actual} dimensions but the collection stores {expected}")]
    #[diagnostic(help("the index was built with a different embedding model; run `sift index` again"))]
    DimensionMismatch { expected: usize, actual: usize },

    /// The queried collection holds no records.
    #[error("collection '{collection}' is empty, nothing to search")]
    #[diagnostic(help("run `sift index` first"))]
    EmptyCollection { collection: String },

    /// The collection is populated but the store returned no hits.
    #[error("no matches found")]
    NoMatches,

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl SiftError {
    /// Whether this error ends only the current query rather than the session.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_core::SiftError;
    ///
    /// assert!(SiftError::NoMatches.is_query_outcome());
    /// assert!(!SiftError::Database("locked".into()).is_query_outcome());
    /// ```
    pub fn is_query_outcome(&self) -> bool {
        matches!(
            self,
            SiftError::EmptyCollection { .. } | SiftError::NoMatches
        )
    }
}
