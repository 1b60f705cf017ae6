use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A contiguous, line-respecting slice of a document.
///
/// Chunks are the unit of embedding and retrieval. `token_count` is the
/// budget accounting total and is kept for diagnostics only.
///
/// # Examples
///
/// ```
/// use sift_core::Chunk;
/// use std::path::PathBuf;
///
/// let chunk = Chunk {
///     source_path: PathBuf::from("src/app.py"),
///     sequence_index: 0,
///     text: "import os\nimport sys".into(),
///     token_count: 6,
/// };
/// assert_eq!(chunk.record_id(), "src/app.py-0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Path of the document the chunk came from.
    pub source_path: PathBuf,
    /// Position of the chunk within its document (0-indexed).
    pub sequence_index: usize,
    /// Chunk text, lines joined with `\n`.
    pub text: String,
    /// Sum of per-line token counts.
    pub token_count: usize,
}

impl Chunk {
    /// The store id for this chunk, `<source_path>-<sequence_index>`.
    pub fn record_id(&self) -> String {
        record_id(&self.source_path, self.sequence_index)
    }

    /// The metadata stored next to this chunk's vector.
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            path: self.source_path.clone(),
            chunk_index: self.sequence_index,
        }
    }
}

/// Build a record id from a document path and chunk index.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use sift_core::record_id;
///
/// assert_eq!(record_id(Path::new("data/guide.pdf"), 12), "data/guide.pdf-12");
/// ```
pub fn record_id(path: &Path, index: usize) -> String {
    format!("{}-{index}", path.display())
}

/// Metadata stored with every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// Path of the source document.
    pub path: PathBuf,
    /// Index of the chunk within that document.
    pub chunk_index: usize,
}

/// One stored entry: id, vector, text, metadata.
///
/// # Examples
///
/// ```
/// use sift_core::{Chunk, IndexedRecord};
/// use std::path::PathBuf;
///
/// let chunk = Chunk {
///     source_path: PathBuf::from("notes.pdf"),
///     sequence_index: 3,
///     text: "Chapter 1".into(),
///     token_count: 3,
/// };
/// let record = IndexedRecord::from_chunk(&chunk, vec![0.1, 0.2]);
/// assert_eq!(record.id, "notes.pdf-3");
/// assert_eq!(record.metadata.chunk_index, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedRecord {
    /// Unique id, `<path>-<chunk_index>`.
    pub id: String,
    /// Embedding vector.
    pub vector: Vec<f32>,
    /// The chunk text.
    pub document: String,
    /// Source path and chunk index.
    pub metadata: ChunkMetadata,
}

impl IndexedRecord {
    /// Pair a chunk with its embedding.
    pub fn from_chunk(chunk: &Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: chunk.record_id(),
            vector,
            document: chunk.text.clone(),
            metadata: chunk.metadata(),
        }
    }
}

/// A retrieval hit after exact re-scoring.
///
/// # Examples
///
/// ```
/// use sift_core::{ChunkMetadata, QueryResult};
/// use std::path::PathBuf;
///
/// let result = QueryResult {
///     id: "src/db.py-2".into(),
///     document: "def connect():".into(),
///     metadata: ChunkMetadata { path: PathBuf::from("src/db.py"), chunk_index: 2 },
///     similarity: 0.91,
///     distance: 0.18,
///     is_best: true,
/// };
/// assert!(result.is_best);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Record id.
    pub id: String,
    /// Stored chunk text.
    pub document: String,
    /// Stored metadata.
    pub metadata: ChunkMetadata,
    /// Exact cosine similarity to the query, in [-1, 1].
    pub similarity: f64,
    /// The store's own ranking distance, kept for diagnostics.
    pub distance: f64,
    /// Whether this hit has the highest similarity of the result set.
    pub is_best: bool,
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use sift_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable listing.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
