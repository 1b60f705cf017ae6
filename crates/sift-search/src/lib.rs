//! Embedding, vector storage, index building and retrieval.
//!
//! [`builder::IndexBuilder`] rebuilds a collection from a directory tree;
//! [`retriever::Retriever`] answers queries against it, re-scoring the
//! store's nearest neighbours with exact cosine similarity.

pub mod builder;
pub mod embedding;
pub mod retriever;
pub mod similarity;
pub mod store;

pub use builder::{IndexBuilder, IndexReport};
pub use embedding::{Embedder, EmbeddingBackend, HashEmbedder, HttpEmbedder};
pub use retriever::{Retriever, DEFAULT_TOP_K};
pub use similarity::cosine_similarity;
pub use store::{Collection, Include, QueryHit, StoreStats, VectorStore};
