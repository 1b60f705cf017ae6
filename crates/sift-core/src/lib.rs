//! Core types, configuration, and error handling for sift.
//!
//! This crate provides the shared foundation used by the other sift crates:
//! - [`SiftError`]: unified error type using `thiserror`
//! - [`SiftConfig`]: configuration loaded from `.sift.toml`
//! - Shared types: [`Chunk`], [`ChunkMetadata`], [`IndexedRecord`],
//!   [`QueryResult`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{
    DistanceSpace, EmbeddingConfig, EmbeddingProvider, IndexConfig, SearchConfig, SiftConfig,
};
pub use error::SiftError;
pub use types::{record_id, Chunk, ChunkMetadata, IndexedRecord, OutputFormat, QueryResult};

/// A convenience `Result` type for sift operations.
pub type Result<T> = std::result::Result<T, SiftError>;
