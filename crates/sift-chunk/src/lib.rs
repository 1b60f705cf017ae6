//! Document discovery and line-respecting chunking.
//!
//! Source files are split into token-budgeted chunks that never break a
//! line; page-oriented documents (PDFs) are split into one chunk per
//! non-blank line. Discovery walks a directory tree with a configurable
//! pruning predicate.

pub mod chunker;
pub mod document;
pub mod lines;
pub mod pages;
pub mod tokenizer;
pub mod walker;

pub use chunker::{chunk_source, ChunkText, LineChunker};
pub use document::{load_chunks, read_source};
pub use lines::{extract_lines, page_chunks};
pub use pages::{PageSource, PdfPages};
pub use tokenizer::{CharEstimate, TokenCounter};
pub use walker::{discover, DirFilter, DiscoverOptions, Document, DocumentKind};
