//! Line extraction for page-oriented documents.
//!
//! Every non-blank line of every page becomes its own chunk.

use std::path::Path;

use sift_core::Chunk;

use crate::tokenizer::TokenCounter;

/// Split page texts into trimmed, non-blank lines in page order.
///
/// Accepts both `\n` and `\r\n` endings. Whitespace around each split point
/// is dropped, and content never merges across lines.
///
/// # Examples
///
/// ```
/// use sift_chunk::lines::extract_lines;
///
/// let pages = ["  Title \r\n\r\n  body line\n", "", "page two"];
/// assert_eq!(extract_lines(pages), vec!["Title", "body line", "page two"]);
/// ```
pub fn extract_lines<I, S>(pages: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut lines = Vec::new();
    for page in pages {
        lines.extend(
            page.as_ref()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }
    lines
}

/// Turn page texts into one [`Chunk`] per line.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use sift_chunk::lines::page_chunks;
/// use sift_chunk::tokenizer::CharEstimate;
///
/// let chunks = page_chunks(
///     Path::new("data/manual.pdf"),
///     ["Safety\nKeep dry", "Warranty"],
///     &CharEstimate::default(),
/// );
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[2].record_id(), "data/manual.pdf-2");
/// ```
pub fn page_chunks<I, S, T>(path: &Path, pages: I, counter: &T) -> Vec<Chunk>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    T: TokenCounter + ?Sized,
{
    extract_lines(pages)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            source_path: path.to_path_buf(),
            sequence_index: index,
            token_count: counter.count_line(&text),
            text,
        })
        .collect()
}
