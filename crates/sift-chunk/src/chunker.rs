//! Line-respecting, token-budgeted chunking of source files.
//!
//! A chunk closes when the next line would push it over the budget, or at a
//! blank line once it holds content. Lines are never split; a line that is
//! over budget on its own becomes a chunk by itself.

use std::path::Path;

use sift_core::Chunk;

use crate::tokenizer::TokenCounter;

/// Text of one chunk plus its accumulated token count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkText {
    /// Lines of the chunk joined with `\n`.
    pub text: String,
    /// Sum of the per-line token counts.
    pub token_count: usize,
}

/// Lazy iterator over the chunks of a text.
///
/// Cloning the iterator before consuming it gives an independent pass over
/// the same input.
///
/// # Examples
///
/// ```
/// use sift_chunk::chunker::LineChunker;
/// use sift_chunk::tokenizer::CharEstimate;
///
/// let counter = CharEstimate::default();
/// let chunks: Vec<String> = LineChunker::new("a\nb\n\nc", 500, &counter)
///     .map(|c| c.text)
///     .collect();
/// assert_eq!(chunks, vec!["a\nb", "c"]);
/// ```
#[derive(Debug)]
pub struct LineChunker<'a, T: ?Sized> {
    lines: std::str::Lines<'a>,
    counter: &'a T,
    max_tokens: usize,
    current: Vec<&'a str>,
    token_count: usize,
}

impl<T: ?Sized> Clone for LineChunker<'_, T> {
    fn clone(&self) -> Self {
        Self {
            lines: self.lines.clone(),
            counter: self.counter,
            max_tokens: self.max_tokens,
            current: self.current.clone(),
            token_count: self.token_count,
        }
    }
}

impl<'a, T: TokenCounter + ?Sized> LineChunker<'a, T> {
    /// Chunk `text` with a budget of `max_tokens` per chunk.
    pub fn new(text: &'a str, max_tokens: usize, counter: &'a T) -> Self {
        Self {
            lines: text.lines(),
            counter,
            max_tokens,
            current: Vec::new(),
            token_count: 0,
        }
    }

    fn flush(&mut self) -> Option<ChunkText> {
        if self.current.is_empty() {
            return None;
        }
        let chunk = ChunkText {
            text: self.current.join("\n"),
            token_count: self.token_count,
        };
        self.current.clear();
        self.token_count = 0;
        Some(chunk)
    }
}

impl<T: TokenCounter + ?Sized> Iterator for LineChunker<'_, T> {
    type Item = ChunkText;

    fn next(&mut self) -> Option<ChunkText> {
        loop {
            let Some(line) = self.lines.next() else {
                return self.flush();
            };
            let line_tokens = self.counter.count_line(line);

            let mut emitted = None;
            if !self.current.is_empty() && self.token_count + line_tokens > self.max_tokens {
                emitted = self.flush();
            }

            // Blank lines separate blocks and are never part of a chunk.
            if line.trim().is_empty() {
                match emitted.or_else(|| self.flush()) {
                    Some(chunk) => return Some(chunk),
                    None => continue,
                }
            }

            self.current.push(line);
            self.token_count += line_tokens;

            if emitted.is_some() {
                return emitted;
            }
        }
    }
}

/// Chunk a source file into [`Chunk`]s numbered from zero.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use sift_chunk::chunker::chunk_source;
/// use sift_chunk::tokenizer::CharEstimate;
///
/// let chunks = chunk_source(
///     Path::new("app.py"),
///     "import os\n\ndef main():\n    pass\n",
///     500,
///     &CharEstimate::default(),
/// );
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[1].text, "def main():\n    pass");
/// assert_eq!(chunks[1].record_id(), "app.py-1");
/// ```
pub fn chunk_source<T: TokenCounter + ?Sized>(
    path: &Path,
    text: &str,
    max_tokens: usize,
    counter: &T,
) -> Vec<Chunk> {
    LineChunker::new(text, max_tokens, counter)
        .enumerate()
        .map(|(index, chunk)| Chunk {
            source_path: path.to_path_buf(),
            sequence_index: index,
            text: chunk.text,
            token_count: chunk.token_count,
        })
        .collect()
}
