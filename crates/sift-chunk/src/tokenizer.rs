//! Token counting used for chunk budget accounting.
//!
//! Counts only need to be deterministic and monotonic in text length; they
//! are a size proxy, not a model tokenizer.

/// Maps text to a token count.
pub trait TokenCounter {
    /// Number of tokens in `text`.
    fn count_tokens(&self, text: &str) -> usize;

    /// Number of tokens in `line` followed by a newline.
    fn count_line(&self, line: &str) -> usize {
        self.count_tokens(&format!("{line}\n"))
    }
}

/// Estimates tokens as one per `chars_per_token` characters, rounded up.
///
/// # Examples
///
/// ```
/// use sift_chunk::tokenizer::{CharEstimate, TokenCounter};
///
/// let counter = CharEstimate::default();
/// assert_eq!(counter.count_tokens(""), 0);
/// assert_eq!(counter.count_tokens("abcd"), 1);
/// assert_eq!(counter.count_tokens("abcde"), 2);
/// // "abc" plus the newline is four characters.
/// assert_eq!(counter.count_line("abc"), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharEstimate {
    chars_per_token: usize,
}

impl CharEstimate {
    /// Create an estimator; a ratio of zero is treated as one.
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    fn estimate(&self, chars: usize) -> usize {
        chars.div_ceil(self.chars_per_token)
    }
}

impl Default for CharEstimate {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TokenCounter for CharEstimate {
    fn count_tokens(&self, text: &str) -> usize {
        self.estimate(text.chars().count())
    }

    fn count_line(&self, line: &str) -> usize {
        self.estimate(line.chars().count() + 1)
    }
}
