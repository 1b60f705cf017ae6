//! Loading a discovered document and turning it into chunks.

use std::path::Path;

use sift_core::{Chunk, SiftError};

use crate::chunker::chunk_source;
use crate::lines::page_chunks;
use crate::pages::PageSource;
use crate::tokenizer::TokenCounter;
use crate::walker::{Document, DocumentKind};

/// Read a source file as text, replacing invalid UTF-8 sequences.
///
/// # Errors
///
/// Returns [`SiftError::SourceRead`] if the file cannot be read.
pub fn read_source(path: &Path) -> Result<String, SiftError> {
    let bytes = std::fs::read(path).map_err(|e| SiftError::SourceRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read `doc` and chunk it according to its kind.
///
/// Source files go through the token-budgeted chunker; page-oriented files
/// yield one chunk per non-blank line. Chunks are identified by `doc.path`.
///
/// # Errors
///
/// Returns [`SiftError::SourceRead`] if the document cannot be read or its
/// pages cannot be extracted.
///
/// # Examples
///
/// ```
/// use sift_chunk::document::load_chunks;
/// use sift_chunk::pages::PdfPages;
/// use sift_chunk::tokenizer::CharEstimate;
/// use sift_chunk::walker::{Document, DocumentKind};
///
/// let dir = std::env::temp_dir().join("sift-doc-example");
/// std::fs::create_dir_all(&dir).unwrap();
/// std::fs::write(dir.join("m.py"), "a = 1\n\nb = 2\n").unwrap();
///
/// let doc = Document {
///     path: "m.py".into(),
///     full_path: dir.join("m.py"),
///     kind: DocumentKind::Source,
/// };
/// let chunks = load_chunks(&doc, 500, &PdfPages, &CharEstimate::default()).unwrap();
/// assert_eq!(chunks.len(), 2);
/// ```
pub fn load_chunks<P, T>(
    doc: &Document,
    max_tokens: usize,
    pages: &P,
    counter: &T,
) -> Result<Vec<Chunk>, SiftError>
where
    P: PageSource + ?Sized,
    T: TokenCounter + ?Sized,
{
    match doc.kind {
        DocumentKind::Source => {
            let text = read_source(&doc.full_path)?;
            Ok(chunk_source(&doc.path, &text, max_tokens, counter))
        }
        DocumentKind::Pages => {
            let page_texts = pages.pages(&doc.full_path)?;
            Ok(page_chunks(&doc.path, &page_texts, counter))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::tokenizer::CharEstimate;

    struct FixedPages(Vec<&'static str>);

    impl PageSource for FixedPages {
        fn pages(&self, _path: &Path) -> Result<Vec<String>, SiftError> {
            Ok(self.0.iter().map(|p| p.to_string()).collect())
        }
    }

    #[test]
    fn source_documents_use_relative_ids() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("pkg").join("mod.py");
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(&full, "x = 1\ny = 2\n\nz = 3").unwrap();

        let doc = Document {
            path: PathBuf::from("pkg/mod.py"),
            full_path: full,
            kind: DocumentKind::Source,
        };
        let chunks =
            load_chunks(&doc, 500, &FixedPages(vec![]), &CharEstimate::default()).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].record_id(), "pkg/mod.py-0");
        assert_eq!(chunks[0].text, "x = 1\ny = 2");
    }

    #[test]
    fn page_documents_yield_one_chunk_per_line() {
        let doc = Document {
            path: PathBuf::from("manual.pdf"),
            full_path: PathBuf::from("/unused/manual.pdf"),
            kind: DocumentKind::Pages,
        };
        let pages = FixedPages(vec!["Intro\n  Setup  ", "", "Usage"]);
        let chunks = load_chunks(&doc, 1, &pages, &CharEstimate::default()).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Intro", "Setup", "Usage"]);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.py");
        std::fs::write(&path, b"name = 'caf\xe9'\n").unwrap();
        let text = read_source(&path).unwrap();
        assert!(text.starts_with("name = 'caf"));
    }

    #[test]
    fn unreadable_source_is_a_source_read_error() {
        let doc = Document {
            path: PathBuf::from("gone.py"),
            full_path: PathBuf::from("/nonexistent/gone.py"),
            kind: DocumentKind::Source,
        };
        let err =
            load_chunks(&doc, 10, &FixedPages(vec![]), &CharEstimate::default()).unwrap_err();
        assert!(matches!(err, SiftError::SourceRead { .. }));
    }
}
