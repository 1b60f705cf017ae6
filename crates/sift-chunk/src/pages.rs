//! Page text extraction for page-oriented documents.

use std::panic::{self, UnwindSafe};
use std::path::Path;
use std::sync::Mutex;

use sift_core::SiftError;

/// Produces the ordered page texts of a document.
pub trait PageSource {
    /// Extract one string per page, in page order. Pages with no text yield
    /// an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::SourceRead`] if the document cannot be read or parsed.
    fn pages(&self, path: &Path) -> Result<Vec<String>, SiftError>;
}

/// PDF extraction backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfPages;

impl PageSource for PdfPages {
    fn pages(&self, path: &Path) -> Result<Vec<String>, SiftError> {
        match extract_quietly(path, || pdf_extract::extract_text_by_pages(path))? {
            Ok(pages) => Ok(pages),
            Err(e) => Err(SiftError::SourceRead {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
}

static HOOK_LOCK: Mutex<()> = Mutex::new(());

/// Run `extract`, turning a panic into [`SiftError::SourceRead`].
///
/// pdf-extract panics on some malformed files. The process panic hook is
/// swapped for a silent one for the duration, so an installed crash reporter
/// does not fire for a document that is merely skipped.
fn extract_quietly<T>(
    path: &Path,
    extract: impl FnOnce() -> T + UnwindSafe,
) -> Result<T, SiftError> {
    let _guard = HOOK_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let outcome = panic::catch_unwind(extract);
    panic::set_hook(previous);

    outcome.map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown cause".into());
        SiftError::SourceRead {
            path: path.to_path_buf(),
            reason: format!("extractor panicked: {message}"),
        }
    })
}
