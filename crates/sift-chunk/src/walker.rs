use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use sift_core::{IndexConfig, SiftError};

/// Number of bytes to check for binary detection.
const BINARY_CHECK_SIZE: usize = 8192;

/// How a discovered document is turned into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Plain-text source file, chunked by token budget.
    Source,
    /// Page-oriented document, one chunk per line.
    Pages,
}

/// A document found during discovery.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use sift_chunk::walker::{Document, DocumentKind};
///
/// let doc = Document {
///     path: PathBuf::from("src/app.py"),
///     full_path: PathBuf::from("/repo/src/app.py"),
///     kind: DocumentKind::Source,
/// };
/// assert_eq!(doc.kind, DocumentKind::Source);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the walk root; used as the document identifier.
    pub path: PathBuf,
    /// Path used to open the file.
    pub full_path: PathBuf,
    /// Chunking strategy.
    pub kind: DocumentKind,
}

/// Decides which directories the walk descends into.
///
/// # Examples
///
/// ```
/// use sift_chunk::walker::DirFilter;
///
/// let filter = DirFilter::default();
/// assert!(filter.should_descend("src"));
/// assert!(!filter.should_descend("node_modules"));
/// assert!(!filter.should_descend(".cache"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirFilter {
    skip: BTreeSet<String>,
    reserved_prefix: String,
}

impl DirFilter {
    /// Build a filter from excluded names and a reserved prefix. An empty
    /// prefix prunes nothing by prefix.
    pub fn new<I, S>(skip: I, reserved_prefix: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            skip: skip.into_iter().map(Into::into).collect(),
            reserved_prefix: reserved_prefix.into(),
        }
    }

    /// Whether a directory with this name should be walked.
    pub fn should_descend(&self, name: &str) -> bool {
        if self.skip.contains(name) {
            return false;
        }
        self.reserved_prefix.is_empty() || !name.starts_with(&self.reserved_prefix)
    }
}

impl Default for DirFilter {
    fn default() -> Self {
        let config = IndexConfig::default();
        Self::new(config.skip_dirs, config.reserved_prefix)
    }
}

/// Options controlling document discovery.
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Directory pruning predicate.
    pub filter: DirFilter,
    /// Source extensions (without the dot), matched case-insensitively.
    pub extensions: Vec<String>,
    /// Whether `.pdf` files are discovered.
    pub include_pdfs: bool,
    /// Honour `.gitignore` files.
    pub respect_gitignore: bool,
    /// Source files larger than this are skipped.
    pub max_file_bytes: u64,
}

impl DiscoverOptions {
    /// Build options from the `[index]` config section.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_core::IndexConfig;
    /// use sift_chunk::walker::DiscoverOptions;
    ///
    /// let options = DiscoverOptions::from_config(&IndexConfig::default());
    /// assert!(options.include_pdfs);
    /// assert!(!options.filter.should_descend(".git"));
    /// ```
    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            filter: DirFilter::new(config.skip_dirs.iter().cloned(), &config.reserved_prefix),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            include_pdfs: config.include_pdfs,
            respect_gitignore: config.respect_gitignore,
            max_file_bytes: config.max_file_bytes,
        }
    }

    fn classify(&self, path: &Path) -> Option<DocumentKind> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if self.include_pdfs && ext == "pdf" {
            return Some(DocumentKind::Pages);
        }
        self.extensions
            .iter()
            .any(|e| *e == ext)
            .then_some(DocumentKind::Source)
    }
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self::from_config(&IndexConfig::default())
    }
}

/// Recursively discover indexable documents under `root`.
///
/// Directories rejected by [`DirFilter::should_descend`] are pruned before
/// descending. Source files that are oversized or look binary are skipped.
/// Results are sorted by path so repeated runs see the same order.
///
/// # Errors
///
/// Returns [`SiftError::FileNotFound`] if `root` does not exist.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use sift_chunk::walker::{discover, DiscoverOptions};
///
/// let docs = discover(Path::new("."), &DiscoverOptions::default()).unwrap();
/// for doc in &docs {
///     println!("{} ({:?})", doc.path.display(), doc.kind);
/// }
/// ```
pub fn discover(root: &Path, options: &DiscoverOptions) -> Result<Vec<Document>, SiftError> {
    if !root.exists() {
        return Err(SiftError::FileNotFound(root.to_path_buf()));
    }

    let filter = options.filter.clone();
    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .git_ignore(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .require_git(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            let descend = filter.should_descend(&name);
            if !descend {
                tracing::debug!(dir = %entry.path().display(), "pruned directory");
            }
            descend
        });

    let mut documents = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "walk error");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let full_path = entry.path();
        let Some(kind) = options.classify(full_path) else {
            continue;
        };

        if kind == DocumentKind::Source {
            if let Ok(meta) = entry.metadata() {
                if meta.len() > options.max_file_bytes {
                    tracing::debug!(path = %full_path.display(), bytes = meta.len(), "skipping oversized file");
                    continue;
                }
            }
            if looks_binary(full_path) {
                tracing::debug!(path = %full_path.display(), "skipping binary file");
                continue;
            }
        }

        let path = full_path
            .strip_prefix(root)
            .unwrap_or(full_path)
            .to_path_buf();
        documents.push(Document {
            path,
            full_path: full_path.to_path_buf(),
            kind,
        });
    }

    documents.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(documents)
}

/// A NUL byte in the first 8 KiB marks a file as binary. Unreadable files are
/// not binary; reading them fails later with a proper error.
fn looks_binary(path: &Path) -> bool {
    let Ok(file) = std::fs::File::open(path) else {
        return false;
    };
    let mut head = Vec::with_capacity(BINARY_CHECK_SIZE);
    if file
        .take(BINARY_CHECK_SIZE as u64)
        .read_to_end(&mut head)
        .is_err()
    {
        return false;
    }
    head.contains(&0)
}
