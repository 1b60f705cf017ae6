//! Destructive index rebuild: discover, chunk, embed, store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sift_chunk::{
    discover, load_chunks, CharEstimate, DiscoverOptions, Document, PageSource, PdfPages,
    TokenCounter,
};
use sift_core::{Chunk, DistanceSpace, IndexConfig, IndexedRecord, SiftError};
use tracing::{info, warn};

use crate::embedding::Embedder;
use crate::store::{Collection, VectorStore};

/// Summary of an indexing run.
///
/// # Examples
///
/// ```
/// use sift_search::builder::IndexReport;
///
/// let report = IndexReport::default();
/// assert_eq!(report.documents_indexed, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    /// Documents chunked, embedded and stored.
    pub documents_indexed: usize,
    /// Documents skipped after a read or embedding failure.
    pub documents_skipped: usize,
    /// Records written to the collection.
    pub records_written: usize,
}

/// Rebuilds a collection from a directory tree.
///
/// The embedder, token counter and page extractor are injected; the store is
/// either reset by [`IndexBuilder::run`] or passed in to
/// [`IndexBuilder::index_into`].
///
/// # Examples
///
/// ```
/// use sift_core::{DistanceSpace, IndexConfig};
/// use sift_search::builder::IndexBuilder;
/// use sift_search::embedding::HashEmbedder;
/// use sift_search::store::VectorStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("app.py"), "import os\n\nprint(os.name)\n").unwrap();
///
/// let builder = IndexBuilder::new(HashEmbedder::new(32), IndexConfig::default());
/// let store = VectorStore::in_memory().unwrap();
/// let report = builder.index_into(&store, dir.path()).await.unwrap();
/// assert_eq!(report.documents_indexed, 1);
/// assert_eq!(report.records_written, 2);
/// # }
/// ```
#[derive(Debug)]
pub struct IndexBuilder<E, T = CharEstimate, P = PdfPages> {
    embedder: E,
    counter: T,
    pages: P,
    config: IndexConfig,
    space: DistanceSpace,
}

impl<E: Embedder> IndexBuilder<E> {
    /// Create a builder with the default token estimate and PDF extractor.
    pub fn new(embedder: E, config: IndexConfig) -> Self {
        Self {
            embedder,
            counter: CharEstimate::default(),
            pages: PdfPages,
            config,
            space: DistanceSpace::default(),
        }
    }
}

impl<E, T, P> IndexBuilder<E, T, P>
where
    E: Embedder,
    T: TokenCounter,
    P: PageSource,
{
    /// Replace the token counter.
    pub fn with_counter<U: TokenCounter>(self, counter: U) -> IndexBuilder<E, U, P> {
        IndexBuilder {
            embedder: self.embedder,
            counter,
            pages: self.pages,
            config: self.config,
            space: self.space,
        }
    }

    /// Replace the page extractor.
    pub fn with_pages<Q: PageSource>(self, pages: Q) -> IndexBuilder<E, T, Q> {
        IndexBuilder {
            embedder: self.embedder,
            counter: self.counter,
            pages,
            config: self.config,
            space: self.space,
        }
    }

    /// Distance space for a newly created collection.
    pub fn with_space(mut self, space: DistanceSpace) -> Self {
        self.space = space;
        self
    }

    /// The embedder used for documents.
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Wipe `config.store_path`, then index `root` into a fresh store there.
    ///
    /// `root` is walked before anything is deleted, so a missing tree leaves
    /// the previous index untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::FileNotFound`] if `root` does not exist and
    /// [`SiftError::Config`] if `store_path` is `root` or an ancestor of it.
    /// Also fails if the store cannot be reset or a store write fails.
    /// Per-document read and embedding failures are logged and skipped.
    pub async fn run(&self, root: &Path) -> Result<IndexReport, SiftError> {
        self.run_with_progress(root, |_| {}).await
    }

    /// Like [`IndexBuilder::run`], calling `progress` before each document.
    ///
    /// # Errors
    ///
    /// See [`IndexBuilder::run`].
    pub async fn run_with_progress<F>(
        &self,
        root: &Path,
        progress: F,
    ) -> Result<IndexReport, SiftError>
    where
        F: FnMut(&Document),
    {
        let documents = discover(root, &DiscoverOptions::from_config(&self.config))?;
        guard_store_path(&self.config.store_path, root)?;

        let store = VectorStore::reset(&self.config.store_path)?;
        self.index_documents(&store, &documents, progress).await
    }

    /// Index `root` into the configured collection of an existing store.
    ///
    /// # Errors
    ///
    /// See [`IndexBuilder::run`].
    pub async fn index_into(
        &self,
        store: &VectorStore,
        root: &Path,
    ) -> Result<IndexReport, SiftError> {
        let documents = discover(root, &DiscoverOptions::from_config(&self.config))?;
        self.index_documents(store, &documents, |_| {}).await
    }

    async fn index_documents<F>(
        &self,
        store: &VectorStore,
        documents: &[Document],
        mut progress: F,
    ) -> Result<IndexReport, SiftError>
    where
        F: FnMut(&Document),
    {
        let collection = store.get_or_create_collection(&self.config.collection, self.space)?;

        let mut report = IndexReport::default();
        for doc in documents {
            progress(doc);

            let loaded = load_chunks(doc, self.config.max_tokens, &self.pages, &self.counter);
            let chunks = match loaded {
                Ok(chunks) => chunks,
                Err(e) => {
                    warn!(path = %doc.path.display(), error = %e, "skipping unreadable document");
                    report.documents_skipped += 1;
                    continue;
                }
            };

            match self.store_chunks(&collection, &chunks).await {
                Ok(written) => {
                    info!(path = %doc.path.display(), chunks = written, "indexed");
                    report.documents_indexed += 1;
                    report.records_written += written;
                }
                Err(SiftError::Embedding(reason)) => {
                    warn!(
                        path = %doc.path.display(),
                        error = %reason,
                        "skipping document after embedding failure"
                    );
                    report.documents_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            indexed = report.documents_indexed,
            skipped = report.documents_skipped,
            records = report.records_written,
            "index rebuilt"
        );
        Ok(report)
    }

    async fn store_chunks(
        &self,
        collection: &Collection<'_>,
        chunks: &[Chunk],
    ) -> Result<usize, SiftError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(SiftError::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let records: Vec<IndexedRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedRecord::from_chunk(chunk, vector))
            .collect();
        collection.add(&records)?;
        Ok(records.len())
    }
}

/// Refuse a reset that would delete `root` itself: the store directory must
/// not be the indexed tree or one of its ancestors.
fn guard_store_path(store_path: &Path, root: &Path) -> Result<(), SiftError> {
    let store = resolve(store_path)?;
    let root = resolve(root)?;
    if root.starts_with(&store) {
        return Err(SiftError::Config(format!(
            "index.store_path {} contains the indexed tree {}; refusing to delete it",
            store_path.display(),
            root.display()
        )));
    }
    Ok(())
}

/// Absolute form of `path` with symlinks resolved as far as it exists.
fn resolve(path: &Path) -> Result<PathBuf, SiftError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(mut resolved) = existing.canonicalize() {
            resolved.extend(missing.iter().rev());
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return Ok(absolute.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::embedding::HashEmbedder;

    struct FailingOn {
        inner: HashEmbedder,
        poison: &'static str,
    }

    impl Embedder for FailingOn {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, SiftError> {
            if text.contains(self.poison) {
                return Err(SiftError::Embedding("model rejected input".into()));
            }
            Ok(self.inner.vector(text))
        }
    }

    struct NoPages(Cell<usize>);

    impl PageSource for NoPages {
        fn pages(&self, path: &Path) -> Result<Vec<String>, SiftError> {
            self.0.set(self.0.get() + 1);
            Err(SiftError::SourceRead {
                path: path.to_path_buf(),
                reason: "encrypted".into(),
            })
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn config_for(store: &Path) -> IndexConfig {
        IndexConfig {
            store_path: store.to_path_buf(),
            ..IndexConfig::default()
        }
    }

    #[tokio::test]
    async fn records_use_path_and_index_ids() {
        let tree = tempfile::tempdir().unwrap();
        write(tree.path(), "pkg/util.py", "def a():\n    pass\n\ndef b():\n    pass\n");
        write(tree.path(), "main.py", "print('hi')\n");

        let store = VectorStore::in_memory().unwrap();
        let builder = IndexBuilder::new(HashEmbedder::new(16), IndexConfig::default());
        let report = builder.index_into(&store, tree.path()).await.unwrap();
        assert_eq!(report.documents_indexed, 2);
        assert_eq!(report.records_written, 3);

        let collection = store
            .get_or_create_collection("codebase", DistanceSpace::L2)
            .unwrap();
        let ids: Vec<String> = collection.get().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["main.py-0", "pkg/util.py-0", "pkg/util.py-1"]);
        let first = &collection.get().unwrap()[1];
        assert_eq!(first.metadata.path, PathBuf::from("pkg/util.py"));
        assert_eq!(first.document, "def a():\n    pass");
    }

    #[tokio::test]
    async fn rerun_is_a_destructive_rebuild_with_stable_ids() {
        let tree = tempfile::tempdir().unwrap();
        let state = tempfile::tempdir().unwrap();
        write(tree.path(), "a.py", "x = 1\n\ny = 2\n");
        write(tree.path(), "b.rs", "fn main() {}\n");

        let config = config_for(&state.path().join("store"));
        let builder = IndexBuilder::new(HashEmbedder::new(16), config);
        let first = builder.run(tree.path()).await.unwrap();

        let ids = |dir: &Path| {
            let store = VectorStore::open(dir).unwrap();
            let collection = store
                .get_or_create_collection("codebase", DistanceSpace::L2)
                .unwrap();
            collection
                .get()
                .unwrap()
                .into_iter()
                .map(|r| r.id)
                .collect::<Vec<_>>()
        };
        let before = ids(&state.path().join("store"));

        let second = builder.run(tree.path()).await.unwrap();
        let after = ids(&state.path().join("store"));

        assert_eq!(first, second);
        assert_eq!(before, after);
        assert_eq!(after.len(), 3);
    }

    #[tokio::test]
    async fn unreadable_pdf_is_skipped_and_run_continues() {
        let tree = tempfile::tempdir().unwrap();
        write(tree.path(), "manual.pdf", "%PDF-broken");
        write(tree.path(), "z.py", "ok = True\n");

        let pages = NoPages(Cell::new(0));
        let builder =
            IndexBuilder::new(HashEmbedder::new(8), IndexConfig::default()).with_pages(pages);
        let store = VectorStore::in_memory().unwrap();
        let report = builder.index_into(&store, tree.path()).await.unwrap();

        assert_eq!(report.documents_skipped, 1);
        assert_eq!(report.documents_indexed, 1);
        assert_eq!(builder.pages.0.get(), 1);
    }

    #[tokio::test]
    async fn embedding_failure_skips_only_that_document() {
        let tree = tempfile::tempdir().unwrap();
        write(tree.path(), "bad.py", "POISON = 1\n");
        write(tree.path(), "good.py", "fine = 1\n");

        let embedder = FailingOn {
            inner: HashEmbedder::new(8),
            poison: "POISON",
        };
        let builder = IndexBuilder::new(embedder, IndexConfig::default());
        let store = VectorStore::in_memory().unwrap();
        let report = builder.index_into(&store, tree.path()).await.unwrap();

        assert_eq!(report.documents_skipped, 1);
        assert_eq!(report.documents_indexed, 1);
        assert_eq!(report.records_written, 1);
    }

    #[tokio::test]
    async fn empty_documents_count_as_indexed() {
        let tree = tempfile::tempdir().unwrap();
        write(tree.path(), "empty.py", "\n\n\n");

        let builder = IndexBuilder::new(HashEmbedder::new(8), IndexConfig::default());
        let store = VectorStore::in_memory().unwrap();
        let report = builder.index_into(&store, tree.path()).await.unwrap();
        assert_eq!(report.documents_indexed, 1);
        assert_eq!(report.records_written, 0);
    }

    #[tokio::test]
    async fn store_write_failure_aborts_the_run() {
        let tree = tempfile::tempdir().unwrap();
        write(tree.path(), "a.py", "value = 1\n");

        let store = VectorStore::in_memory().unwrap();
        let collection = store
            .get_or_create_collection("codebase", DistanceSpace::L2)
            .unwrap();
        collection
            .add(&[IndexedRecord {
                id: "seed".into(),
                vector: vec![1.0, 0.0],
                document: "seed".into(),
                metadata: sift_core::ChunkMetadata {
                    path: PathBuf::from("seed.py"),
                    chunk_index: 0,
                },
            }])
            .unwrap();

        let builder = IndexBuilder::new(HashEmbedder::new(8), IndexConfig::default());
        let err = builder.index_into(&store, tree.path()).await.unwrap_err();
        assert!(matches!(err, SiftError::DimensionMismatch { expected: 2, actual: 8 }));
    }

    #[tokio::test]
    async fn store_path_equal_to_root_is_refused() {
        let tree = tempfile::tempdir().unwrap();
        write(tree.path(), "keep.py", "important = True\n");

        let builder = IndexBuilder::new(HashEmbedder::new(8), config_for(tree.path()));
        let err = builder.run(tree.path()).await.unwrap_err();
        assert!(matches!(err, SiftError::Config(ref msg) if msg.contains("store_path")));
        assert!(tree.path().join("keep.py").exists());
    }

    #[tokio::test]
    async fn store_path_above_root_is_refused() {
        let outer = tempfile::tempdir().unwrap();
        write(outer.path(), "project/src/main.py", "run()\n");
        let root = outer.path().join("project/src");

        let builder = IndexBuilder::new(HashEmbedder::new(8), config_for(outer.path()));
        let err = builder.run(&root).await.unwrap_err();
        assert!(matches!(err, SiftError::Config(_)));
        assert!(root.join("main.py").exists());
    }

    #[tokio::test]
    async fn store_inside_root_is_allowed() {
        let tree = tempfile::tempdir().unwrap();
        write(tree.path(), "a.py", "a = 1\n");

        let builder =
            IndexBuilder::new(HashEmbedder::new(8), config_for(&tree.path().join(".sift")));
        let report = builder.run(tree.path()).await.unwrap();
        assert_eq!(report.records_written, 1);
        assert!(tree.path().join("a.py").exists());
    }

    #[tokio::test]
    async fn missing_root_leaves_previous_index_intact() {
        let tree = tempfile::tempdir().unwrap();
        let state = tempfile::tempdir().unwrap();
        write(tree.path(), "a.py", "a = 1\n");

        let store_dir = state.path().join("store");
        let builder = IndexBuilder::new(HashEmbedder::new(8), config_for(&store_dir));
        builder.run(tree.path()).await.unwrap();

        let err = builder.run(&tree.path().join("typo")).await.unwrap_err();
        assert!(matches!(err, SiftError::FileNotFound(_)));

        let store = VectorStore::open(&store_dir).unwrap();
        let collection = store.collection("codebase").unwrap().unwrap();
        assert_eq!(collection.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn progress_sees_every_document() {
        let tree = tempfile::tempdir().unwrap();
        let state = tempfile::tempdir().unwrap();
        write(tree.path(), "a.py", "a = 1\n");
        write(tree.path(), "b.py", "b = 2\n");
        write(tree.path(), "__pycache__/c.py", "c = 3\n");

        let config = config_for(&state.path().join("s"));
        let builder = IndexBuilder::new(HashEmbedder::new(8), config);
        let mut seen = Vec::new();
        builder
            .run_with_progress(tree.path(), |doc| seen.push(doc.path.clone()))
            .await
            .unwrap();
        assert_eq!(seen, vec![PathBuf::from("a.py"), PathBuf::from("b.py")]);
    }
}
