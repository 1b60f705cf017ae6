//! Query answering: approximate candidates from the store, exact cosine on top.

use std::path::PathBuf;

use sift_core::{ChunkMetadata, QueryResult, SiftError};
use tracing::debug;

use crate::embedding::Embedder;
use crate::similarity::{best_index, cosine_similarity};
use crate::store::{Collection, Include};

/// Number of candidates requested when the caller has no preference.
pub const DEFAULT_TOP_K: usize = 5;

/// Answers queries against one collection.
///
/// Holds only the collection handle and the embedder; each query is
/// independent.
///
/// # Examples
///
/// ```
/// use sift_core::{DistanceSpace, SiftError};
/// use sift_search::embedding::HashEmbedder;
/// use sift_search::retriever::Retriever;
/// use sift_search::store::VectorStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = VectorStore::in_memory().unwrap();
/// let collection = store.get_or_create_collection("codebase", DistanceSpace::L2).unwrap();
/// let retriever = Retriever::new(collection, HashEmbedder::new(16));
///
/// let err = retriever.submit_query("anything", 5).await.unwrap_err();
/// assert!(matches!(err, SiftError::EmptyCollection { .. }));
/// # }
/// ```
#[derive(Debug)]
pub struct Retriever<'a, E> {
    collection: Collection<'a>,
    embedder: E,
    sort_by_similarity: bool,
}

impl<'a, E: Embedder> Retriever<'a, E> {
    /// Create a retriever over `collection`, embedding queries with `embedder`.
    ///
    /// `embedder` must be the one the collection was indexed with.
    pub fn new(collection: Collection<'a>, embedder: E) -> Self {
        Self {
            collection,
            embedder,
            sort_by_similarity: false,
        }
    }

    /// Re-sort hits by exact similarity, highest first, instead of keeping the
    /// store's order.
    pub fn sort_by_similarity(mut self, sort: bool) -> Self {
        self.sort_by_similarity = sort;
        self
    }

    /// The collection being queried.
    pub fn collection(&self) -> &Collection<'a> {
        &self.collection
    }

    /// Answer `query` with up to `k` hits, each scored by exact cosine
    /// similarity. The highest-scoring hit (the first, on ties) is flagged
    /// [`QueryResult::is_best`].
    ///
    /// # Errors
    ///
    /// - [`SiftError::EmptyCollection`] if the collection holds no records;
    ///   the embedder is not called.
    /// - [`SiftError::NoMatches`] if the store returns no candidates.
    /// - [`SiftError::Embedding`], [`SiftError::DimensionMismatch`] or
    ///   [`SiftError::Database`] from the embedder or store.
    pub async fn submit_query(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<QueryResult>, SiftError> {
        if self.collection.count()? == 0 {
            return Err(SiftError::EmptyCollection {
                collection: self.collection.name().to_string(),
            });
        }

        let query_vector = self.embedder.embed(query).await?;
        let hits = self.collection.query(&query_vector, k, Include::all())?;
        if hits.is_empty() {
            return Err(SiftError::NoMatches);
        }

        let mut results: Vec<QueryResult> = hits
            .into_iter()
            .map(|hit| {
                let vector = hit.embedding.unwrap_or_default();
                QueryResult {
                    similarity: cosine_similarity(&query_vector, &vector),
                    distance: hit.distance,
                    id: hit.id,
                    document: hit.document.unwrap_or_default(),
                    metadata: hit.metadata.unwrap_or_else(|| ChunkMetadata {
                        path: PathBuf::new(),
                        chunk_index: 0,
                    }),
                    is_best: false,
                }
            })
            .collect();

        let scores: Vec<f64> = results.iter().map(|r| r.similarity).collect();
        if let Some(best) = best_index(&scores) {
            results[best].is_best = true;
            debug!(
                query,
                best = %results[best].id,
                similarity = results[best].similarity,
                "re-scored candidates"
            );
        }

        if self.sort_by_similarity {
            results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use sift_core::{DistanceSpace, IndexedRecord};

    use super::*;
    use crate::store::VectorStore;

    /// Returns a fixed vector and counts calls.
    struct FixedEmbedder {
        vector: Vec<f32>,
        calls: Cell<usize>,
    }

    impl FixedEmbedder {
        fn new(vector: Vec<f32>) -> Self {
            Self {
                vector,
                calls: Cell::new(0),
            }
        }
    }

    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, SiftError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.vector.clone())
        }
    }

    fn record(id: &str, vector: Vec<f32>) -> IndexedRecord {
        IndexedRecord {
            id: id.into(),
            vector,
            document: format!("doc {id}"),
            metadata: ChunkMetadata {
                path: PathBuf::from(format!("{id}.py")),
                chunk_index: 0,
            },
        }
    }

    fn seeded(store: &VectorStore) -> Collection<'_> {
        let collection = store
            .get_or_create_collection("codebase", DistanceSpace::L2)
            .unwrap();
        // L2 order for query [1, 0] is A, C, B; cosine prefers B.
        collection
            .add(&[
                record("A", vec![0.9, 0.9]),
                record("B", vec![5.0, 0.0]),
                record("C", vec![0.0, 1.0]),
            ])
            .unwrap();
        collection
    }

    #[tokio::test]
    async fn empty_collection_never_calls_embedder() {
        let store = VectorStore::in_memory().unwrap();
        let collection = store
            .get_or_create_collection("codebase", DistanceSpace::L2)
            .unwrap();
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);
        let retriever = Retriever::new(collection, &embedder);

        let err = retriever.submit_query("where is auth", 5).await.unwrap_err();
        assert!(matches!(err, SiftError::EmptyCollection { ref collection } if collection == "codebase"));
        assert_eq!(embedder.calls.get(), 0);
    }

    #[tokio::test]
    async fn three_records_with_k_five_returns_three_in_store_order() {
        let store = VectorStore::in_memory().unwrap();
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);
        let retriever = Retriever::new(seeded(&store), &embedder);

        let results = retriever.submit_query("q", 5).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C", "B"]);

        let best: Vec<&str> = results.iter().filter(|r| r.is_best).map(|r| r.id.as_str()).collect();
        assert_eq!(best, vec!["B"]);
        assert!((results[2].similarity - 1.0).abs() < 1e-6);
        assert!(results[1].similarity.abs() < 1e-6);
        assert_eq!(embedder.calls.get(), 1);
    }

    #[tokio::test]
    async fn sorting_reorders_but_keeps_the_same_best() {
        let store = VectorStore::in_memory().unwrap();
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);
        let retriever = Retriever::new(seeded(&store), &embedder).sort_by_similarity(true);

        let results = retriever.submit_query("q", 5).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
        assert!(results[0].is_best);
        assert!(results[1..].iter().all(|r| !r.is_best));
    }

    #[tokio::test]
    async fn k_limits_candidates_before_rescoring() {
        let store = VectorStore::in_memory().unwrap();
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);
        let retriever = Retriever::new(seeded(&store), &embedder);

        let results = retriever.submit_query("q", 2).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert!(results[0].is_best);
    }

    #[tokio::test]
    async fn zero_k_on_populated_collection_is_no_matches() {
        let store = VectorStore::in_memory().unwrap();
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);
        let retriever = Retriever::new(seeded(&store), &embedder);

        let err = retriever.submit_query("q", 0).await.unwrap_err();
        assert!(matches!(err, SiftError::NoMatches));
    }

    #[tokio::test]
    async fn ties_flag_the_first_hit() {
        let store = VectorStore::in_memory().unwrap();
        let collection = store
            .get_or_create_collection("codebase", DistanceSpace::L2)
            .unwrap();
        collection
            .add(&[record("near", vec![1.0, 0.0]), record("far", vec![3.0, 0.0])])
            .unwrap();
        let retriever = Retriever::new(collection, FixedEmbedder::new(vec![1.0, 0.0]));

        let results = retriever.submit_query("q", 5).await.unwrap();
        assert_eq!(results[0].id, "near");
        assert!(results[0].is_best);
        assert!(!results[1].is_best);
        assert!(results[1].distance > results[0].distance);
    }

    #[tokio::test]
    async fn results_carry_document_and_metadata() {
        let store = VectorStore::in_memory().unwrap();
        let retriever = Retriever::new(seeded(&store), FixedEmbedder::new(vec![0.0, 1.0]));

        let results = retriever.submit_query("q", 1).await.unwrap();
        assert_eq!(results[0].id, "C");
        assert_eq!(results[0].document, "doc C");
        assert_eq!(results[0].metadata.path, PathBuf::from("C.py"));
    }
}
