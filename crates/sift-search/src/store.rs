//! SQLite-backed vector store.
//!
//! Records live in a single SQLite file inside the store directory, with
//! embeddings stored as little-endian f32 BLOBs. Nearest-neighbour queries
//! scan the collection and rank by the collection's distance space.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sift_core::{ChunkMetadata, DistanceSpace, IndexedRecord, SiftError};
use tracing::debug;

/// File name of the database inside the store directory.
pub const STORE_FILE: &str = "store.sqlite3";

/// Which optional fields a query should return.
///
/// # Examples
///
/// ```
/// use sift_search::store::Include;
///
/// let include = Include::all();
/// assert!(include.documents && include.metadatas && include.embeddings);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Include {
    /// Return the stored chunk text.
    pub documents: bool,
    /// Return the stored metadata.
    pub metadatas: bool,
    /// Return the stored vector.
    pub embeddings: bool,
}

impl Include {
    /// Request every optional field.
    pub fn all() -> Self {
        Self {
            documents: true,
            metadatas: true,
            embeddings: true,
        }
    }
}

/// A nearest-neighbour candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    /// Record id.
    pub id: String,
    /// Distance in the collection's space; lower is closer.
    pub distance: f64,
    /// Chunk text, if requested.
    pub document: Option<String>,
    /// Metadata, if requested.
    pub metadata: Option<ChunkMetadata>,
    /// Stored vector, if requested.
    pub embedding: Option<Vec<f32>>,
}

/// Store statistics.
///
/// # Examples
///
/// ```
/// use sift_search::store::StoreStats;
///
/// let stats = StoreStats { collections: 1, records: 42, size_bytes: 8192 };
/// assert_eq!(stats.records, 42);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Number of collections.
    pub collections: usize,
    /// Number of records across all collections.
    pub records: usize,
    /// Database size in bytes.
    pub size_bytes: u64,
}

/// A persistent vector store.
///
/// # Examples
///
/// ```
/// use sift_core::DistanceSpace;
/// use sift_search::store::VectorStore;
///
/// let store = VectorStore::in_memory().unwrap();
/// let collection = store.get_or_create_collection("codebase", DistanceSpace::L2).unwrap();
/// assert_eq!(collection.count().unwrap(), 0);
/// ```
pub struct VectorStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl VectorStore {
    /// Delete everything at `dir`, recreate it empty and open a fresh store there.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Database`] if the directory cannot be removed,
    /// recreated or opened.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_search::store::VectorStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store_dir = dir.path().join(".sift");
    /// std::fs::create_dir_all(&store_dir).unwrap();
    /// std::fs::write(store_dir.join("stale"), "old").unwrap();
    ///
    /// let _store = VectorStore::reset(&store_dir).unwrap();
    /// assert!(!store_dir.join("stale").exists());
    /// ```
    pub fn reset(dir: &Path) -> Result<Self, SiftError> {
        if dir.exists() {
            std::fs::remove_dir_all(dir).map_err(|e| {
                SiftError::Database(format!(
                    "failed to remove store directory {}: {e}",
                    dir.display()
                ))
            })?;
        }
        Self::open(dir)
    }

    /// Open or create the store in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Database`] if the database cannot be opened.
    pub fn open(dir: &Path) -> Result<Self, SiftError> {
        std::fs::create_dir_all(dir).map_err(|e| {
            SiftError::Database(format!("failed to create store directory: {e}"))
        })?;
        let path = dir.join(STORE_FILE);
        let conn = Connection::open(&path)
            .map_err(|e| SiftError::Database(format!("failed to open database: {e}")))?;

        let store = Self {
            conn,
            path: Some(path),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Database`] if schema creation fails.
    pub fn in_memory() -> Result<Self, SiftError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            SiftError::Database(format!("failed to create in-memory database: {e}"))
        })?;

        let store = Self { conn, path: None };
        store.init_schema()?;
        Ok(store)
    }

    /// Whether a store database exists in `dir`.
    pub fn exists(dir: &Path) -> bool {
        dir.join(STORE_FILE).is_file()
    }

    fn init_schema(&self) -> Result<(), SiftError> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS collections (
                    name TEXT PRIMARY KEY,
                    space TEXT NOT NULL,
                    dimension INTEGER
                );

                CREATE TABLE IF NOT EXISTS records (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    collection TEXT NOT NULL,
                    id TEXT NOT NULL,
                    document TEXT NOT NULL,
                    path TEXT NOT NULL,
                    chunk_index INTEGER NOT NULL,
                    embedding BLOB NOT NULL,
                    UNIQUE (collection, id),
                    FOREIGN KEY (collection) REFERENCES collections(name)
                );
                ",
            )
            .map_err(|e| SiftError::Database(format!("failed to create schema: {e}")))?;

        Ok(())
    }

    /// Open the named collection, creating it with `space` if it does not exist.
    ///
    /// An existing collection keeps the space it was created with.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Database`] on query failure or corrupted metadata.
    pub fn get_or_create_collection(
        &self,
        name: &str,
        space: DistanceSpace,
    ) -> Result<Collection<'_>, SiftError> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO collections (name, space) VALUES (?1, ?2)",
                params![name, space.to_string()],
            )
            .map_err(|e| SiftError::Database(format!("failed to create collection: {e}")))?;

        let stored: String = self
            .conn
            .query_row(
                "SELECT space FROM collections WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .map_err(|e| SiftError::Database(format!("failed to read collection: {e}")))?;
        let stored_space: DistanceSpace = stored.parse().map_err(|_| {
            SiftError::Database(format!("corrupted distance space for '{name}': '{stored}'"))
        })?;
        if stored_space != space {
            debug!(collection = name, requested = %space, stored = %stored_space, "keeping stored distance space");
        }

        Ok(Collection {
            conn: &self.conn,
            name: name.to_string(),
            space: stored_space,
        })
    }

    /// Open the named collection without creating it.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Database`] on query failure or corrupted metadata.
    pub fn collection(&self, name: &str) -> Result<Option<Collection<'_>>, SiftError> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT space FROM collections WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| SiftError::Database(format!("failed to read collection: {e}")))?;

        let Some(stored) = stored else {
            return Ok(None);
        };
        let space: DistanceSpace = stored.parse().map_err(|_| {
            SiftError::Database(format!("corrupted distance space for '{name}': '{stored}'"))
        })?;
        Ok(Some(Collection {
            conn: &self.conn,
            name: name.to_string(),
            space,
        }))
    }

    /// Store statistics.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Database`] on query failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_search::store::VectorStore;
    ///
    /// let store = VectorStore::in_memory().unwrap();
    /// let stats = store.stats().unwrap();
    /// assert_eq!(stats.collections, 0);
    /// assert_eq!(stats.records, 0);
    /// ```
    pub fn stats(&self) -> Result<StoreStats, SiftError> {
        let collections: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM collections", [], |row| row.get(0))
            .map_err(|e| SiftError::Database(format!("failed to count collections: {e}")))?;
        let records: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .map_err(|e| SiftError::Database(format!("failed to count records: {e}")))?;

        // For in-memory databases, page_count returns a small number
        let page_count: i64 = self
            .conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))
            .unwrap_or(0);
        let page_size: i64 = self
            .conn
            .query_row("PRAGMA page_size", [], |row| row.get(0))
            .unwrap_or(4096);

        Ok(StoreStats {
            collections: collections as usize,
            records: records as usize,
            size_bytes: (page_count * page_size) as u64,
        })
    }
}

/// A named set of records inside a [`VectorStore`].
#[derive(Debug)]
pub struct Collection<'a> {
    conn: &'a Connection,
    name: String,
    space: DistanceSpace,
}

impl Collection<'_> {
    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Distance space used to rank query candidates.
    pub fn space(&self) -> DistanceSpace {
        self.space
    }

    /// Vector length recorded on the first insert, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Database`] on query failure.
    pub fn dimension(&self) -> Result<Option<usize>, SiftError> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT dimension FROM collections WHERE name = ?1",
                params![self.name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| SiftError::Database(format!("failed to read dimension: {e}")))?
            .flatten();
        Ok(value.map(|d| d as usize))
    }

    /// Add records in one transaction. A record whose id already exists replaces it.
    ///
    /// The first insert records the collection's dimension; every later vector
    /// must have that length.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::DimensionMismatch`] for a vector of the wrong
    /// length (nothing from the batch is written), or [`SiftError::Database`]
    /// on insert failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use sift_core::{ChunkMetadata, DistanceSpace, IndexedRecord};
    /// use sift_search::store::VectorStore;
    ///
    /// let store = VectorStore::in_memory().unwrap();
    /// let collection = store.get_or_create_collection("codebase", DistanceSpace::L2).unwrap();
    /// collection.add(&[IndexedRecord {
    ///     id: "app.py-0".into(),
    ///     vector: vec![0.1, 0.2, 0.3],
    ///     document: "import os".into(),
    ///     metadata: ChunkMetadata { path: PathBuf::from("app.py"), chunk_index: 0 },
    /// }]).unwrap();
    /// assert_eq!(collection.count().unwrap(), 1);
    /// ```
    pub fn add(&self, records: &[IndexedRecord]) -> Result<(), SiftError> {
        let Some(first) = records.first() else {
            return Ok(());
        };

        let expected = match self.dimension()? {
            Some(d) => d,
            None => first.vector.len(),
        };
        if let Some(bad) = records.iter().find(|r| r.vector.len() != expected) {
            return Err(SiftError::DimensionMismatch {
                expected,
                actual: bad.vector.len(),
            });
        }

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| SiftError::Database(format!("failed to begin transaction: {e}")))?;

        tx.execute(
            "UPDATE collections SET dimension = ?1 WHERE name = ?2 AND dimension IS NULL",
            params![expected as i64, self.name],
        )
        .map_err(|e| SiftError::Database(format!("failed to record dimension: {e}")))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO records (collection, id, document, path, chunk_index, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT (collection, id) DO UPDATE SET
                        document = excluded.document,
                        path = excluded.path,
                        chunk_index = excluded.chunk_index,
                        embedding = excluded.embedding",
                )
                .map_err(|e| SiftError::Database(format!("failed to prepare insert: {e}")))?;

            for record in records {
                stmt.execute(params![
                    self.name,
                    record.id,
                    record.document,
                    record.metadata.path.to_string_lossy().to_string(),
                    record.metadata.chunk_index as i64,
                    floats_to_bytes(&record.vector),
                ])
                .map_err(|e| SiftError::Database(format!("failed to insert record: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| SiftError::Database(format!("failed to commit records: {e}")))?;
        Ok(())
    }

    /// Number of records in the collection.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Database`] on query failure.
    pub fn count(&self) -> Result<usize, SiftError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM records WHERE collection = ?1",
                params![self.name],
                |row| row.get(0),
            )
            .map_err(|e| SiftError::Database(format!("failed to count records: {e}")))?;
        Ok(count as usize)
    }

    /// Every record, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Database`] on query failure.
    pub fn get(&self) -> Result<Vec<IndexedRecord>, SiftError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, document, path, chunk_index, embedding
                 FROM records WHERE collection = ?1 ORDER BY seq",
            )
            .map_err(|e| SiftError::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map(params![self.name], |row| {
                let bytes: Vec<u8> = row.get(4)?;
                Ok(IndexedRecord {
                    id: row.get(0)?,
                    document: row.get(1)?,
                    metadata: ChunkMetadata {
                        path: PathBuf::from(row.get::<_, String>(2)?),
                        chunk_index: row.get::<_, i64>(3)? as usize,
                    },
                    vector: bytes_to_floats(&bytes),
                })
            })
            .map_err(|e| SiftError::Database(format!("failed to query records: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| SiftError::Database(format!("failed to read row: {e}")))?);
        }
        Ok(records)
    }

    /// The `k` records closest to `vector` in this collection's distance space,
    /// nearest first. Ties keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::DimensionMismatch`] if `vector` does not match the
    /// collection's dimension, or [`SiftError::Database`] on query failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use sift_core::{ChunkMetadata, DistanceSpace, IndexedRecord};
    /// use sift_search::store::{Include, VectorStore};
    ///
    /// let store = VectorStore::in_memory().unwrap();
    /// let collection = store.get_or_create_collection("docs", DistanceSpace::L2).unwrap();
    /// let record = |id: &str, vector: Vec<f32>| IndexedRecord {
    ///     id: id.into(),
    ///     vector,
    ///     document: id.into(),
    ///     metadata: ChunkMetadata { path: PathBuf::from("a.pdf"), chunk_index: 0 },
    /// };
    /// collection.add(&[record("far", vec![10.0, 0.0]), record("near", vec![1.0, 0.1])]).unwrap();
    ///
    /// let hits = collection.query(&[1.0, 0.0], 1, Include::default()).unwrap();
    /// assert_eq!(hits[0].id, "near");
    /// assert!(hits[0].embedding.is_none());
    /// ```
    pub fn query(
        &self,
        vector: &[f32],
        k: usize,
        include: Include,
    ) -> Result<Vec<QueryHit>, SiftError> {
        if let Some(expected) = self.dimension()? {
            if expected != vector.len() {
                return Err(SiftError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        let mut hits: Vec<QueryHit> = self
            .get()?
            .into_iter()
            .map(|record| QueryHit {
                distance: distance(self.space, vector, &record.vector),
                id: record.id,
                document: include.documents.then_some(record.document),
                metadata: include.metadatas.then_some(record.metadata),
                embedding: include.embeddings.then_some(record.vector),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }
}

/// Distance between `a` and `b` in `space`; lower means closer.
///
/// `l2` is the squared Euclidean distance, `cosine` is `1 - cos`, `ip` is
/// `1 - dot`.
pub fn distance(space: DistanceSpace, a: &[f32], b: &[f32]) -> f64 {
    let pairs = a.iter().zip(b).map(|(x, y)| (f64::from(*x), f64::from(*y)));
    match space {
        DistanceSpace::L2 => pairs.map(|(x, y)| (x - y) * (x - y)).sum(),
        DistanceSpace::Cosine => 1.0 - crate::similarity::cosine_similarity(a, b),
        DistanceSpace::InnerProduct => 1.0 - pairs.map(|(x, y)| x * y).sum::<f64>(),
    }
}

fn floats_to_bytes(floats: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(floats.len() * 4);
    for f in floats {
        bytes.extend_from_slice(&f.to_le_bytes());
    }
    bytes
}

fn bytes_to_floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, vector: Vec<f32>) -> IndexedRecord {
        IndexedRecord {
            id: id.into(),
            vector,
            document: format!("text of {id}"),
            metadata: ChunkMetadata {
                path: PathBuf::from("src/app.py"),
                chunk_index: 0,
            },
        }
    }

    #[test]
    fn add_and_get_preserve_insertion_order() {
        let store = VectorStore::in_memory().unwrap();
        let collection = store
            .get_or_create_collection("codebase", DistanceSpace::L2)
            .unwrap();
        collection
            .add(&[record("b", vec![0.0, 1.0]), record("a", vec![1.0, 0.0])])
            .unwrap();

        let ids: Vec<String> = collection.get().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(collection.dimension().unwrap(), Some(2));
    }

    #[test]
    fn duplicate_ids_replace_instead_of_growing() {
        let store = VectorStore::in_memory().unwrap();
        let collection = store
            .get_or_create_collection("codebase", DistanceSpace::L2)
            .unwrap();
        collection.add(&[record("x", vec![1.0])]).unwrap();
        let mut updated = record("x", vec![2.0]);
        updated.document = "new text".into();
        collection.add(&[updated]).unwrap();

        let records = collection.get().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].document, "new text");
        assert_eq!(records[0].vector, vec![2.0]);
    }

    #[test]
    fn mismatched_dimension_rejects_whole_batch() {
        let store = VectorStore::in_memory().unwrap();
        let collection = store
            .get_or_create_collection("codebase", DistanceSpace::L2)
            .unwrap();
        collection.add(&[record("a", vec![1.0, 0.0, 0.0])]).unwrap();

        let err = collection
            .add(&[record("b", vec![1.0, 0.0, 0.0]), record("c", vec![1.0])])
            .unwrap_err();
        assert!(matches!(
            err,
            SiftError::DimensionMismatch {
                expected: 3,
                actual: 1
            }
        ));
        assert_eq!(collection.count().unwrap(), 1);

        let err = collection.query(&[1.0, 0.0], 5, Include::all()).unwrap_err();
        assert!(matches!(err, SiftError::DimensionMismatch { .. }));
    }

    #[test]
    fn query_ranks_by_collection_space() {
        let store = VectorStore::in_memory().unwrap();
        let l2 = store.get_or_create_collection("l2", DistanceSpace::L2).unwrap();
        let cos = store
            .get_or_create_collection("cos", DistanceSpace::Cosine)
            .unwrap();
        let records = [record("long", vec![5.0, 0.0]), record("diag", vec![0.9, 0.9])];
        l2.add(&records).unwrap();
        cos.add(&records).unwrap();

        let by_l2 = l2.query(&[1.0, 0.0], 2, Include::default()).unwrap();
        assert_eq!(by_l2[0].id, "diag");
        let by_cos = cos.query(&[1.0, 0.0], 2, Include::default()).unwrap();
        assert_eq!(by_cos[0].id, "long");
    }

    #[test]
    fn query_returns_requested_fields_only() {
        let store = VectorStore::in_memory().unwrap();
        let collection = store
            .get_or_create_collection("codebase", DistanceSpace::L2)
            .unwrap();
        collection.add(&[record("a", vec![0.5, 0.5])]).unwrap();

        let include = Include {
            documents: true,
            metadatas: false,
            embeddings: true,
        };
        let hit = &collection.query(&[0.5, 0.5], 5, include).unwrap()[0];
        assert_eq!(hit.document.as_deref(), Some("text of a"));
        assert!(hit.metadata.is_none());
        assert_eq!(hit.embedding.as_deref(), Some(&[0.5f32, 0.5][..]));
        assert!(hit.distance.abs() < 1e-12);
    }

    #[test]
    fn collections_are_isolated() {
        let store = VectorStore::in_memory().unwrap();
        let one = store.get_or_create_collection("one", DistanceSpace::L2).unwrap();
        let two = store.get_or_create_collection("two", DistanceSpace::L2).unwrap();
        one.add(&[record("a", vec![1.0])]).unwrap();
        assert_eq!(one.count().unwrap(), 1);
        assert_eq!(two.count().unwrap(), 0);
        assert_eq!(store.stats().unwrap().collections, 2);
    }

    #[test]
    fn collection_lookup_does_not_create() {
        let store = VectorStore::in_memory().unwrap();
        assert!(store.collection("codebase").unwrap().is_none());
        assert_eq!(store.stats().unwrap().collections, 0);

        store
            .get_or_create_collection("codebase", DistanceSpace::Cosine)
            .unwrap();
        let found = store.collection("codebase").unwrap().unwrap();
        assert_eq!(found.space(), DistanceSpace::Cosine);
    }

    #[test]
    fn existing_collection_keeps_its_space() {
        let store = VectorStore::in_memory().unwrap();
        store
            .get_or_create_collection("codebase", DistanceSpace::InnerProduct)
            .unwrap();
        let reopened = store
            .get_or_create_collection("codebase", DistanceSpace::L2)
            .unwrap();
        assert_eq!(reopened.space(), DistanceSpace::InnerProduct);
    }

    #[test]
    fn store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = dir.path().join(".sift");
        {
            let store = VectorStore::open(&store_dir).unwrap();
            let collection = store
                .get_or_create_collection("codebase", DistanceSpace::L2)
                .unwrap();
            collection.add(&[record("a", vec![1.0, 2.0])]).unwrap();
        }
        assert!(VectorStore::exists(&store_dir));

        let store = VectorStore::open(&store_dir).unwrap();
        let collection = store
            .get_or_create_collection("codebase", DistanceSpace::L2)
            .unwrap();
        assert_eq!(collection.count().unwrap(), 1);

        let store = VectorStore::reset(&store_dir).unwrap();
        let collection = store
            .get_or_create_collection("codebase", DistanceSpace::L2)
            .unwrap();
        assert_eq!(collection.count().unwrap(), 0);
    }

    #[test]
    fn distances_match_their_definitions() {
        let a = [1.0f32, 2.0];
        let b = [3.0f32, 0.0];
        assert!((distance(DistanceSpace::L2, &a, &b) - 8.0).abs() < 1e-9);
        assert!((distance(DistanceSpace::InnerProduct, &a, &b) - (1.0 - 3.0)).abs() < 1e-9);
        assert!(distance(DistanceSpace::Cosine, &a, &a).abs() < 1e-9);
    }

    #[test]
    fn floats_bytes_roundtrip() {
        let original = vec![1.0f32, -2.5, 0.0, 3.25];
        assert_eq!(bytes_to_floats(&floats_to_bytes(&original)), original);
    }
}
