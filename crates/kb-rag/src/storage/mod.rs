//! SQLite-backed vector store
//!
//! Chunks and their embeddings live in a single database file so the corpus
//! survives restarts. Similarity search is a full scan with cosine distance,
//! which is adequate at knowledge-base scale (thousands of chunks, not
//! millions).

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::{Error, Result};
use crate::types::Chunk;

/// A retrieved chunk with its cosine distance from the query vector
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Durable chunk-and-embedding store scoped to one collection
#[derive(Debug)]
pub struct VectorStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
    dimensions: usize,
}

impl VectorStore {
    /// Create or open the store at the given path.
    ///
    /// If the collection already exists its recorded dimensionality must
    /// match; reopening with a different embedding size is a config error.
    pub fn open<P: AsRef<Path>>(path: P, collection: &str, dimensions: usize) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path.as_ref())
            .map_err(|e| Error::store(format!("failed to open database: {e}")))?;
        let store = Self::init(conn, collection, dimensions)?;
        info!(
            path = %path.as_ref().display(),
            collection,
            dimensions,
            chunks = store.len()?,
            "opened vector store"
        );
        Ok(store)
    }

    /// Create an in-memory store. Used by tests and throwaway pipelines.
    pub fn open_in_memory(collection: &str, dimensions: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store(format!("failed to open in-memory database: {e}")))?;
        Self::init(conn, collection, dimensions)
    }

    fn init(conn: Connection, collection: &str, dimensions: usize) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimensions INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                content TEXT NOT NULL,
                source TEXT NOT NULL,
                ingest_order INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(collection, source);
            "#,
        )
        .map_err(|e| Error::store(format!("failed to run migrations: {e}")))?;

        let existing: Option<usize> = conn
            .query_row(
                "SELECT dimensions FROM collections WHERE name = ?1",
                params![collection],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::store(e.to_string()))?;

        match existing {
            Some(recorded) if recorded != dimensions => {
                return Err(Error::Config(format!(
                    "collection '{collection}' was created with {recorded} dimensions, \
                     configured for {dimensions}"
                )));
            }
            Some(_) => {}
            None => {
                conn.execute(
                    "INSERT INTO collections (name, dimensions) VALUES (?1, ?2)",
                    params![collection, dimensions],
                )
                .map_err(|e| Error::store(e.to_string()))?;
            }
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
            dimensions,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Insert chunks with their embeddings, replacing any existing chunk
    /// with the same id. All rows land in one transaction.
    pub fn add(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::store(format!(
                "chunk/embedding count mismatch: {} vs {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        for embedding in embeddings {
            if embedding.len() != self.dimensions {
                return Err(Error::DimensionMismatch {
                    got: embedding.len(),
                    expected: self.dimensions,
                });
            }
        }

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::store(e.to_string()))?;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            tx.execute(
                r#"
                INSERT INTO chunks (collection, id, content, source, ingest_order, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT (collection, id) DO UPDATE SET
                    content = excluded.content,
                    source = excluded.source,
                    ingest_order = excluded.ingest_order,
                    embedding = excluded.embedding
                "#,
                params![
                    self.collection,
                    chunk.id,
                    chunk.text,
                    chunk.source,
                    chunk.ingest_order,
                    embedding_to_blob(embedding),
                ],
            )
            .map_err(|e| Error::store(e.to_string()))?;
        }
        tx.commit().map_err(|e| Error::store(e.to_string()))?;
        Ok(())
    }

    /// Return the `k` chunks nearest to `query` by cosine distance,
    /// ascending. Ties break by insertion order so results are stable.
    pub fn query(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if query.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                got: query.len(),
                expected: self.dimensions,
            });
        }

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, content, source, ingest_order, embedding FROM chunks
                 WHERE collection = ?1 ORDER BY rowid",
            )
            .map_err(|e| Error::store(e.to_string()))?;

        let rows = stmt
            .query_map(params![self.collection], |row| {
                Ok((
                    Chunk {
                        id: row.get(0)?,
                        text: row.get(1)?,
                        source: row.get(2)?,
                        ingest_order: row.get(3)?,
                    },
                    row.get::<_, Vec<u8>>(4)?,
                ))
            })
            .map_err(|e| Error::store(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            let (chunk, blob) = row.map_err(|e| Error::store(e.to_string()))?;
            let embedding = blob_to_embedding(&blob)?;
            let distance = cosine_distance(query, &embedding);
            results.push(SearchResult { chunk, distance });
        }

        // Stable sort preserves insertion order among equal distances.
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(k);
        Ok(results)
    }

    /// All chunk texts in insertion order. Used for the corpus export.
    pub fn all_texts(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT content FROM chunks WHERE collection = ?1 ORDER BY rowid")
            .map_err(|e| Error::store(e.to_string()))?;
        let rows = stmt
            .query_map(params![self.collection], |row| row.get(0))
            .map_err(|e| Error::store(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(|e| Error::store(e.to_string()))
    }

    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )
        .map_err(|e| Error::store(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_embedding(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(Error::store("corrupt embedding blob".to_string()));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine distance in [0, 2]. Zero-norm vectors are treated as maximally
/// dissimilar rather than dividing by zero.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VectorStore {
        VectorStore::open_in_memory("test", 3).unwrap()
    }

    fn chunk(source: &str, order: u32, text: &str) -> Chunk {
        Chunk::new(source, order, text.to_string())
    }

    #[test]
    fn stored_chunk_is_its_own_nearest_neighbor() {
        let store = store();
        let chunks = vec![
            chunk("a.txt", 0, "alpha"),
            chunk("a.txt", 1, "beta"),
            chunk("a.txt", 2, "gamma"),
        ];
        let embeddings = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        store.add(&chunks, &embeddings).unwrap();

        let results = store.query(&[0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].chunk.text, "beta");
        assert!(results[0].distance.abs() < 1e-6);
    }

    #[test]
    fn query_returns_at_most_k_sorted_ascending() {
        let store = store();
        let chunks: Vec<Chunk> = (0..10)
            .map(|i| chunk("doc.txt", i, &format!("chunk {i}")))
            .collect();
        let embeddings: Vec<Vec<f32>> = (0..10)
            .map(|i| vec![1.0, i as f32 * 0.1, 0.0])
            .collect();
        store.add(&chunks, &embeddings).unwrap();

        let results = store.query(&[1.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(results.len(), 5);
        for pair in results.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn fewer_chunks_than_k_returns_all() {
        let store = store();
        store
            .add(&[chunk("a.txt", 0, "only")], &[vec![1.0, 0.0, 0.0]])
            .unwrap();
        let results = store.query(&[1.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn empty_store_returns_no_results() {
        let store = store();
        assert!(store.is_empty().unwrap());
        assert!(store.query(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn same_id_upserts_instead_of_duplicating() {
        let store = store();
        store
            .add(&[chunk("a.txt", 0, "old text")], &[vec![1.0, 0.0, 0.0]])
            .unwrap();
        store
            .add(&[chunk("a.txt", 0, "new text")], &[vec![0.0, 1.0, 0.0]])
            .unwrap();

        assert_eq!(store.len().unwrap(), 1);
        let results = store.query(&[0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].chunk.text, "new text");
    }

    #[test]
    fn ties_preserve_insertion_order() {
        let store = store();
        let chunks = vec![chunk("a.txt", 0, "first"), chunk("b.txt", 0, "second")];
        // Identical embeddings, identical distances.
        let embeddings = vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0, 0.0]];
        store.add(&chunks, &embeddings).unwrap();

        let results = store.query(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results[0].chunk.text, "first");
        assert_eq!(results[1].chunk.text, "second");
    }

    #[test]
    fn rejects_wrong_dimension_embeddings() {
        let store = store();
        let err = store
            .add(&[chunk("a.txt", 0, "text")], &[vec![1.0, 0.0]])
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { got: 2, expected: 3 }));

        let err = store.query(&[1.0], 5).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { got: 1, expected: 3 }));
    }

    #[test]
    fn zero_norm_vectors_do_not_panic() {
        let store = store();
        store
            .add(&[chunk("a.txt", 0, "zeroed")], &[vec![0.0, 0.0, 0.0]])
            .unwrap();
        let results = store.query(&[1.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(results[0].distance, 1.0);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.db");
        {
            let store = VectorStore::open(&path, "test", 3).unwrap();
            store
                .add(&[chunk("a.txt", 0, "durable")], &[vec![1.0, 0.0, 0.0]])
                .unwrap();
        }
        let store = VectorStore::open(&path, "test", 3).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.all_texts().unwrap(), vec!["durable".to_string()]);
    }

    #[test]
    fn reopening_with_different_dimensions_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.db");
        VectorStore::open(&path, "test", 3).unwrap();
        let err = VectorStore::open(&path, "test", 4).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
