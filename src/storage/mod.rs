//! Storage layer for docqa
//!
//! Persists a processed document index to SQLite so it can be queried again
//! without re-chunking or re-embedding.

pub mod database;
mod vectors;

use crate::chunking::Chunk;
use crate::embedding::{build_index, ExactIndex, VectorIndex};
use crate::error::{DocQaError, Result};
use crate::pipeline::{DocumentIndex, IndexMetadata};
use rusqlite::{params, OptionalExtension};
use std::path::{Path, PathBuf};

pub use database::{Database, DbPool, DbStats};

/// Layout version of the stored index, bumped on incompatible changes
pub const INDEX_SCHEMA_VERSION: u32 = 1;

const META_SCHEMA_VERSION: &str = "schema_version";
const META_INDEX: &str = "index";

/// One document index stored in one SQLite file
pub struct IndexStore {
    database: Database,
    path: PathBuf,
}

impl IndexStore {
    pub fn open(path: &Path) -> Result<Self> {
        let database = Database::new(path)?;
        Ok(Self {
            database,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stats(&self) -> Result<DbStats> {
        self.database.stats()
    }

    /// Replace whatever the store holds with `index`
    pub fn save(&self, index: &DocumentIndex) -> Result<()> {
        let metadata = serde_json::to_string(index.metadata()).map_err(|e| DocQaError::Json {
            source: e,
            context: "Failed to serialize index metadata".to_string(),
        })?;

        let mut conn = self.database.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute_batch("DELETE FROM vectors; DELETE FROM chunks; DELETE FROM meta;")?;
        tx.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)",
            params![META_SCHEMA_VERSION, INDEX_SCHEMA_VERSION.to_string()],
        )?;
        tx.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)",
            params![META_INDEX, metadata],
        )?;

        {
            let mut insert_chunk = tx.prepare(
                "INSERT INTO chunks (seq, text, start_char, end_char) VALUES (?1, ?2, ?3, ?4)",
            )?;
            let mut insert_vector =
                tx.prepare("INSERT INTO vectors (seq, dimension, data) VALUES (?1, ?2, ?3)")?;

            for (chunk, vector) in index.chunks().iter().zip(index.vectors().vectors()) {
                insert_chunk.execute(params![
                    chunk.index as i64,
                    chunk.text,
                    chunk.start as i64,
                    chunk.end as i64
                ])?;
                insert_vector.execute(params![
                    chunk.index as i64,
                    vector.len() as i64,
                    vectors::encode(vector)?
                ])?;
            }
        }

        tx.commit()?;
        tracing::info!(
            "Saved index for {} ({} chunks) to {:?}",
            index.document_id(),
            index.len(),
            self.path
        );
        Ok(())
    }

    /// Build metadata of the stored index, if one was saved
    pub fn metadata(&self) -> Result<Option<IndexMetadata>> {
        let conn = self.database.get_conn()?;

        let version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![META_SCHEMA_VERSION],
                |row| row.get(0),
            )
            .optional()?;
        let Some(version) = version else {
            return Ok(None);
        };
        if version != INDEX_SCHEMA_VERSION.to_string() {
            return Err(DocQaError::IncompatibleIndex(format!(
                "index schema version {} is not supported (expected {})",
                version, INDEX_SCHEMA_VERSION
            )));
        }

        let raw: String = conn.query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![META_INDEX],
            |row| row.get(0),
        )?;
        let metadata = serde_json::from_str(&raw).map_err(|e| DocQaError::Json {
            source: e,
            context: "Failed to parse index metadata".to_string(),
        })?;
        Ok(Some(metadata))
    }

    /// Load the stored index and rebuild its vector index
    pub fn load(&self) -> Result<DocumentIndex> {
        let metadata = self.metadata()?.ok_or_else(|| {
            DocQaError::InvalidInput(format!("{:?} does not contain an index", self.path))
        })?;
        let settings = &metadata.settings;

        let conn = self.database.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.seq, c.text, c.start_char, c.end_char, v.dimension, v.data
             FROM chunks c JOIN vectors v ON v.seq = c.seq
             ORDER BY c.seq",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                Chunk {
                    index: row.get::<_, i64>(0)? as usize,
                    text: row.get(1)?,
                    start: row.get::<_, i64>(2)? as usize,
                    end: row.get::<_, i64>(3)? as usize,
                },
                row.get::<_, i64>(4)? as usize,
                row.get::<_, Vec<u8>>(5)?,
            ))
        })?;

        let mut chunks = Vec::new();
        let mut embeddings = Vec::new();
        for row in rows {
            let (chunk, dimension, blob) = row?;
            if dimension != settings.dimension {
                return Err(DocQaError::DimensionMismatch {
                    expected: settings.dimension,
                    actual: dimension,
                });
            }
            embeddings.push(vectors::decode(&blob, dimension)?);
            chunks.push(chunk);
        }

        let index: Box<dyn VectorIndex> = if embeddings.is_empty() {
            Box::new(ExactIndex::empty(settings.dimension))
        } else {
            build_index(settings.strategy, embeddings, &settings.hnsw)?
        };

        tracing::debug!(
            "Loaded index for {} ({} chunks) from {:?}",
            metadata.document_id,
            chunks.len(),
            self.path
        );
        DocumentIndex::from_parts(metadata, chunks, index)
    }
}
