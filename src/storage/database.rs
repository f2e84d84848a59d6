//! SQLite database management with migrations
//!
//! One database file holds one processed document: build metadata, chunks and
//! compressed chunk vectors.

use crate::error::{DocQaError, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database manager with migration support
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database at `db_path`
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocQaError::Io {
                source: e,
                context: format!("Failed to create database directory: {:?}", parent),
            })?;
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder().max_size(4).build(manager)?;

        {
            let conn = pool.get()?;
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA foreign_keys = ON;
                PRAGMA busy_timeout = 5000;
                ",
            )?;
        }

        let db = Self { pool };
        db.migrate()?;

        Ok(db)
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: i32 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM _migrations",
            [],
            |row| row.get(0),
        )?;

        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);
                conn.execute_batch(migration)?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }

    /// Row counts, used by `docqa index` output
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.get_conn()?;

        let chunk_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        let vector_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM vectors", [], |row| row.get(0))?;
        let vector_bytes: i64 = conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(data)), 0) FROM vectors",
            [],
            |row| row.get(0),
        )?;

        Ok(DbStats {
            chunk_count: chunk_count as usize,
            vector_count: vector_count as usize,
            vector_bytes: vector_bytes as u64,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbStats {
    pub chunk_count: usize,
    pub vector_count: usize,
    /// Compressed size of all vector blobs
    pub vector_bytes: u64,
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    -- Key/value build metadata
    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    -- Chunks in sequence order, offsets in characters
    CREATE TABLE chunks (
        seq INTEGER PRIMARY KEY,
        text TEXT NOT NULL,
        start_char INTEGER NOT NULL,
        end_char INTEGER NOT NULL
    );

    -- One zstd-compressed little-endian f32 vector per chunk
    CREATE TABLE vectors (
        seq INTEGER PRIMARY KEY,
        dimension INTEGER NOT NULL,
        data BLOB NOT NULL,
        FOREIGN KEY (seq) REFERENCES chunks(seq) ON DELETE CASCADE
    );
    "#,
];

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("index.db");
        let db = Database::new(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(
            db.stats().unwrap(),
            DbStats {
                chunk_count: 0,
                vector_count: 0,
                vector_bytes: 0
            }
        );
    }

    #[test]
    fn test_migrations_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("index.db");

        let _db1 = Database::new(&db_path).unwrap();
        drop(_db1);
        let db2 = Database::new(&db_path).unwrap();

        let conn = db2.get_conn().unwrap();
        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, MIGRATIONS.len() as i32);
    }

    #[test]
    fn test_vectors_require_chunk() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("index.db")).unwrap();
        let conn = db.get_conn().unwrap();

        let result = conn.execute(
            "INSERT INTO vectors (seq, dimension, data) VALUES (?1, ?2, ?3)",
            params![7, 4, vec![0u8; 4]],
        );
        assert!(result.is_err(), "Foreign key constraint should prevent insert");
    }
}
