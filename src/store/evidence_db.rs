use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::engine::EvidenceSource;
use crate::engine::evidence::query_key;
use crate::error::EngineError;
use crate::model::{EvidenceBundle, Passage};
use crate::util::now_utc_string;

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

/// One line of an evidence ingest file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBundle {
    pub query: String,
    #[serde(flatten)]
    pub bundle: EvidenceBundle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub bundles: i64,
    pub passages: i64,
    pub samples: i64,
}

/// SQLite-backed retrieval/generation outputs, keyed by normalized query.
pub struct EvidenceStore {
    connection: Connection,
}

impl EvidenceStore {
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open evidence store read-only: {}", path.display()))?;
        Ok(Self { connection })
    }

    pub fn open_for_write(path: &Path) -> Result<Self> {
        let connection = Connection::open(path)
            .with_context(|| format!("failed to open evidence store: {}", path.display()))?;
        configure_connection(&connection)?;
        Self::with_schema(connection)
    }

    pub fn with_schema(connection: Connection) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    /// Replaces everything stored for each bundle's query in one transaction.
    pub fn upsert_bundles(&mut self, bundles: &[StoredBundle], source_hash: &str) -> Result<usize> {
        let ingested_at = now_utc_string();
        let tx = self
            .connection
            .transaction()
            .context("failed to start ingest transaction")?;

        let mut written = 0_usize;
        {
            let mut upsert_bundle = tx.prepare(
                "
                INSERT INTO bundles (query_key, query, primary_answer, ingested_at, source_hash)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(query_key) DO UPDATE SET
                  query = excluded.query,
                  primary_answer = excluded.primary_answer,
                  ingested_at = excluded.ingested_at,
                  source_hash = excluded.source_hash
                ",
            )?;
            let mut clear_passages = tx.prepare("DELETE FROM passages WHERE query_key = ?1")?;
            let mut clear_samples = tx.prepare("DELETE FROM samples WHERE query_key = ?1")?;
            let mut insert_passage = tx.prepare(
                "
                INSERT INTO passages (query_key, rank, passage_id, title, text, score)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )?;
            let mut insert_sample =
                tx.prepare("INSERT INTO samples (query_key, seq, text) VALUES (?1, ?2, ?3)")?;

            for stored in bundles {
                let key = query_key(&stored.query);
                if key.is_empty() {
                    continue;
                }

                upsert_bundle.execute(params![
                    key,
                    stored.query.trim(),
                    stored.bundle.primary_answer,
                    ingested_at,
                    source_hash
                ])?;
                clear_passages.execute(params![key])?;
                clear_samples.execute(params![key])?;

                for (rank, passage) in stored.bundle.passages.iter().enumerate() {
                    insert_passage.execute(params![
                        key,
                        rank as i64,
                        passage.id,
                        passage.title,
                        passage.text,
                        passage.score
                    ])?;
                }
                for (seq, sample) in stored.bundle.samples.iter().enumerate() {
                    insert_sample.execute(params![key, seq as i64, sample])?;
                }
                written += 1;
            }
        }

        tx.commit().context("failed to commit ingest transaction")?;
        Ok(written)
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            bundles: query_count(&self.connection, "SELECT COUNT(*) FROM bundles")?,
            passages: query_count(&self.connection, "SELECT COUNT(*) FROM passages")?,
            samples: query_count(&self.connection, "SELECT COUNT(*) FROM samples")?,
        })
    }

    pub fn schema_version(&self) -> Result<Option<String>> {
        let version = self
            .connection
            .query_row(
                "SELECT value FROM metadata WHERE key = 'db_schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }

    fn load_passages(&self, key: &str) -> rusqlite::Result<Vec<Passage>> {
        let mut statement = self.connection.prepare_cached(
            "
            SELECT passage_id, title, text, score
            FROM passages
            WHERE query_key = ?1
            ORDER BY rank ASC
            ",
        )?;
        let rows = statement.query_map(params![key], |row| {
            Ok(Passage {
                id: row.get(0)?,
                title: row.get(1)?,
                text: row.get(2)?,
                score: row.get(3)?,
            })
        })?;
        rows.collect()
    }

    fn load_samples(&self, key: &str) -> rusqlite::Result<Vec<String>> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT text FROM samples WHERE query_key = ?1 ORDER BY seq ASC")?;
        let rows = statement.query_map(params![key], |row| row.get(0))?;
        rows.collect()
    }
}

impl EvidenceSource for EvidenceStore {
    fn retrieve(&self, query: &str) -> Result<Vec<Passage>, EngineError> {
        self.load_passages(&query_key(query))
            .map_err(|err| EngineError::Evidence(err.to_string()))
    }

    fn sample(&self, query: &str) -> Result<Vec<String>, EngineError> {
        self.load_samples(&query_key(query))
            .map_err(|err| EngineError::Evidence(err.to_string()))
    }

    fn primary_answer(&self, query: &str) -> Result<Option<String>, EngineError> {
        self.connection
            .query_row(
                "SELECT primary_answer FROM bundles WHERE query_key = ?1",
                params![query_key(query)],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .map(Option::flatten)
            .map_err(|err| EngineError::Evidence(err.to_string()))
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS bundles (
              query_key TEXT PRIMARY KEY,
              query TEXT NOT NULL,
              primary_answer TEXT,
              ingested_at TEXT NOT NULL,
              source_hash TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS passages (
              query_key TEXT NOT NULL,
              rank INTEGER NOT NULL,
              passage_id TEXT NOT NULL,
              title TEXT NOT NULL DEFAULT '',
              text TEXT NOT NULL,
              score REAL NOT NULL DEFAULT 0,
              PRIMARY KEY(query_key, rank),
              FOREIGN KEY(query_key) REFERENCES bundles(query_key)
            );

            CREATE TABLE IF NOT EXISTS samples (
              query_key TEXT NOT NULL,
              seq INTEGER NOT NULL,
              text TEXT NOT NULL,
              PRIMARY KEY(query_key, seq),
              FOREIGN KEY(query_key) REFERENCES bundles(query_key)
            );
            ",
        )
        .context("failed to create evidence schema")?;

    connection
        .execute(
            "
            INSERT INTO metadata (key, value) VALUES ('db_schema_version', ?1)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
            params![DB_SCHEMA_VERSION],
        )
        .context("failed to record schema version")?;
    Ok(())
}

fn query_count(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
