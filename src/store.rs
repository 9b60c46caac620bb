use crate::smartapi::models::{IndexConfig, InstrumentRecord};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type Db = Arc<Mutex<Connection>>;

// -----------------------------------------------
// PER-INDEX SNAPSHOT COLLECTIONS
// -----------------------------------------------

/// Registry of per-index snapshot collections over SQLite. Every tracked
/// index gets its own table, created up front at open time; an index name
/// that was never registered is an error, not an implicit new collection.
/// The only write path is upsert-by-symbol with a full payload replace.
#[derive(Clone)]
pub struct SnapshotStore {
    db: Db,
    // index name -> table name; fixed after open.
    collections: HashMap<String, String>,
}

/// A row as persisted: the greeks payload stays serialized JSON, timestamps
/// are unix milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredInstrument {
    pub symbol: String,
    pub token: String,
    pub greeks: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SnapshotStore {
    pub fn open(path: &Path, indices: &[IndexConfig]) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("creating db directory")?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("opening sqlite at {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;

        Self::with_connection(conn, indices)
    }

    /// In-memory store with the same schema; used by the tests.
    pub fn open_in_memory(indices: &[IndexConfig]) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, indices)
    }

    fn with_connection(conn: Connection, indices: &[IndexConfig]) -> Result<Self> {
        let mut collections = HashMap::new();
        for cfg in indices {
            let table = collection_name(cfg.name);
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    symbol      TEXT PRIMARY KEY,
                    token       TEXT NOT NULL,
                    greeks      TEXT NOT NULL,
                    created_at  INTEGER NOT NULL,
                    updated_at  INTEGER NOT NULL
                );"
            ))?;
            collections.insert(cfg.name.to_string(), table);
        }

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            collections,
        })
    }

    pub fn indices(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.collections.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    fn table(&self, index: &str) -> Result<&str> {
        self.collections
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("no snapshot collection for index {}", index))
    }

    /// Insert the contract or replace its payload in place. `created_at` is
    /// set once; repeat writes only advance `updated_at`.
    pub async fn upsert(&self, index: &str, record: &InstrumentRecord) -> Result<()> {
        let table = self.table(index)?.to_string();
        let greeks = serde_json::to_string(&record.greeks).context("serializing greeks payload")?;
        let now = Utc::now().timestamp_millis();

        let conn = self.db.lock().await;
        conn.execute(
            &format!(
                "INSERT INTO {table} (symbol, token, greeks, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(symbol) DO UPDATE SET
                    token = excluded.token,
                    greeks = excluded.greeks,
                    updated_at = excluded.updated_at"
            ),
            params![record.symbol, record.token, greeks, now],
        )
        .with_context(|| format!("upserting {} into {}", record.symbol, table))?;

        Ok(())
    }

    pub async fn fetch(&self, index: &str, symbol: &str) -> Result<Option<StoredInstrument>> {
        let table = self.table(index)?.to_string();
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT symbol, token, greeks, created_at, updated_at FROM {table} WHERE symbol = ?1"
        ))?;
        let mut rows = stmt.query_map(params![symbol], |row| {
            Ok(StoredInstrument {
                symbol: row.get(0)?,
                token: row.get(1)?,
                greeks: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?;
        rows.next().transpose().context("reading stored instrument")
    }

    pub async fn count(&self, index: &str) -> Result<usize> {
        let table = self.table(index)?.to_string();
        let conn = self.db.lock().await;
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Collection (table) name for an index; derived from the name, so
/// cross-index symbol collisions are impossible by construction.
pub fn collection_name(index: &str) -> String {
    format!("greeks_{}", index.to_lowercase())
}
