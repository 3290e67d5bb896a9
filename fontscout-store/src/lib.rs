//! SQLite-backed persistence for discovered font sets.
//!
//! One row per normalized target URL, holding the font list JSON-encoded.
//! The store itself only offers `find` / `put` / `delete`; the
//! one-live-record-per-URL guarantee is enforced by the discovery
//! orchestrator with delete-then-write, not by locking here. Concurrent
//! writes for the same URL race as last-writer-wins, which is acceptable.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored font list is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
}

/// One persisted discovery result.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    pub fonts: Vec<String>,
}

/// Persistence seam used by the orchestrator.
#[async_trait]
pub trait SiteStore: Send + Sync {
    /// All live records for a URL, newest first. More than one only happens
    /// if an earlier cleanup was interrupted.
    async fn find(&self, url: &str) -> Result<Vec<SiteRecord>, StoreError>;
    /// Insert a new record, returning its id.
    async fn put(&self, url: &str, fonts: &[String]) -> Result<i64, StoreError>;
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect and make sure the schema exists.
    ///
    /// A single connection is enough here and keeps `sqlite::memory:` sane
    /// (every pooled connection would otherwise get its own database).
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS site (
              id         INTEGER PRIMARY KEY AUTOINCREMENT,
              url        TEXT NOT NULL,
              fonts      TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_site_url ON site(url)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SiteStore for SqliteStore {
    async fn find(&self, url: &str) -> Result<Vec<SiteRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, url, fonts
            FROM site
            WHERE url = ?
            ORDER BY id DESC
            "#,
        )
        .bind(url)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let fonts: String = row.get("fonts");
            records.push(SiteRecord {
                id: row.get("id"),
                url: row.get("url"),
                fonts: serde_json::from_str(&fonts)?,
            });
        }
        Ok(records)
    }

    async fn put(&self, url: &str, fonts: &[String]) -> Result<i64, StoreError> {
        let payload = serde_json::to_string(fonts)?;
        let result = sqlx::query("INSERT INTO site (url, fonts) VALUES (?, ?)")
            .bind(url)
            .bind(payload)
            .execute(&self.pool)
            .await?;
        let id = result.last_insert_rowid();
        tracing::debug!(url, id, font_count = fonts.len(), "store.put");
        Ok(id)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM site WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        tracing::debug!(id, "store.delete");
        Ok(())
    }
}

/// In-process store for tests and one-shot CLI runs that do not want a
/// database file.
#[derive(Default)]
pub struct MemoryStore {
    inner: std::sync::Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    next_id: i64,
    records: Vec<SiteRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SiteStore for MemoryStore {
    async fn find(&self, url: &str) -> Result<Vec<SiteRecord>, StoreError> {
        let inner = self.inner.lock().expect("store lock");
        let mut matched: Vec<SiteRecord> = inner
            .records
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(matched)
    }

    async fn put(&self, url: &str, fonts: &[String]) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.push(SiteRecord {
            id,
            url: url.to_string(),
            fonts: fonts.to_vec(),
        });
        Ok(id)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        inner.records.retain(|r| r.id != id);
        Ok(())
    }
}
