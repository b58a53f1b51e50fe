use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use super::types::DatabaseError;

// ============================================================================
// Database
// ============================================================================

#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open the seen-article store and make sure its schema exists.
    ///
    /// The parent directory of `path` is created when missing. Passing
    /// `":memory:"` opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::CreateDir` if the directory cannot be created,
    /// `DatabaseError::InstanceLocked` if another process holds the file
    /// locked, `DatabaseError::Migration` if the schema cannot be created, and
    /// `DatabaseError::Other` for anything else.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|source| DatabaseError::CreateDir {
                        path: parent.display().to_string(),
                        source,
                    })?;
                    tracing::info!(path = %parent.display(), "Created database directory");
                }
            }
        }

        let url = format!("sqlite:{}?mode=rwc", path);

        // busy_timeout=5000: wait up to 5 seconds for a lock before SQLITE_BUSY.
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(DatabaseError::from_sqlx)?
            .pragma("busy_timeout", "5000");
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Close every pooled connection, waiting for in-flight queries.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Create the `articles` table and its index if they do not exist yet.
    ///
    /// Safe to call on every startup: all statements use `IF NOT EXISTS` and
    /// run in one transaction, so existing rows are never touched.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        self.migrate().await.map_err(|e| {
            let error_string = e.to_string().to_lowercase();
            if error_string.contains("database is locked")
                || error_string.contains("database table is locked")
            {
                DatabaseError::InstanceLocked
            } else {
                DatabaseError::Migration(e.to_string())
            }
        })
    }

    async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'articles'",
        )
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                feed_name TEXT NOT NULL,
                title TEXT NOT NULL,
                url TEXT UNIQUE NOT NULL,
                published_date TEXT,
                sent_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        // Per-feed counts for cycle summaries
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_articles_feed_name ON articles(feed_name)")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if existing.is_some() {
            tracing::info!("Articles table already exists");
        } else {
            tracing::info!("Created articles table");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let db = Database::open(":memory:").await.unwrap();
        db.record_sent("Feed", "Title", "https://example.com/a", None)
            .await
            .unwrap();

        // Running schema setup again must keep existing rows
        db.ensure_schema().await.unwrap();
        db.ensure_schema().await.unwrap();

        assert!(db.has_been_sent("https://example.com/a").await.unwrap());
        assert_eq!(db.sent_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("feedhook.db");

        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.parent().unwrap().exists());
        assert_eq!(db.sent_count().await.unwrap(), 0);
    }
}
