use anyhow::Result;

use super::schema::Database;
use super::types::{RecordOutcome, SentArticle};

/// Hard cap for listing queries
const MAX_RECENT: i64 = 1000;

impl Database {
    // ========================================================================
    // Delivery History
    // ========================================================================

    /// Returns true iff an article with exactly this URL has been recorded.
    pub async fn has_been_sent(&self, url: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM articles WHERE url = ? LIMIT 1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Record a delivered article.
    ///
    /// A second insert for the same URL is not an error: the first row wins
    /// and `RecordOutcome::AlreadySent` is returned. `published_date` falls
    /// back to the current UTC time when the feed did not provide one.
    pub async fn record_sent(
        &self,
        feed_name: &str,
        title: &str,
        url: &str,
        published_date: Option<&str>,
    ) -> Result<RecordOutcome> {
        let published = published_date
            .map(str::to_owned)
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

        let result = sqlx::query(
            "INSERT INTO articles (feed_name, title, url, published_date) VALUES (?, ?, ?, ?)",
        )
        .bind(feed_name)
        .bind(title)
        .bind(url)
        .bind(&published)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::info!(feed = %feed_name, title = %title, "Recorded sent article");
                Ok(RecordOutcome::Inserted)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::warn!(feed = %feed_name, url = %url, "Article already recorded");
                Ok(RecordOutcome::AlreadySent)
            }
            Err(e) => Err(e.into()),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Total number of recorded articles.
    pub async fn sent_count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Number of recorded articles for one feed label.
    pub async fn sent_count_for_feed(&self, feed_name: &str) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles WHERE feed_name = ?")
            .bind(feed_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Most recently recorded articles, newest first.
    pub async fn recent_sent(&self, limit: i64) -> Result<Vec<SentArticle>> {
        let limit = limit.clamp(0, MAX_RECENT);
        let rows = sqlx::query_as::<_, SentArticle>(
            r#"
            SELECT id, feed_name, title, url, published_date,
                   CAST(sent_at AS TEXT) AS sent_at
            FROM articles
            ORDER BY id DESC
            LIMIT ?
        "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
