//! The seen-article store must survive restarts.

use feedhook::storage::{Database, RecordOutcome};
use tempfile::TempDir;

#[tokio::test]
async fn test_sent_articles_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("rss_data.db");
    let path = path.to_str().unwrap();

    {
        let db = Database::open(path).await.unwrap();
        let outcome = db
            .record_sent("BBC News", "Story", "https://www.bbc.co.uk/news/articles/abc123", None)
            .await
            .unwrap();
        assert_eq!(outcome, RecordOutcome::Inserted);
        db.close().await;
    }

    let db = Database::open(path).await.unwrap();
    assert!(db
        .has_been_sent("https://www.bbc.co.uk/news/articles/abc123")
        .await
        .unwrap());
    assert!(!db.has_been_sent("https://www.bbc.co.uk/news/other").await.unwrap());
    assert_eq!(db.sent_count().await.unwrap(), 1);

    // Reopening must not wipe or duplicate anything
    let outcome = db
        .record_sent("BBC News", "Story", "https://www.bbc.co.uk/news/articles/abc123", None)
        .await
        .unwrap();
    assert_eq!(outcome, RecordOutcome::AlreadySent);
    assert_eq!(db.sent_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_recent_sent_newest_first() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rss_data.db");
    let db = Database::open(path.to_str().unwrap()).await.unwrap();

    for i in 1..=3 {
        db.record_sent("arXiv", &format!("Paper {}", i), &format!("https://arxiv.org/abs/{}", i), None)
            .await
            .unwrap();
    }

    let recent = db.recent_sent(2).await.unwrap();
    let titles: Vec<_> = recent.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Paper 3", "Paper 2"]);
    assert!(recent.iter().all(|a| a.published_date.is_some()));
}
