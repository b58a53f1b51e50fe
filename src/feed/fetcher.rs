use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

use super::parser::{parse_entries, FeedEntry};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching a feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// Feed XML could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Source of feed entries for the poll loop.
///
/// Implementations never fail: a feed that cannot be read yields no entries.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_entries(&self, feed_url: &str) -> Vec<FeedEntry>;
}

/// Fetches feeds over HTTP(S) with a shared client.
#[derive(Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch and parse one feed, reporting why it failed.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection or TLS errors
    /// - [`FetchError::Timeout`] - Request exceeded 30 seconds
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - Response exceeded 10MB
    /// - [`FetchError::IncompleteResponse`] - Body shorter than Content-Length
    /// - [`FetchError::Parse`] - Invalid RSS/Atom XML
    pub async fn try_fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>, FetchError> {
        let response = tokio::time::timeout(FETCH_TIMEOUT, self.client.get(feed_url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
        parse_entries(&bytes).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl FeedSource for HttpFeedFetcher {
    async fn fetch_entries(&self, feed_url: &str) -> Vec<FeedEntry> {
        match self.try_fetch(feed_url).await {
            Ok(entries) => {
                tracing::debug!(feed = %feed_url, entries = entries.len(), "Fetched feed");
                entries
            }
            Err(e) => {
                tracing::error!(feed = %feed_url, error = %e, "Failed to fetch feed");
                Vec::new()
            }
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>One</title><link>https://example.com/1</link></item>
    <item><title>Two</title><link>https://example.com/2</link></item>
</channel></rss>"#;

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/rss+xml"),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFeedFetcher::new(reqwest::Client::new());
        let entries = fetcher
            .fetch_entries(&format!("{}/feed", mock_server.uri()))
            .await;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/1"));
        assert_eq!(entries[1].link.as_deref(), Some("https://example.com/2"));
    }

    #[tokio::test]
    async fn test_404_is_http_status_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFeedFetcher::new(reqwest::Client::new());
        let url = format!("{}/feed", mock_server.uri());

        match fetcher.try_fetch(&url).await {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other.map(|e| e.len())),
        }
        assert!(fetcher.fetch_entries(&url).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_feed_yields_no_entries() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFeedFetcher::new(reqwest::Client::new());
        let url = format!("{}/feed", mock_server.uri());

        assert!(matches!(
            fetcher.try_fetch(&url).await,
            Err(FetchError::Parse(_))
        ));
        assert!(fetcher.fetch_entries(&url).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_feed_yields_no_entries() {
        let fetcher = HttpFeedFetcher::new(reqwest::Client::new());
        // Port 9 (discard) on localhost is expected to refuse connections
        let entries = fetcher.fetch_entries("http://127.0.0.1:9/feed").await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_empty_feed_success() {
        let empty_rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel></channel></rss>"#;

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(empty_rss))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFeedFetcher::new(reqwest::Client::new());
        let result = fetcher
            .try_fetch(&format!("{}/feed", mock_server.uri()))
            .await;
        assert!(result.unwrap().is_empty());
    }
}
