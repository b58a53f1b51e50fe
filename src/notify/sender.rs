use async_trait::async_trait;
use serde::Serialize;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

use super::formatter::{Notification, PUBLISHED_FIELD};
use crate::config::FeedConfig;
use crate::util::{truncate_chars, ELLIPSIS};

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest embed title Discord accepts, in characters.
pub const EMBED_TITLE_LIMIT: usize = 256;

/// Errors that can occur while delivering a notification.
///
/// Messages never include the webhook URL, which carries a credential.
#[derive(Debug, Error)]
pub enum SendError {
    /// The feed has no destination configured
    #[error("No webhook URL configured")]
    MissingWebhook,
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(reqwest::Error),
    /// Endpoint answered with a non-2xx status
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
}

/// Delivers notifications to a feed's destination.
///
/// Implementations report failure as `false` and never panic, so the poll
/// loop can keep going.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification, feed: &FeedConfig) -> bool;
}

// ============================================================================
// Wire format
// ============================================================================

/// Discord-compatible webhook body: a text message plus one rich embed.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    content: &'a str,
    embeds: [Embed<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    title: Cow<'a, str>,
    #[serde(skip_serializing_if = "str::is_empty")]
    url: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<EmbedImage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField<'a>>,
    footer: EmbedFooter<'a>,
}

#[derive(Debug, Serialize)]
struct EmbedImage<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct EmbedField<'a> {
    name: &'a str,
    value: &'a str,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct EmbedFooter<'a> {
    text: &'a str,
}

impl<'a> From<&'a Notification> for WebhookPayload<'a> {
    fn from(n: &'a Notification) -> Self {
        let fields = n
            .published
            .as_deref()
            .map(|value| EmbedField {
                name: PUBLISHED_FIELD,
                value,
                inline: true,
            })
            .into_iter()
            .collect();

        Self {
            content: &n.content,
            embeds: [Embed {
                title: truncate_chars(&n.title, EMBED_TITLE_LIMIT - ELLIPSIS.len()),
                url: &n.url,
                description: &n.description,
                color: n.color,
                image: n.image_url.as_deref().map(|url| EmbedImage { url }),
                fields,
                footer: EmbedFooter { text: &n.footer },
            }],
        }
    }
}

// ============================================================================
// Webhook sender
// ============================================================================

/// Posts notifications to webhook endpoints with a shared HTTP client.
#[derive(Clone)]
pub struct WebhookSender {
    client: reqwest::Client,
}

impl WebhookSender {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Post one notification to `webhook_url`.
    ///
    /// # Errors
    ///
    /// - [`SendError::MissingWebhook`] - `webhook_url` is `None` or blank; no request is made
    /// - [`SendError::Network`] - Connection or TLS errors
    /// - [`SendError::Timeout`] - Request exceeded 30 seconds
    /// - [`SendError::HttpStatus`] - Non-2xx response from the endpoint
    pub async fn deliver(
        &self,
        notification: &Notification,
        webhook_url: Option<&str>,
    ) -> Result<(), SendError> {
        let webhook_url = webhook_url
            .filter(|w| !w.trim().is_empty())
            .ok_or(SendError::MissingWebhook)?;

        let payload = WebhookPayload::from(notification);
        let request = self.client.post(webhook_url).json(&payload).send();

        let response = tokio::time::timeout(SEND_TIMEOUT, request)
            .await
            .map_err(|_| SendError::Timeout)?
            .map_err(|e| SendError::Network(e.without_url()))?;

        if !response.status().is_success() {
            return Err(SendError::HttpStatus(response.status().as_u16()));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookSender {
    async fn send(&self, notification: &Notification, feed: &FeedConfig) -> bool {
        match self.deliver(notification, feed.webhook_url()).await {
            Ok(()) => {
                tracing::info!(feed = %feed.name, title = %notification.title, "Sent notification");
                true
            }
            Err(SendError::MissingWebhook) => {
                tracing::error!(feed = %feed.name, "No webhook URL configured for feed");
                false
            }
            Err(e) => {
                tracing::error!(
                    feed = %feed.name,
                    title = %notification.title,
                    error = %e,
                    "Failed to deliver notification"
                );
                false
            }
        }
    }
}
