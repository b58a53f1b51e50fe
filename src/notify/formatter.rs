use crate::feed::{extract_image, FeedEntry};
use crate::util::{strip_html_tags, truncate_chars};

/// Maximum description length in characters, before the ellipsis.
pub const DESCRIPTION_LIMIT: usize = 200;

/// Embed accent color.
pub const EMBED_COLOR: u32 = 0x3498db;

/// Label of the publish-date field.
pub const PUBLISHED_FIELD: &str = "Published";

const PREAMBLE: &str = "New article published!";

/// A rendered notification for one entry, ready to hand to a [`Notifier`].
///
/// [`Notifier`]: super::Notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Plain-text message shown above the embed.
    pub content: String,
    pub title: String,
    pub url: String,
    /// Summary with tags removed, capped at [`DESCRIPTION_LIMIT`] characters.
    pub description: String,
    pub color: u32,
    pub image_url: Option<String>,
    pub published: Option<String>,
    pub footer: String,
}

/// Build the notification for `entry` from the feed labelled `feed_name`.
pub fn format_entry(entry: &FeedEntry, feed_name: &str) -> Notification {
    let title = entry.title_or_default().to_string();
    let url = entry.link.clone().unwrap_or_default();

    let description = entry
        .summary
        .as_deref()
        .map(|summary| {
            let text = strip_html_tags(summary);
            truncate_chars(&text, DESCRIPTION_LIMIT).into_owned()
        })
        .unwrap_or_default();

    Notification {
        content: format!("{}\nTitle: {}\n{}", PREAMBLE, title, url),
        title,
        url,
        description,
        color: EMBED_COLOR,
        image_url: extract_image(entry),
        published: entry.published.clone(),
        footer: format!("Source: {}", feed_name),
    }
}
