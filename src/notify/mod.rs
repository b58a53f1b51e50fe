//! Turning feed entries into notifications and delivering them.
//!
//! - [`formatter`] - pure mapping from a [`FeedEntry`](crate::feed::FeedEntry) to a [`Notification`]
//! - [`sender`] - the [`Notifier`] trait and its webhook implementation

mod formatter;
mod sender;

pub use formatter::{format_entry, Notification, DESCRIPTION_LIMIT, EMBED_COLOR};
pub use sender::{Notifier, SendError, WebhookPayload, WebhookSender, EMBED_TITLE_LIMIT};
