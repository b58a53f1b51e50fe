//! Poll RSS/Atom feeds and announce unseen articles through webhooks.
//!
//! Each configured feed is fetched on a fixed interval. Entries whose link is
//! not yet in the local SQLite store are rendered as a rich notification,
//! posted to the feed's webhook, and recorded so they are never sent twice.

pub mod config;
pub mod feed;
pub mod notify;
pub mod scheduler;
pub mod storage;
pub mod util;
