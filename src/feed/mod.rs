//! Feed retrieval and entry extraction.
//!
//! - [`parser`] - RSS/Atom parsing into [`FeedEntry`] records using `feed-rs`
//! - [`fetcher`] - HTTP retrieval behind the [`FeedSource`] trait
//! - [`images`] - ordered image-URL selection for an entry

mod fetcher;
mod images;
mod parser;

pub use fetcher::{FeedSource, FetchError, HttpFeedFetcher};
pub use images::extract_image;
pub use parser::{parse_entries, EntryLink, FeedEntry, UNTITLED};
