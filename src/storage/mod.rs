//! Seen-article store backed by SQLite.
//!
//! The `articles` table is the single source of truth for delivery history.
//! Nothing is cached in memory between cycles; every duplicate check goes
//! back to the database so that restarts never cause re-delivery.

mod articles;
mod schema;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, RecordOutcome, SentArticle};
