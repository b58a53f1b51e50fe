//! The poll loop.
//!
//! One task walks the configured feeds in order, one entry at a time:
//! fetch → skip if already recorded → format → send → record. Nothing runs
//! in parallel; throughput is bounded by the pacing delays, which keep the
//! destination under its rate limits.
//!
//! A failure while handling one entry or one feed is logged and the loop
//! moves on. Only process termination stops [`Scheduler::run`].

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, FeedConfig};
use crate::feed::{FeedEntry, FeedSource};
use crate::notify::{format_entry, Notifier};
use crate::storage::{Database, RecordOutcome};

/// Deliberate pauses inside a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    /// After a successful delivery, before anything else.
    pub after_send: Duration,
    /// After every delivery attempt, successful or not.
    pub between_entries: Duration,
    /// After each feed.
    pub between_feeds: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            after_send: Duration::from_secs(1),
            between_entries: Duration::from_millis(500),
            between_feeds: Duration::from_secs(2),
        }
    }
}

impl PacingPolicy {
    /// No pauses at all.
    pub const fn none() -> Self {
        Self {
            after_send: Duration::ZERO,
            between_entries: Duration::ZERO,
            between_feeds: Duration::ZERO,
        }
    }
}

/// Sent counts for one pass over all feeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// `(feed name, sent count)` in configured order.
    pub per_feed: Vec<(String, usize)>,
    pub total_sent: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryOutcome {
    /// No link to identify the article by
    NoIdentity,
    AlreadySent,
    /// Store could not answer whether the entry was sent
    LookupFailed,
    DeliveryFailed,
    /// Delivered, but the store write failed; it will be sent again
    Unrecorded,
    Sent,
}

pub struct Scheduler<S, N> {
    config: Arc<Config>,
    db: Database,
    source: S,
    notifier: N,
}

impl<S: FeedSource, N: Notifier> Scheduler<S, N> {
    pub fn new(config: Arc<Config>, db: Database, source: S, notifier: N) -> Self {
        Self {
            config,
            db,
            source,
            notifier,
        }
    }

    /// Run cycles back to back, sleeping `check_interval` between them.
    ///
    /// With `max_cycles == None` this never returns.
    pub async fn run(&self, max_cycles: Option<u64>) {
        let mut completed: u64 = 0;
        loop {
            self.run_cycle().await;
            completed += 1;

            if max_cycles.is_some_and(|max| completed >= max) {
                tracing::info!(cycles = completed, "Stopping after requested cycles");
                return;
            }

            tracing::info!(
                interval_secs = self.config.check_interval.as_secs(),
                "Waiting before next check"
            );
            pause(self.config.check_interval).await;
        }
    }

    /// One pass over every configured feed, in order.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        for feed in &self.config.feeds {
            let sent = self.check_feed(feed).await;
            match self.db.sent_count_for_feed(&feed.name).await {
                Ok(recorded) => {
                    tracing::info!(feed = %feed.name, sent = sent, recorded = recorded, "Finished feed")
                }
                Err(e) => {
                    tracing::info!(feed = %feed.name, sent = sent, "Finished feed");
                    tracing::warn!(feed = %feed.name, error = %e, "Failed to count recorded articles");
                }
            }

            report.total_sent += sent;
            report.per_feed.push((feed.name.clone(), sent));

            pause(self.config.pacing.between_feeds).await;
        }

        tracing::info!(
            feeds = report.per_feed.len(),
            total_sent = report.total_sent,
            "Check complete"
        );
        report
    }

    /// Deliver every unseen entry of one feed. Returns how many were sent and recorded.
    pub async fn check_feed(&self, feed: &FeedConfig) -> usize {
        let entries = self.source.fetch_entries(&feed.url).await;
        tracing::debug!(feed = %feed.name, entries = entries.len(), "Checking feed");

        let pacing = self.config.pacing;
        let mut sent = 0;

        for entry in &entries {
            match self.process_entry(feed, entry).await {
                EntryOutcome::NoIdentity
                | EntryOutcome::AlreadySent
                | EntryOutcome::LookupFailed => continue,
                EntryOutcome::Sent => {
                    sent += 1;
                    pause(pacing.after_send).await;
                }
                EntryOutcome::Unrecorded => pause(pacing.after_send).await,
                EntryOutcome::DeliveryFailed => {}
            }

            pause(pacing.between_entries).await;
        }

        sent
    }

    async fn process_entry(&self, feed: &FeedConfig, entry: &FeedEntry) -> EntryOutcome {
        let Some(url) = entry.link.as_deref().filter(|l| !l.trim().is_empty()) else {
            tracing::debug!(feed = %feed.name, title = %entry.title_or_default(), "Skipping entry without link");
            return EntryOutcome::NoIdentity;
        };

        match self.db.has_been_sent(url).await {
            Ok(true) => return EntryOutcome::AlreadySent,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(feed = %feed.name, url = %url, error = %e, "Failed to check delivery history");
                return EntryOutcome::LookupFailed;
            }
        }

        let notification = format_entry(entry, &feed.name);
        if !self.notifier.send(&notification, feed).await {
            return EntryOutcome::DeliveryFailed;
        }

        match self
            .db
            .record_sent(
                &feed.name,
                &notification.title,
                url,
                entry.published.as_deref(),
            )
            .await
        {
            Ok(RecordOutcome::Inserted | RecordOutcome::AlreadySent) => EntryOutcome::Sent,
            Err(e) => {
                tracing::error!(
                    feed = %feed.name,
                    url = %url,
                    error = %e,
                    "Delivered but failed to record article"
                );
                EntryOutcome::Unrecorded
            }
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
