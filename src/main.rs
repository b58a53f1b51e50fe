use anyhow::{Context, Result};
use clap::Parser;
use reqwest::redirect::Policy;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use feedhook::config::Config;
use feedhook::feed::HttpFeedFetcher;
use feedhook::notify::WebhookSender;
use feedhook::scheduler::Scheduler;
use feedhook::storage::{Database, DatabaseError};

#[derive(Parser, Debug)]
#[command(name = "feedhook", about = "Poll RSS/Atom feeds and post new articles to webhooks")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, value_name = "FILE", env = "FEEDHOOK_CONFIG", default_value = "feedhook.toml")]
    config: PathBuf,

    /// Run a single check cycle and exit
    #[arg(long)]
    once: bool,

    /// Print the N most recently sent articles and exit
    #[arg(long, value_name = "N")]
    list_recent: Option<i64>,
}

fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 5 {
            return attempt.error("Too many redirects (max 5)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        // Host only: webhook paths carry credentials
        tracing::debug!(
            host = url.host_str().unwrap_or("unknown"),
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("feedhook/", env!("CARGO_PKG_VERSION")))
        .redirect(create_redirect_policy())
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")
}

async fn print_recent(db: &Database, limit: i64) -> Result<()> {
    let articles = db
        .recent_sent(limit)
        .await
        .context("Failed to load sent articles")?;

    if articles.is_empty() {
        println!("No articles sent yet.");
        return Ok(());
    }

    for article in articles {
        println!(
            "{}  [{}] {}\n    {}",
            article.sent_at, article.feed_name, article.title, article.url
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from '{}'", args.config.display()))?;

    let db_path_str = config
        .db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of feedhook appears to be using '{}'. Stop it and try again.",
                config.db_path.display()
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    if let Some(limit) = args.list_recent {
        return print_recent(&db, limit).await;
    }

    let already_sent = db
        .sent_count()
        .await
        .context("Failed to read delivery history")?;
    tracing::info!(
        db = %config.db_path.display(),
        already_sent = already_sent,
        feeds = config.feeds.len(),
        interval_secs = config.check_interval.as_secs(),
        "Starting feed monitor"
    );

    if config.feeds.is_empty() {
        tracing::warn!("No feeds configured; cycles will do nothing");
    }

    let client = build_http_client()?;
    let scheduler = Scheduler::new(
        Arc::new(config),
        db,
        HttpFeedFetcher::new(client.clone()),
        WebhookSender::new(client),
    );

    let max_cycles = args.once.then_some(1);
    scheduler.run(max_cycles).await;

    Ok(())
}
