//! Listing scrapers that keep each provider's ranked item set fresh.
//!
//! Each scraper module exports a pure `parse_listing(html)` that turns a
//! listing page into `(NewsItem, score)` pairs, where
//! `score = points + comments * 0.5`. This module owns the network fetch,
//! the store refresh and the periodic scheduler shared by all providers.
//!
//! | Provider | Module | Listing |
//! |----------|--------|---------|
//! | HackerNews | [`hackernews`] | `https://news.ycombinator.com/` |
//! | GeekNews | [`geeknews`] | `https://news.hada.io/` |

use crate::models::{NewsItem, Provider};
use crate::store::RankedStore;
use reqwest::Client;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, instrument};

pub mod geeknews;
pub mod hackernews;

/// Popularity used as the ranking score of a scraped item.
pub fn popularity(points: u64, comments: u64) -> f64 {
    points as f64 + comments as f64 * 0.5
}

/// Parse a provider's listing page.
pub fn parse_listing(provider: Provider, html: &str) -> Vec<(NewsItem, f64)> {
    match provider {
        Provider::HackerNews => hackernews::parse_listing(html),
        Provider::GeekNews => geeknews::parse_listing(html),
    }
}

/// Scrape a provider's listing and replace its ranked item set.
///
/// Returns the number of items stored.
#[instrument(level = "info", skip_all, fields(%provider))]
pub async fn refresh<S: RankedStore>(
    client: &Client,
    store: &S,
    provider: Provider,
) -> Result<usize, Box<dyn Error + Send + Sync>> {
    let html = client
        .get(provider.listing_url())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let items = parse_listing(provider, &html);

    let mut entries = Vec::with_capacity(items.len());
    for (item, score) in items {
        entries.push((serde_json::to_string(&item)?, score));
    }
    let count = entries.len();
    store.replace(provider.items_key(), entries).await?;
    info!(count, "Refreshed ranked items");
    Ok(count)
}

/// Refresh `provider` now and then every `every`, until the task is aborted.
///
/// A failed scrape is logged and retried on the next tick.
pub fn spawn_refresh_loop<S: RankedStore>(
    client: Client,
    store: Arc<S>,
    provider: Provider,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = refresh(&client, store.as_ref(), provider).await {
                error!(%provider, error = %e, "Scrape failed; will retry next interval");
            }
        }
    })
}
