//! Ranked reads over the scraped items and the podcast index of a provider.

use crate::error::StoreError;
use crate::models::{NewsItem, Provider};
use crate::store::RankedStore;
use tracing::{instrument, warn};

/// Inclusive rank window of a 1-based page, or `None` when the window is
/// empty or lies past the addressable ranks.
fn page_bounds(limit: usize, page: usize) -> Option<(usize, usize)> {
    let start = page.checked_sub(1)?.checked_mul(limit)?;
    let end = start.checked_add(limit.checked_sub(1)?)?;
    Some((start, end))
}

/// One page of a provider's items, most popular first.
///
/// Members that no longer decode as [`NewsItem`] are skipped with a warning.
#[instrument(level = "info", skip(store))]
pub async fn get_top_items<S: RankedStore>(
    store: &S,
    provider: Provider,
    limit: usize,
    page: usize,
) -> Result<Vec<NewsItem>, StoreError> {
    let Some((start, end)) = page_bounds(limit, page) else {
        return Ok(Vec::new());
    };
    let members = store.rev_range(provider.items_key(), start, end).await?;
    Ok(members
        .iter()
        .filter_map(|member| match serde_json::from_str::<NewsItem>(member) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable item");
                None
            }
        })
        .collect())
}

/// URLs of the `limit` most popular items of a provider.
pub async fn get_top_item_urls<S: RankedStore>(
    store: &S,
    provider: Provider,
    limit: usize,
) -> Result<Vec<String>, StoreError> {
    let items = get_top_items(store, provider, limit, 1).await?;
    Ok(items.into_iter().map(|item| item.url).collect())
}

/// One page of a provider's podcast names, newest first.
#[instrument(level = "info", skip(store))]
pub async fn get_podcasts<S: RankedStore>(
    store: &S,
    provider: Provider,
    limit: usize,
    page: usize,
) -> Result<Vec<String>, StoreError> {
    let Some((start, end)) = page_bounds(limit, page) else {
        return Ok(Vec::new());
    };
    store.rev_range(provider.podcasts_key(), start, end).await
}
