//! GeekNews (news.hada.io) front page parser.
//!
//! Topics are `.topics .topic_row` blocks. The item id is carried by the vote
//! button's span (`id="vote12345"`), the points by the first `.topicinfo span`
//! and the comment count by the last `.topicinfo a` ("댓글 12개").

use super::popularity;
use crate::models::NewsItem;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").unwrap());

struct Selectors {
    vote: Selector,
    title: Selector,
    link: Selector,
    info_span: Selector,
    info_link: Selector,
}

/// Parse the front page into `(item, score)` pairs in listing order.
pub fn parse_listing(html: &str) -> Vec<(NewsItem, f64)> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse(".topics .topic_row").unwrap();
    let selectors = Selectors {
        vote: Selector::parse(".vote > span").unwrap(),
        title: Selector::parse("h1").unwrap(),
        link: Selector::parse(".topictitle a").unwrap(),
        info_span: Selector::parse(".topicinfo span").unwrap(),
        info_link: Selector::parse(".topicinfo a").unwrap(),
    };

    let items: Vec<(NewsItem, f64)> = document
        .select(&row_selector)
        .filter_map(|row| {
            let parsed = map_row(&selectors, row);
            if parsed.is_none() {
                warn!("Skipping malformed GeekNews row");
            }
            parsed
        })
        .collect();
    debug!(count = items.len(), "Parsed GeekNews listing");
    items
}

fn map_row(selectors: &Selectors, row: ElementRef<'_>) -> Option<(NewsItem, f64)> {
    let vote_id = row.select(&selectors.vote).next()?.value().attr("id")?;
    let id = vote_id.strip_prefix("vote")?.parse::<u64>().ok()?;
    let title = row
        .select(&selectors.title)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    let url = row
        .select(&selectors.link)
        .next()?
        .value()
        .attr("href")?
        .to_string();

    let points = row
        .select(&selectors.info_span)
        .next()
        .and_then(|e| e.text().collect::<String>().trim().parse::<u64>().ok())
        .unwrap_or(0);
    let comments = row
        .select(&selectors.info_link)
        .last()
        .map(|e| first_integer(&e.text().collect::<String>()))
        .unwrap_or(0);

    Some((NewsItem { id, title, url }, popularity(points, comments)))
}

fn first_integer(text: &str) -> u64 {
    FIRST_INTEGER
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
