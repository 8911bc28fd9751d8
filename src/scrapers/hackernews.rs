//! HackerNews front page parser.
//!
//! Each story is a `tr.submission` row (its `id` attribute is the item id)
//! followed by a row whose `td.subtext` carries the points and the comment
//! link. The two selections are zipped in document order.

use super::popularity;
use crate::models::NewsItem;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

struct Selectors {
    title_link: Selector,
    score: Selector,
    subline_link: Selector,
}

/// Parse the front page into `(item, score)` pairs in listing order.
pub fn parse_listing(html: &str) -> Vec<(NewsItem, f64)> {
    let document = Html::parse_document(html);
    let submission_selector = Selector::parse("tr.submission").unwrap();
    let subtext_selector = Selector::parse("tr td.subtext").unwrap();
    let selectors = Selectors {
        title_link: Selector::parse(".title a").unwrap(),
        score: Selector::parse(".score").unwrap(),
        subline_link: Selector::parse(".subline a").unwrap(),
    };

    let items: Vec<(NewsItem, f64)> = document
        .select(&submission_selector)
        .zip(document.select(&subtext_selector))
        .filter_map(|(submission, subtext)| {
            let parsed = map_row(&selectors, submission, subtext);
            if parsed.is_none() {
                warn!(row = ?submission.value().attr("id"), "Skipping malformed HackerNews row");
            }
            parsed
        })
        .collect();
    debug!(count = items.len(), "Parsed HackerNews listing");
    items
}

fn map_row(
    selectors: &Selectors,
    submission: ElementRef<'_>,
    subtext: ElementRef<'_>,
) -> Option<(NewsItem, f64)> {
    let id = submission.value().attr("id")?.parse::<u64>().ok()?;
    let link = submission.select(&selectors.title_link).next()?;
    let title = link.text().collect::<String>().trim().to_string();
    let url = link.value().attr("href")?.to_string();

    let points = subtext
        .select(&selectors.score)
        .next()
        .map(|e| leading_number(&e.text().collect::<String>()))
        .unwrap_or(0);
    // The last subline link reads "N comments", or "discuss" when there are none.
    let comments = subtext
        .select(&selectors.subline_link)
        .last()
        .map(|e| leading_number(&e.text().collect::<String>()))
        .unwrap_or(0);

    Some((NewsItem { id, title, url }, popularity(points, comments)))
}

fn leading_number(text: &str) -> u64 {
    text.split_whitespace()
        .next()
        .and_then(|word| word.parse().ok())
        .unwrap_or(0)
}
