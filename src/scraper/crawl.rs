use crate::model::{ScrapedListing, ScraperError};
use crate::parser::{Parser, ShopParser};
use crate::scraper::Scraper;

use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub struct CrawlOptions {
    pub base_url: String,
    /// Pause before every category request.
    pub delay: Duration,
}

/// Walks every category page linked from the home page and collects priced
/// listings, first occurrence of each (name, price) pair only.
///
/// Only a failed home page aborts the crawl; a failing category page is skipped.
pub async fn crawl_listings(
    scraper: &dyn Scraper,
    parser: &ShopParser,
    options: &CrawlOptions,
) -> Result<Vec<ScrapedListing>, ScraperError> {
    info!("Fetching home page {}", options.base_url);
    let home = scraper.fetch(&options.base_url).await?;
    let categories = parser.category_links(&home, &options.base_url);
    info!("Found {} category pages", categories.len());

    let mut seen = HashSet::new();
    let mut listings = Vec::new();

    for url in &categories {
        sleep(options.delay).await;

        let html = match scraper.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                continue;
            }
        };
        let parsed = match parser.parse_listings(&html, url) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Parse error on {}: {}", url, e);
                continue;
            }
        };

        let before = listings.len();
        for listing in parsed {
            let (Some(name), Some(price)) = (&listing.name, listing.price) else {
                debug!("Listing without name or price at {}", listing.product_url);
                continue;
            };
            if seen.insert((name.to_lowercase(), format!("{price:.2}"))) {
                listings.push(listing);
            }
        }
        info!("{}: {} new listings", url, listings.len() - before);
    }

    info!("Crawl finished with {} listings", listings.len());
    Ok(listings)
}
