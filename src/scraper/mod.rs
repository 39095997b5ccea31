pub mod crawl;
pub mod fetcher;
pub mod traits;

pub use crawl::{CrawlOptions, crawl_listings};
pub use fetcher::ScraperImpl;
pub use traits::Scraper;
