use crate::model::ScraperError;
use crate::scraper::Scraper;

use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

pub struct ScraperImpl {
    client: Client,
}

impl ScraperImpl {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Scraper for ScraperImpl {
    async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        let url = Url::parse(url).map_err(|_| ScraperError::InvalidUrl(url.to_string()))?;
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::InvalidResponse {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
