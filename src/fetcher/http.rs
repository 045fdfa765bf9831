use super::PageFetcher;
use crate::config::FetcherConfig;
use crate::error::{Result, ScraperError};
use crate::registry::InteractionStep;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Plain HTTP GET with a browser-like User-Agent
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self, interactions))]
    async fn fetch(&self, url: &str, interactions: &[InteractionStep]) -> Result<String> {
        if !interactions.is_empty() {
            debug!("Ignoring {} interaction steps for static fetch", interactions.len());
        }

        info!("HTTP GET request to: {}", url);
        let response = self
            .client
            .get(url)
            .header("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("accept-language", "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7")
            .send()
            .await
            .map_err(|e| ScraperError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::Fetch {
                url: url.to_string(),
                message: format!("unexpected status {}", status),
            });
        }

        // reqwest decodes using the charset from Content-Type (several sites are EUC-KR)
        let body = response.text().await.map_err(|e| ScraperError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        info!("HTTP response: status={}, size={} bytes", status, body.len());
        Ok(body)
    }
}
