use super::PageFetcher;
use crate::error::{Result, ScraperError};
use crate::registry::InteractionStep;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Headless Chromium session for galleries that render with JavaScript
pub struct BrowserFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserFetcher {
    pub async fn launch() -> Result<Self> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(|e| ScraperError::Config(format!("Invalid browser config: {}", e)))?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::Config(format!("Failed to launch browser: {}", e)))?;

        // The CDP event loop must be polled for the browser to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!("Launched headless browser");
        Ok(Self { browser, handler })
    }

    async fn run_step(page: &Page, url: &str, step: &InteractionStep) -> Result<()> {
        debug!("Running interaction {:?}", step);
        match step {
            InteractionStep::Click { selector } => {
                let element = page.find_element(selector.as_str()).await.map_err(|e| fetch_err(url, e))?;
                element.click().await.map_err(|e| fetch_err(url, e))?;
            }
            InteractionStep::ScrollToBottom { times } => {
                for _ in 0..*times {
                    page.evaluate(SCROLL_SCRIPT).await.map_err(|e| fetch_err(url, e))?;
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
            InteractionStep::WaitFor { selector, timeout_ms } => {
                let deadline = Instant::now() + Duration::from_millis(*timeout_ms);
                loop {
                    if page.find_element(selector.as_str()).await.is_ok() {
                        break;
                    }
                    if Instant::now() >= deadline {
                        warn!("Selector {} did not appear within {}ms", selector, timeout_ms);
                        break;
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
            InteractionStep::WaitMs { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
        }
        Ok(())
    }
}

impl Drop for BrowserFetcher {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    fn name(&self) -> &'static str {
        "browser"
    }

    #[instrument(skip(self, interactions))]
    async fn fetch(&self, url: &str, interactions: &[InteractionStep]) -> Result<String> {
        info!("Rendering {}", url);
        let page = self.browser.new_page(url).await.map_err(|e| fetch_err(url, e))?;

        let rendered = async {
            page.wait_for_navigation().await.map_err(|e| fetch_err(url, e))?;
            for step in interactions {
                Self::run_step(&page, url, step).await?;
            }
            page.content().await.map_err(|e| fetch_err(url, e))
        }
        .await;

        // The tab is closed whether or not rendering succeeded
        if let Err(e) = page.close().await {
            warn!("Failed to close page {}: {}", url, e);
        }
        rendered
    }
}

fn fetch_err(url: &str, e: impl std::fmt::Display) -> ScraperError {
    ScraperError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "needs a local Chromium"]
    async fn failed_interaction_still_closes_the_tab() {
        let fetcher = BrowserFetcher::launch().await.unwrap();
        let before = fetcher.browser.pages().await.unwrap().len();

        let steps = [InteractionStep::Click {
            selector: "#not-on-this-page".to_string(),
        }];
        let result = fetcher.fetch("data:text/html,<p>hi</p>", &steps).await;
        assert!(matches!(result, Err(ScraperError::Fetch { .. })));

        assert_eq!(fetcher.browser.pages().await.unwrap().len(), before);
    }
}
