//! Page fetching. Static galleries go through a plain HTTP GET, dynamic ones
//! through a rendered browser session when the `browser` feature is built.

#[cfg(feature = "browser")]
pub mod browser;
pub mod fixture;
pub mod http;

use crate::error::Result;
use crate::registry::{FetchMode, InteractionStep};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

pub use fixture::FixtureFetcher;
pub use http::HttpFetcher;

/// Retrieves the HTML of one page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Fetch `url`, running `interactions` first when the fetcher can.
    async fn fetch(&self, url: &str, interactions: &[InteractionStep]) -> Result<String>;
}

/// The fetchers available to a run, picked per gallery by fetch mode.
#[derive(Clone)]
pub struct Fetchers {
    static_fetcher: Arc<dyn PageFetcher>,
    dynamic_fetcher: Option<Arc<dyn PageFetcher>>,
}

impl Fetchers {
    pub fn new(static_fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            static_fetcher,
            dynamic_fetcher: None,
        }
    }

    pub fn with_dynamic(mut self, dynamic_fetcher: Arc<dyn PageFetcher>) -> Self {
        self.dynamic_fetcher = Some(dynamic_fetcher);
        self
    }

    /// One fetcher serving both modes, e.g. a fixture replay.
    pub fn single(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            static_fetcher: fetcher.clone(),
            dynamic_fetcher: Some(fetcher),
        }
    }

    /// Without a browser, dynamic galleries fall back to the static fetcher;
    /// many of them still serve usable server-side HTML.
    pub fn for_mode(&self, mode: FetchMode) -> Arc<dyn PageFetcher> {
        match (mode, &self.dynamic_fetcher) {
            (FetchMode::Dynamic, Some(dynamic)) => dynamic.clone(),
            (FetchMode::Dynamic, None) => {
                warn!(
                    "No dynamic fetcher available, using {} for a dynamic gallery",
                    self.static_fetcher.name()
                );
                self.static_fetcher.clone()
            }
            (FetchMode::Static, _) => self.static_fetcher.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl PageFetcher for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn fetch(&self, _url: &str, _interactions: &[InteractionStep]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn dynamic_galleries_fall_back_to_static_without_a_browser() {
        let fetchers = Fetchers::new(Arc::new(Named("http")));
        assert_eq!(fetchers.for_mode(FetchMode::Static).name(), "http");
        assert_eq!(fetchers.for_mode(FetchMode::Dynamic).name(), "http");
    }

    #[test]
    fn dynamic_galleries_use_the_browser_when_present() {
        let fetchers = Fetchers::new(Arc::new(Named("http"))).with_dynamic(Arc::new(Named("browser")));
        assert_eq!(fetchers.for_mode(FetchMode::Static).name(), "http");
        assert_eq!(fetchers.for_mode(FetchMode::Dynamic).name(), "browser");
    }

    #[tokio::test]
    async fn single_fetcher_serves_both_modes() {
        let fetchers = Fetchers::single(Arc::new(Named("fixture")));
        for mode in [FetchMode::Static, FetchMode::Dynamic] {
            assert_eq!(fetchers.for_mode(mode).fetch("https://a.test", &[]).await.unwrap(), "fixture");
        }
    }
}
