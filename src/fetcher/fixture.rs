use super::PageFetcher;
use crate::error::{Result, ScraperError};
use crate::registry::InteractionStep;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Serves saved HTML by URL for offline, repeatable runs.
///
/// A fixture directory holds the HTML files plus a `manifest.json` mapping
/// each URL to a file name in the same directory.
#[derive(Debug, Clone, Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.insert(url.into(), html.into());
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert(url, html);
        self
    }

    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let manifest_path = dir.join("manifest.json");
        let manifest = fs::read_to_string(&manifest_path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read fixture manifest {}: {}",
                manifest_path.display(),
                e
            ))
        })?;
        let entries: HashMap<String, String> = serde_json::from_str(&manifest)?;

        let mut fetcher = Self::new();
        for (url, file) in entries {
            let html = fs::read_to_string(dir.join(&file))?;
            fetcher.insert(url, html);
        }
        Ok(fetcher)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn fetch(&self, url: &str, _interactions: &[InteractionStep]) -> Result<String> {
        debug!("Serving fixture for {}", url);
        self.pages.get(url).cloned().ok_or_else(|| ScraperError::Fetch {
            url: url.to_string(),
            message: "no fixture recorded for this URL".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_recorded_pages_and_rejects_unknown() {
        let fetcher = FixtureFetcher::new().with_page("https://a.test/list", "<p>hi</p>");
        assert_eq!(fetcher.fetch("https://a.test/list", &[]).await.unwrap(), "<p>hi</p>");
        assert!(matches!(
            fetcher.fetch("https://a.test/other", &[]).await,
            Err(ScraperError::Fetch { .. })
        ));
    }

    #[test]
    fn loads_manifest_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("list.html"), "<ul></ul>").unwrap();
        fs::write(
            dir.path().join("manifest.json"),
            r#"{"https://a.test/list": "list.html"}"#,
        )
        .unwrap();

        let fetcher = FixtureFetcher::from_dir(dir.path()).unwrap();
        assert_eq!(fetcher.len(), 1);
    }
}
