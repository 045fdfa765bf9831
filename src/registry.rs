use crate::constants::gallery_display_name;
use crate::error::{Result, ScraperError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Exhibition content is present in the initial HTML response
    Static,
    /// Content needs script-driven rendering before it appears
    Dynamic,
}

/// One step of a browser interaction script, run in order after navigation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InteractionStep {
    Click { selector: String },
    ScrollToBottom {
        #[serde(default = "default_scroll_times")]
        times: u32,
    },
    WaitFor {
        selector: String,
        #[serde(default = "default_wait_timeout_ms")]
        timeout_ms: u64,
    },
    WaitMs { ms: u64 },
}

fn default_scroll_times() -> u32 {
    1
}

fn default_wait_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GalleryConfig {
    pub gallery_id: String,
    pub name: String,
    pub list_url: String,
    pub fetch_mode: FetchMode,
    /// Interaction script for the list page; detail pages only get the fixed pauses
    #[serde(default)]
    pub interactions: Vec<InteractionStep>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub fetch_details: bool,
    #[serde(default)]
    pub use_ai: bool,
    pub default_location: Option<String>,
    /// Opening hours printed for the whole gallery, e.g. "AM 10:00 ~ PM 19:00"
    pub default_hours: Option<String>,
}

fn default_true() -> bool {
    true
}

impl GalleryConfig {
    /// Steps replayed on detail pages. List-page selectors rarely exist there,
    /// so only fixed pauses carry over.
    pub fn detail_interactions(&self) -> Vec<InteractionStep> {
        self.interactions
            .iter()
            .filter(|step| matches!(step, InteractionStep::WaitMs { .. }))
            .cloned()
            .collect()
    }
}

/// Gallery configurations keyed by id, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct GalleryRegistry {
    galleries: BTreeMap<String, GalleryConfig>,
}

impl GalleryRegistry {
    /// Load all gallery configurations from the registry directory
    pub fn load_from_directory<P: AsRef<Path>>(registry_dir: P) -> Result<Self> {
        let dir_path = registry_dir.as_ref();
        if !dir_path.exists() {
            return Err(ScraperError::Config(format!(
                "Registry directory does not exist: {}",
                dir_path.display()
            )));
        }

        let mut galleries = BTreeMap::new();
        for entry in fs::read_dir(dir_path)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            let config: GalleryConfig = serde_json::from_str(&content).map_err(|e| {
                ScraperError::Config(format!(
                    "Failed to parse gallery config {}: {}",
                    path.display(),
                    e
                ))
            })?;
            if config.name.trim().is_empty() {
                return Err(ScraperError::Config(format!(
                    "Gallery config {} has an empty name",
                    path.display()
                )));
            }
            match gallery_display_name(&config.gallery_id) {
                None => warn!("No adapter for gallery '{}'; it will fail when run", config.gallery_id),
                Some(known) if known != config.name => warn!(
                    "Gallery '{}' is named '{}' in {} (usually '{}')",
                    config.gallery_id,
                    config.name,
                    path.display(),
                    known
                ),
                Some(_) => {}
            }
            galleries.insert(config.gallery_id.clone(), config);
        }

        info!("Loaded {} gallery configurations", galleries.len());
        Ok(Self { galleries })
    }

    pub fn from_configs(configs: Vec<GalleryConfig>) -> Self {
        Self {
            galleries: configs
                .into_iter()
                .map(|c| (c.gallery_id.clone(), c))
                .collect(),
        }
    }

    pub fn get(&self, gallery_id: &str) -> Option<&GalleryConfig> {
        self.galleries.get(gallery_id)
    }

    /// All enabled galleries, ordered by id
    pub fn enabled(&self) -> Vec<&GalleryConfig> {
        self.galleries.values().filter(|g| g.enabled).collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &GalleryConfig> {
        self.galleries.values()
    }

    /// Resolve a user-supplied selection. Unknown ids are returned separately
    /// so the caller can report them; duplicates keep their first position.
    pub fn select(&self, ids: &[String]) -> (Vec<&GalleryConfig>, Vec<String>) {
        let mut selected: Vec<&GalleryConfig> = Vec::new();
        let mut unknown = Vec::new();
        for id in ids {
            match self.galleries.get(id) {
                Some(config) => {
                    if !selected.iter().any(|c| c.gallery_id == config.gallery_id) {
                        selected.push(config);
                    }
                }
                None => unknown.push(id.clone()),
            }
        }
        (selected, unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MEME: &str = r#"{
        "gallery_id": "gallery_meme",
        "name": "갤러리밈",
        "list_url": "http://www.gallerymeme.com/web/current.html",
        "fetch_mode": "static",
        "fetch_details": true,
        "default_hours": "10:30 ~ 18:30"
    }"#;

    const EUN: &str = r#"{
        "gallery_id": "gallery_eun",
        "name": "갤러리은",
        "list_url": "https://galleryeun.com/index.php",
        "fetch_mode": "dynamic",
        "enabled": false,
        "interactions": [
            {"action": "wait_for", "selector": ".slick-list .slick-slide"},
            {"action": "scroll_to_bottom", "times": 2},
            {"action": "click", "selector": ".more"},
            {"action": "wait_ms", "ms": 500}
        ]
    }"#;

    fn write(dir: &Path, name: &str, body: &str) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn loads_json_files_and_ignores_others() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "gallery_meme.json", MEME);
        write(dir.path(), "gallery_eun.json", EUN);
        write(dir.path(), "README.md", "not a config");

        let registry = GalleryRegistry::load_from_directory(dir.path()).unwrap();
        assert_eq!(registry.all().count(), 2);

        let meme = registry.get("gallery_meme").unwrap();
        assert_eq!(meme.fetch_mode, FetchMode::Static);
        assert!(meme.enabled);
        assert!(meme.interactions.is_empty());

        let eun = registry.get("gallery_eun").unwrap();
        assert_eq!(eun.fetch_mode, FetchMode::Dynamic);
        assert_eq!(
            eun.interactions[0],
            InteractionStep::WaitFor {
                selector: ".slick-list .slick-slide".into(),
                timeout_ms: 5_000
            }
        );
        assert_eq!(eun.interactions[1], InteractionStep::ScrollToBottom { times: 2 });
        assert_eq!(eun.detail_interactions(), vec![InteractionStep::WaitMs { ms: 500 }]);

        let enabled: Vec<_> = registry.enabled().iter().map(|g| g.gallery_id.clone()).collect();
        assert_eq!(enabled, vec!["gallery_meme".to_string()]);
    }

    #[test]
    fn blank_gallery_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "blank.json", &MEME.replace("갤러리밈", " "));
        let err = GalleryRegistry::load_from_directory(dir.path()).unwrap_err();
        assert!(matches!(err, ScraperError::Config(_)));
    }

    #[test]
    fn missing_directory_is_a_config_error() {
        let err = GalleryRegistry::load_from_directory("/definitely/not/here").unwrap_err();
        assert!(matches!(err, ScraperError::Config(_)));
    }

    #[test]
    fn select_dedupes_and_reports_unknown() {
        let registry = GalleryRegistry::from_configs(vec![serde_json::from_str(MEME).unwrap()]);
        let ids = vec![
            "gallery_meme".to_string(),
            "nope".to_string(),
            "gallery_meme".to_string(),
        ];
        let (selected, unknown) = registry.select(&ids);
        assert_eq!(selected.len(), 1);
        assert_eq!(unknown, vec!["nope".to_string()]);
    }
}
