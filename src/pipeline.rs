use crate::adapters::{create_adapter, GalleryAdapter};
use crate::dates::{parse_hours, parse_period};
use crate::error::{Result, ScraperError};
use crate::extractor::ExhibitionExtractor;
use crate::fetcher::{Fetchers, PageFetcher};
use crate::observability::metrics;
use crate::registry::{GalleryConfig, InteractionStep};
use crate::storage::ExhibitionStore;
use crate::types::{Exhibition, ExtractedFields, ExtractionStatus, ListingEntry, UpsertOutcome};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

/// Listing entries of one gallery plus the detail pages that could not be read
#[derive(Debug, Default)]
pub struct CollectedListing {
    pub entries: Vec<ListingEntry>,
    pub detail_errors: Vec<String>,
}

/// Result of processing one gallery
#[derive(Debug, Clone, Default, Serialize)]
pub struct GalleryRunResult {
    pub gallery_id: String,
    pub gallery_name: String,
    pub entries_found: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub extracted: usize,
    pub fallbacks: usize,
    /// Set when the list page could not be fetched or parsed
    pub failure: Option<String>,
    pub errors: Vec<String>,
    pub output_file: Option<String>,
    pub duration_secs: f64,
}

impl GalleryRunResult {
    fn new(gallery: &GalleryConfig) -> Self {
        Self {
            gallery_id: gallery.gallery_id.clone(),
            gallery_name: gallery.name.clone(),
            ..Default::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Result of a complete run over several galleries
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub galleries: Vec<GalleryRunResult>,
}

impl RunSummary {
    pub fn total_inserted(&self) -> usize {
        self.galleries.iter().map(|g| g.inserted).sum()
    }

    pub fn total_duplicates(&self) -> usize {
        self.galleries.iter().map(|g| g.duplicates).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.galleries.iter().map(|g| g.skipped).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.galleries.iter().map(|g| g.errors.len()).sum()
    }

    pub fn failed_galleries(&self) -> Vec<&str> {
        self.galleries
            .iter()
            .filter(|g| g.is_failed())
            .map(|g| g.gallery_id.as_str())
            .collect()
    }
}

/// Fetch, parse, extract and store exhibitions, one gallery at a time.
pub struct Pipeline {
    fetchers: Fetchers,
    store: Arc<dyn ExhibitionStore>,
    extractor: Option<Arc<dyn ExhibitionExtractor>>,
    delay: Duration,
    require_end_date: bool,
    json_dir: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(fetchers: Fetchers, store: Arc<dyn ExhibitionStore>) -> Self {
        Self {
            fetchers,
            store,
            extractor: None,
            delay: Duration::ZERO,
            require_end_date: true,
            json_dir: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn ExhibitionExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Pause between consecutive requests to the same gallery
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_require_end_date(mut self, require: bool) -> Self {
        self.require_end_date = require;
        self
    }

    /// Write a JSON snapshot per gallery into `dir`
    pub fn with_json_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.json_dir = Some(dir.into());
        self
    }

    /// Process galleries in order. A failing gallery is recorded and the
    /// run moves on to the next one.
    pub async fn run(&self, galleries: &[&GalleryConfig]) -> RunSummary {
        let started_at = Utc::now();
        let mut results = Vec::with_capacity(galleries.len());
        for gallery in galleries {
            let span = info_span!("gallery", id = %gallery.gallery_id);
            let result = self.run_gallery(gallery).instrument(span).await;
            results.push(result);
        }
        RunSummary {
            started_at,
            finished_at: Utc::now(),
            galleries: results,
        }
    }

    pub async fn run_gallery(&self, gallery: &GalleryConfig) -> GalleryRunResult {
        let started = Instant::now();
        let mut result = GalleryRunResult::new(gallery);
        metrics::gallery_started(&gallery.gallery_id);
        info!("🎨 Collecting {} ({})", gallery.name, gallery.gallery_id);

        let collected = match self.collect_entries(gallery).await {
            Ok(collected) => collected,
            Err(e) => {
                error!("Skipping {}: {}", gallery.gallery_id, e);
                metrics::gallery_failed(&gallery.gallery_id);
                result.failure = Some(e.to_string());
                result.duration_secs = started.elapsed().as_secs_f64();
                return result;
            }
        };
        result.entries_found = collected.entries.len();
        result.errors.extend(collected.detail_errors);

        let mut records = Vec::with_capacity(collected.entries.len());
        for entry in collected.entries {
            let exhibition = self.build_exhibition(gallery, entry).await;
            match exhibition.extraction_status {
                ExtractionStatus::Extracted => result.extracted += 1,
                ExtractionStatus::Fallback => result.fallbacks += 1,
                ExtractionStatus::Disabled => {}
            }

            if let Some(reason) = self.skip_reason(&exhibition) {
                debug!("Skipping {}: {}", exhibition.source_url, reason);
                metrics::load::skipped(&gallery.gallery_id);
                result.skipped += 1;
                records.push(exhibition);
                continue;
            }

            match self.store_exhibition(&exhibition).await {
                Ok(UpsertOutcome::Inserted) => {
                    metrics::load::inserted(&gallery.gallery_id);
                    result.inserted += 1;
                }
                Ok(UpsertOutcome::Duplicate) => {
                    metrics::load::duplicate(&gallery.gallery_id);
                    result.duplicates += 1;
                }
                Err(e) => {
                    warn!("Failed to store {}: {}", exhibition.source_url, e);
                    metrics::load::error(&gallery.gallery_id);
                    result.errors.push(format!("{}: {}", exhibition.source_url, e));
                }
            }
            records.push(exhibition);
        }

        if let Some(dir) = &self.json_dir {
            match persist_to_json(&records, &gallery.gallery_id, dir) {
                Ok(path) => {
                    info!("💾 Saved {} records to {}", records.len(), path);
                    result.output_file = Some(path);
                }
                Err(e) => warn!("Failed to write JSON snapshot: {}", e),
            }
        }

        let elapsed = started.elapsed();
        metrics::gallery_finished(&gallery.gallery_id, elapsed);
        result.duration_secs = elapsed.as_secs_f64();
        info!(
            inserted = result.inserted,
            duplicates = result.duplicates,
            skipped = result.skipped,
            errors = result.errors.len(),
            "Finished {}",
            gallery.gallery_id
        );
        result
    }

    /// Fetch the list page, parse it and enrich each entry from its detail
    /// page. Only a list-page failure is an error.
    #[instrument(skip(self, gallery), fields(gallery = %gallery.gallery_id))]
    pub async fn collect_entries(&self, gallery: &GalleryConfig) -> Result<CollectedListing> {
        let adapter = create_adapter(&gallery.gallery_id).ok_or_else(|| {
            ScraperError::Config(format!("No adapter for gallery '{}'", gallery.gallery_id))
        })?;
        let list_url = Url::parse(&gallery.list_url).map_err(|e| {
            ScraperError::Config(format!("Invalid list_url '{}': {}", gallery.list_url, e))
        })?;
        let fetcher = self.fetchers.for_mode(gallery.fetch_mode);

        let html = self
            .fetch_page(fetcher.as_ref(), &gallery.gallery_id, list_url.as_str(), &gallery.interactions)
            .await?;
        let mut entries = adapter.parse_listing(&html, &list_url)?;
        metrics::entries_parsed(&gallery.gallery_id, entries.len());
        info!("Found {} exhibitions on the list page", entries.len());

        let mut collected = CollectedListing::default();
        if gallery.fetch_details {
            let detail_steps = gallery.detail_interactions();
            for entry in entries.iter_mut() {
                if let Err(e) = self
                    .enrich_from_detail(adapter.as_ref(), fetcher.as_ref(), gallery, entry, &detail_steps)
                    .await
                {
                    warn!("Keeping list data for {}: {}", entry.source_url, e);
                    collected.detail_errors.push(format!("{}: {}", entry.source_url, e));
                }
            }
        }

        for entry in entries.iter_mut() {
            apply_gallery_defaults(gallery, entry);
        }
        collected.entries = entries;
        Ok(collected)
    }

    async fn enrich_from_detail(
        &self,
        adapter: &dyn GalleryAdapter,
        fetcher: &dyn PageFetcher,
        gallery: &GalleryConfig,
        entry: &mut ListingEntry,
        steps: &[InteractionStep],
    ) -> Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let detail_url = Url::parse(&entry.source_url).map_err(|e| ScraperError::Parse(
            format!("Invalid detail URL '{}': {}", entry.source_url, e),
        ))?;
        let html = self
            .fetch_page(fetcher, &gallery.gallery_id, detail_url.as_str(), steps)
            .await?;

        // Parse into a copy so a failing parse keeps the list data intact
        let mut enriched = entry.clone();
        adapter.parse_detail(&html, &detail_url, &mut enriched)?;
        *entry = enriched;
        Ok(())
    }

    async fn fetch_page(
        &self,
        fetcher: &dyn PageFetcher,
        gallery_id: &str,
        url: &str,
        steps: &[InteractionStep],
    ) -> Result<String> {
        let started = Instant::now();
        match fetcher.fetch(url, steps).await {
            Ok(html) => {
                metrics::fetch::page_success(gallery_id, started.elapsed());
                debug!("Fetched {} ({} bytes) via {}", url, html.len(), fetcher.name());
                Ok(html)
            }
            Err(e) => {
                metrics::fetch::page_error(gallery_id);
                Err(e)
            }
        }
    }

    /// Turn a listing entry into a record, running extraction when the
    /// gallery asks for it. Extraction failures degrade to a raw-text record.
    async fn build_exhibition(&self, gallery: &GalleryConfig, mut entry: ListingEntry) -> Exhibition {
        let extractor = match (&self.extractor, gallery.use_ai) {
            (Some(extractor), true) => extractor,
            _ => return Exhibition::from_listing(&gallery.name, &entry, ExtractionStatus::Disabled),
        };

        let text = extraction_input(&entry);
        match extractor.extract(&text, &entry.image_urls).await {
            Ok(fields) => {
                metrics::extraction::success(&gallery.gallery_id);
                let description = merge_extracted(&mut entry, fields);
                let mut exhibition =
                    Exhibition::from_listing(&gallery.name, &entry, ExtractionStatus::Extracted);
                exhibition.description = description;
                exhibition
            }
            Err(e) => {
                warn!("Extraction failed for {}, storing raw text: {}", entry.source_url, e);
                metrics::extraction::fallback(&gallery.gallery_id);
                Exhibition::from_listing(&gallery.name, &entry, ExtractionStatus::Fallback)
            }
        }
    }

    /// Records the exhibition table cannot hold. Fallback records are kept
    /// regardless of dates so their raw text is never lost.
    fn skip_reason(&self, exhibition: &Exhibition) -> Option<&'static str> {
        if exhibition.raw_description.trim().is_empty() {
            return Some("empty description");
        }
        if self.require_end_date
            && exhibition.end_date.is_none()
            && exhibition.extraction_status != ExtractionStatus::Fallback
        {
            return Some("no end date");
        }
        None
    }

    async fn store_exhibition(&self, exhibition: &Exhibition) -> Result<UpsertOutcome> {
        exhibition.validate()?;
        self.store.upsert(exhibition).await
    }
}

/// Gallery-wide hours and address fill what the pages leave out.
fn apply_gallery_defaults(gallery: &GalleryConfig, entry: &mut ListingEntry) {
    if entry.open_time.is_none() {
        if let Some(hours) = &gallery.default_hours {
            (entry.open_time, entry.close_time) = parse_hours(hours);
        }
    }
    if entry.location.is_none() {
        entry.location = gallery.default_location.clone();
    }
}

/// Text handed to the extractor: the description, prefixed with whatever
/// the listing already knows.
fn extraction_input(entry: &ListingEntry) -> String {
    let mut parts = Vec::new();
    if !entry.title.is_empty() {
        parts.push(entry.title.as_str());
    }
    if !entry.period_text.is_empty() {
        parts.push(entry.period_text.as_str());
    }
    parts.push(entry.raw_description.as_str());
    parts.join("\n")
}

/// Fill gaps in the entry from extracted fields; returns the description.
fn merge_extracted(entry: &mut ListingEntry, fields: ExtractedFields) -> Option<String> {
    if entry.title.trim().is_empty() {
        if let Some(title) = fields.title {
            entry.title = title;
        }
    }
    if let Some(period) = fields.period {
        let (start, end) = parse_period(&period);
        if entry.start_date.is_none() {
            entry.start_date = start;
        }
        if entry.end_date.is_none() {
            entry.end_date = end;
        }
        if entry.period_text.is_empty() {
            entry.period_text = period;
        }
    }
    if let Some(hours) = fields.hours {
        if entry.open_time.is_none() {
            (entry.open_time, entry.close_time) = parse_hours(&hours);
        }
    }
    if entry.location.is_none() {
        entry.location = fields.location;
    }
    for artist in &fields.artists {
        entry.add_artist(artist);
    }
    fields.description
}

/// Persist processed records to a timestamped JSON file
fn persist_to_json(records: &[Exhibition], gallery_id: &str, output_dir: &Path) -> Result<String> {
    fs::create_dir_all(output_dir)?;

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("{gallery_id}_{timestamp}.json");
    let filepath = output_dir.join(&filename);

    let json_content = serde_json::to_string_pretty(records)?;
    fs::write(&filepath, json_content)?;

    Ok(filepath.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn gallery() -> GalleryConfig {
        serde_json::from_value(serde_json::json!({
            "gallery_id": "gallery_eun",
            "name": "갤러리은",
            "list_url": "https://galleryeun.com/index.php",
            "fetch_mode": "dynamic",
            "default_location": "서울 종로구 인사동길 45-1",
            "default_hours": "AM 10:30 ~ PM 18:30(연중무휴)"
        }))
        .unwrap()
    }

    #[test]
    fn defaults_fill_missing_hours_and_location() {
        let mut entry = ListingEntry::new("t", "https://galleryeun.com/a");
        apply_gallery_defaults(&gallery(), &mut entry);
        assert_eq!(entry.open_time, NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(entry.close_time, NaiveTime::from_hms_opt(18, 30, 0));
        assert_eq!(entry.location.as_deref(), Some("서울 종로구 인사동길 45-1"));

        let mut located = ListingEntry::new("t", "https://galleryeun.com/b");
        located.location = Some("2층".into());
        apply_gallery_defaults(&gallery(), &mut located);
        assert_eq!(located.location.as_deref(), Some("2층"));
    }

    #[test]
    fn extracted_fields_only_fill_gaps() {
        let mut entry = ListingEntry::new("", "https://www.insa1010.com/28/?idx=1");
        entry.add_artist("김철수");
        let fields = ExtractedFields {
            title: Some("겨울 정원".into()),
            description: Some("정리된 설명".into()),
            artists: vec!["김철수".into(), "이영희".into()],
            location: Some("1층".into()),
            period: Some("2025.12.3 ~ 12.8".into()),
            hours: Some("10:00 ~ 18:00".into()),
        };
        let description = merge_extracted(&mut entry, fields);
        assert_eq!(description.as_deref(), Some("정리된 설명"));
        assert_eq!(entry.title, "겨울 정원");
        assert_eq!(entry.start_date, NaiveDate::from_ymd_opt(2025, 12, 3));
        assert_eq!(entry.end_date, NaiveDate::from_ymd_opt(2025, 12, 8));
        assert_eq!(entry.artists, vec!["김철수".to_string(), "이영희".to_string()]);
        assert_eq!(entry.open_time, NaiveTime::from_hms_opt(10, 0, 0));
        assert_eq!(entry.location.as_deref(), Some("1층"));
    }

    #[test]
    fn extraction_input_prefixes_known_fields() {
        let mut entry = ListingEntry::new("봄", "u");
        entry.period_text = "2025.3.1 ~ 3.9".into();
        entry.raw_description = "본문".into();
        assert_eq!(extraction_input(&entry), "봄\n2025.3.1 ~ 3.9\n본문");
    }

    #[test]
    fn json_snapshot_is_written_with_gallery_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let entry = ListingEntry::new("t", "https://galleryeun.com/a");
        let record = Exhibition::from_listing("갤러리은", &entry, ExtractionStatus::Disabled);
        let path = persist_to_json(&[record], "gallery_eun", dir.path()).unwrap();
        assert!(Path::new(&path)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("gallery_eun_"));
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["gallery_name"], "갤러리은");
    }
}
