use crate::error::{Result, ScraperError};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// One exhibition as an adapter sees it on the list and detail pages,
/// before any language-model extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub title: String,
    pub source_url: String,
    /// Period exactly as printed on the page, kept for extraction and debugging
    pub period_text: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub raw_description: String,
    pub artists: Vec<String>,
    pub location: Option<String>,
    pub image_urls: Vec<String>,
}

impl ListingEntry {
    pub fn new(title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_url: source_url.into(),
            ..Default::default()
        }
    }

    pub fn add_artist(&mut self, name: &str) {
        push_unique(&mut self.artists, name);
    }

    pub fn add_image(&mut self, url: &str) {
        push_unique(&mut self.image_urls, url);
    }
}

/// Fields returned by the language-model extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub artists: Vec<String>,
    pub location: Option<String>,
    /// Exhibition period text, e.g. "2025.11.26 ~ 2025.12.15"
    pub period: Option<String>,
    /// Opening hours text, e.g. "10:00 ~ 18:00"
    pub hours: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// Structured fields came from the extractor
    Extracted,
    /// The extractor failed; only raw text is stored
    Fallback,
    /// Extraction was not requested for this gallery or run
    Disabled,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Extracted => "extracted",
            ExtractionStatus::Fallback => "fallback",
            ExtractionStatus::Disabled => "disabled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "extracted" => Some(ExtractionStatus::Extracted),
            "fallback" => Some(ExtractionStatus::Fallback),
            "disabled" => Some(ExtractionStatus::Disabled),
            _ => None,
        }
    }
}

/// Persisted exhibition row, unique on (gallery_name, source_url)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exhibition {
    pub id: Uuid,
    pub gallery_name: String,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub raw_description: String,
    pub description: Option<String>,
    pub artists: Vec<String>,
    pub location: Option<String>,
    pub image_urls: Vec<String>,
    pub source_url: String,
    pub extraction_status: ExtractionStatus,
    pub content_hash: String,
    pub collected_at: DateTime<Utc>,
}

impl Exhibition {
    /// Deterministic id for a (gallery, source URL) pair
    pub fn record_id(gallery_name: &str, source_url: &str) -> Uuid {
        let key = format!("{}\n{}", gallery_name, source_url);
        Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes())
    }

    pub fn content_hash(text: &str) -> String {
        hex::encode(Sha256::digest(text.as_bytes()))
    }

    /// Build a record from listing data alone; the extraction status says why
    /// no structured fields were merged.
    pub fn from_listing(gallery_name: &str, entry: &ListingEntry, status: ExtractionStatus) -> Self {
        Self {
            id: Self::record_id(gallery_name, &entry.source_url),
            gallery_name: gallery_name.to_string(),
            title: entry.title.clone(),
            start_date: entry.start_date,
            end_date: entry.end_date,
            open_time: entry.open_time,
            close_time: entry.close_time,
            raw_description: entry.raw_description.clone(),
            description: None,
            artists: entry.artists.clone(),
            location: entry.location.clone(),
            image_urls: entry.image_urls.clone(),
            source_url: entry.source_url.clone(),
            extraction_status: status,
            content_hash: Self::content_hash(&entry.raw_description),
            collected_at: Utc::now(),
        }
    }

    /// The identity columns must be present before anything reaches storage.
    pub fn validate(&self) -> Result<()> {
        if self.gallery_name.trim().is_empty() {
            return Err(ScraperError::MissingField("gallery_name".into()));
        }
        if self.source_url.trim().is_empty() {
            return Err(ScraperError::MissingField("source_url".into()));
        }
        Ok(())
    }
}

/// Outcome of a deduplicated insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Duplicate,
}

/// Append `value` (trimmed) unless it is blank or already present.
pub fn push_unique(values: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() || values.iter().any(|v| v == value) {
        return;
    }
    values.push(value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_is_stable_per_gallery_and_url() {
        let a = Exhibition::record_id("갤러리밈", "http://www.gallerymeme.com/web/exbView.html?idx=1");
        let b = Exhibition::record_id("갤러리밈", "http://www.gallerymeme.com/web/exbView.html?idx=1");
        let c = Exhibition::record_id("노화랑", "http://www.gallerymeme.com/web/exbView.html?idx=1");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn validate_rejects_blank_identity() {
        let entry = ListingEntry::new("Title", "  ");
        let record = Exhibition::from_listing("갤러리은", &entry, ExtractionStatus::Disabled);
        assert!(record.validate().is_err());

        let entry = ListingEntry::new("Title", "https://galleryeun.com/1");
        let record = Exhibition::from_listing("", &entry, ExtractionStatus::Disabled);
        assert!(record.validate().is_err());
    }

    #[test]
    fn push_unique_keeps_first_occurrence_order() {
        let mut v = Vec::new();
        push_unique(&mut v, " 김철수 ");
        push_unique(&mut v, "이영희");
        push_unique(&mut v, "김철수");
        push_unique(&mut v, "");
        assert_eq!(v, vec!["김철수".to_string(), "이영희".to_string()]);
    }

    #[test]
    fn extraction_status_round_trips_through_text() {
        for status in [
            ExtractionStatus::Extracted,
            ExtractionStatus::Fallback,
            ExtractionStatus::Disabled,
        ] {
            assert_eq!(ExtractionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ExtractionStatus::parse("unknown"), None);
    }
}
