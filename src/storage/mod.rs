//! Persistence of exhibitions, deduplicated on (gallery_name, source_url).

pub mod sqlite;
#[cfg(feature = "db")]
pub mod turso;

pub use sqlite::SqliteStore;
#[cfg(feature = "db")]
pub use turso::TursoStore;

use crate::error::{Result, ScraperError};
use crate::types::{Exhibition, ExtractionStatus, UpsertOutcome};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

pub(crate) const MIGRATION_SQL: &str = include_str!("../../migrations/001_create_exhibitions.sql");

pub(crate) const INSERT_SQL: &str = "INSERT INTO exhibitions (
    id, gallery_name, title, start_date, end_date, open_time, close_time,
    raw_description, description, artists, location, image_urls, source_url,
    extraction_status, content_hash, collected_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
ON CONFLICT DO NOTHING";

pub(crate) const SELECT_COLUMNS: &str = "id, gallery_name, title, start_date, end_date, open_time, close_time,
    raw_description, description, artists, location, image_urls, source_url,
    extraction_status, content_hash, collected_at";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Storage trait for exhibitions
#[async_trait]
pub trait ExhibitionStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Insert unless a row with the same (gallery_name, source_url) exists.
    async fn upsert(&self, exhibition: &Exhibition) -> Result<UpsertOutcome>;

    async fn count(&self) -> Result<usize>;

    /// Row counts keyed by gallery name, sorted by name
    async fn count_by_gallery(&self) -> Result<Vec<(String, usize)>>;

    async fn list_by_gallery(&self, gallery_name: &str) -> Result<Vec<Exhibition>>;
}

/// Column values as stored: dates and times as ISO text, lists as JSON arrays.
#[derive(Debug, Clone)]
pub(crate) struct StoredRow {
    pub id: String,
    pub gallery_name: String,
    pub title: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub raw_description: String,
    pub description: Option<String>,
    pub artists: String,
    pub location: Option<String>,
    pub image_urls: String,
    pub source_url: String,
    pub extraction_status: String,
    pub content_hash: String,
    pub collected_at: String,
}

impl StoredRow {
    pub fn from_exhibition(e: &Exhibition) -> Result<Self> {
        Ok(Self {
            id: e.id.to_string(),
            gallery_name: e.gallery_name.clone(),
            title: e.title.clone(),
            start_date: e.start_date.map(|d| d.format(DATE_FORMAT).to_string()),
            end_date: e.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
            open_time: e.open_time.map(|t| t.format(TIME_FORMAT).to_string()),
            close_time: e.close_time.map(|t| t.format(TIME_FORMAT).to_string()),
            raw_description: e.raw_description.clone(),
            description: e.description.clone(),
            artists: serde_json::to_string(&e.artists)?,
            location: e.location.clone(),
            image_urls: serde_json::to_string(&e.image_urls)?,
            source_url: e.source_url.clone(),
            extraction_status: e.extraction_status.as_str().to_string(),
            content_hash: e.content_hash.clone(),
            collected_at: e.collected_at.to_rfc3339(),
        })
    }

    pub fn into_exhibition(self) -> Result<Exhibition> {
        let corrupt = |column: &str, value: &str| ScraperError::Database {
            message: format!("Invalid {} value in exhibitions row: {}", column, value),
        };

        let date = |v: Option<String>, column: &str| -> Result<Option<NaiveDate>> {
            v.map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|_| corrupt(column, &s)))
                .transpose()
        };
        let time = |v: Option<String>, column: &str| -> Result<Option<NaiveTime>> {
            v.map(|s| NaiveTime::parse_from_str(&s, TIME_FORMAT).map_err(|_| corrupt(column, &s)))
                .transpose()
        };

        Ok(Exhibition {
            id: Uuid::parse_str(&self.id).map_err(|_| corrupt("id", &self.id))?,
            start_date: date(self.start_date, "start_date")?,
            end_date: date(self.end_date, "end_date")?,
            open_time: time(self.open_time, "open_time")?,
            close_time: time(self.close_time, "close_time")?,
            artists: serde_json::from_str(&self.artists)?,
            image_urls: serde_json::from_str(&self.image_urls)?,
            extraction_status: ExtractionStatus::parse(&self.extraction_status)
                .ok_or_else(|| corrupt("extraction_status", &self.extraction_status))?,
            collected_at: DateTime::parse_from_rfc3339(&self.collected_at)
                .map_err(|_| corrupt("collected_at", &self.collected_at))?
                .with_timezone(&Utc),
            gallery_name: self.gallery_name,
            title: self.title,
            raw_description: self.raw_description,
            description: self.description,
            location: self.location,
            source_url: self.source_url,
            content_hash: self.content_hash,
        })
    }
}

/// In-memory store for development and tests
pub struct InMemoryStore {
    rows: Arc<Mutex<HashMap<(String, String), Exhibition>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), Exhibition>>> {
        self.rows.lock().map_err(|_| ScraperError::Database {
            message: "in-memory store lock poisoned".to_string(),
        })
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExhibitionStore for InMemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&self, exhibition: &Exhibition) -> Result<UpsertOutcome> {
        exhibition.validate()?;
        let key = (exhibition.gallery_name.clone(), exhibition.source_url.clone());
        let mut rows = self.lock()?;
        if rows.contains_key(&key) {
            debug!("Duplicate exhibition skipped: {}", exhibition.source_url);
            return Ok(UpsertOutcome::Duplicate);
        }
        rows.insert(key, exhibition.clone());
        Ok(UpsertOutcome::Inserted)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    async fn count_by_gallery(&self) -> Result<Vec<(String, usize)>> {
        let mut counts = BTreeMap::new();
        for (gallery, _) in self.lock()?.keys() {
            *counts.entry(gallery.clone()).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn list_by_gallery(&self, gallery_name: &str) -> Result<Vec<Exhibition>> {
        let mut rows: Vec<Exhibition> = self
            .lock()?
            .values()
            .filter(|e| e.gallery_name == gallery_name)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.source_url.cmp(&b.source_url));
        Ok(rows)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample;
    use super::*;

    #[tokio::test]
    async fn in_memory_store_dedupes_on_gallery_and_url() {
        let store = InMemoryStore::new();
        let first = sample("갤러리밈", "http://example.com/1");
        assert_eq!(store.upsert(&first).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(store.upsert(&first).await.unwrap(), UpsertOutcome::Duplicate);

        // Same URL under another gallery is a different exhibition
        let other = sample("노화랑", "http://example.com/1");
        assert_eq!(store.upsert(&other).await.unwrap(), UpsertOutcome::Inserted);

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(
            store.count_by_gallery().await.unwrap(),
            vec![("갤러리밈".to_string(), 1), ("노화랑".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn rejects_records_without_identity() {
        let store = InMemoryStore::new();
        let blank = sample("갤러리밈", "  ");
        assert!(matches!(
            store.upsert(&blank).await,
            Err(ScraperError::MissingField(_))
        ));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[test]
    fn stored_row_round_trips_typed_columns() {
        let mut original = sample("갤러리밈", "http://example.com/2");
        original.open_time = NaiveTime::from_hms_opt(10, 30, 0);
        let restored = StoredRow::from_exhibition(&original)
            .unwrap()
            .into_exhibition()
            .unwrap();
        assert_eq!(restored.start_date, original.start_date);
        assert_eq!(restored.open_time, original.open_time);
        assert_eq!(restored.artists, original.artists);
        assert_eq!(restored.collected_at.timestamp(), original.collected_at.timestamp());
    }
}
