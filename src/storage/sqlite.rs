use super::{ExhibitionStore, StoredRow, INSERT_SQL, MIGRATION_SQL, SELECT_COLUMNS};
use crate::error::{Result, ScraperError};
use crate::types::{Exhibition, UpsertOutcome};
use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// SQLITE_CONSTRAINT_UNIQUE and SQLITE_CONSTRAINT_PRIMARYKEY extended codes
const UNIQUE_VIOLATION_CODES: [i32; 2] = [2067, 1555];

/// Local SQLite database file
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        info!("Opening exhibition database at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(MIGRATION_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| ScraperError::Database {
            message: "SQLite connection lock poisoned".to_string(),
        })
    }

    fn is_unique_violation(err: &rusqlite::Error) -> bool {
        match err {
            rusqlite::Error::SqliteFailure(e, _) => {
                e.code == ErrorCode::ConstraintViolation
                    && UNIQUE_VIOLATION_CODES.contains(&e.extended_code)
            }
            _ => false,
        }
    }

    fn read_row(row: &rusqlite::Row) -> rusqlite::Result<StoredRow> {
        Ok(StoredRow {
            id: row.get(0)?,
            gallery_name: row.get(1)?,
            title: row.get(2)?,
            start_date: row.get(3)?,
            end_date: row.get(4)?,
            open_time: row.get(5)?,
            close_time: row.get(6)?,
            raw_description: row.get(7)?,
            description: row.get(8)?,
            artists: row.get(9)?,
            location: row.get(10)?,
            image_urls: row.get(11)?,
            source_url: row.get(12)?,
            extraction_status: row.get(13)?,
            content_hash: row.get(14)?,
            collected_at: row.get(15)?,
        })
    }
}

#[async_trait]
impl ExhibitionStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn upsert(&self, exhibition: &Exhibition) -> Result<UpsertOutcome> {
        exhibition.validate()?;
        let row = StoredRow::from_exhibition(exhibition)?;
        let conn = self.conn()?;

        let result = conn.execute(
            INSERT_SQL,
            params![
                row.id,
                row.gallery_name,
                row.title,
                row.start_date,
                row.end_date,
                row.open_time,
                row.close_time,
                row.raw_description,
                row.description,
                row.artists,
                row.location,
                row.image_urls,
                row.source_url,
                row.extraction_status,
                row.content_hash,
                row.collected_at,
            ],
        );

        match result {
            Ok(0) => {
                debug!("Duplicate exhibition skipped: {}", exhibition.source_url);
                Ok(UpsertOutcome::Duplicate)
            }
            Ok(_) => Ok(UpsertOutcome::Inserted),
            Err(e) if Self::is_unique_violation(&e) => {
                debug!("Unique constraint hit for {}: {}", exhibition.source_url, e);
                Ok(UpsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM exhibitions", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    async fn count_by_gallery(&self) -> Result<Vec<(String, usize)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT gallery_name, COUNT(*) FROM exhibitions GROUP BY gallery_name ORDER BY gallery_name",
        )?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
        let mut counts = Vec::new();
        for row in rows {
            let (gallery, count) = row?;
            counts.push((gallery, count as usize));
        }
        Ok(counts)
    }

    async fn list_by_gallery(&self, gallery_name: &str) -> Result<Vec<Exhibition>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM exhibitions WHERE gallery_name = ?1 ORDER BY source_url",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![gallery_name], Self::read_row)?;
        let mut exhibitions = Vec::new();
        for row in rows {
            exhibitions.push(row?.into_exhibition()?);
        }
        Ok(exhibitions)
    }
}
