use super::{ExhibitionStore, StoredRow, INSERT_SQL, MIGRATION_SQL, SELECT_COLUMNS};
use crate::error::{Result, ScraperError};
use crate::types::{Exhibition, UpsertOutcome};
use async_trait::async_trait;
use libsql::{Builder, Connection, Database, Row, Value};
use std::env;
use tracing::{debug, info};

/// Remote libSQL/Turso database
pub struct TursoStore {
    db: Database,
}

fn db_error(context: &str, e: impl std::fmt::Display) -> ScraperError {
    ScraperError::Database {
        message: format!("{context}: {e}"),
    }
}

impl TursoStore {
    /// Connect using LIBSQL_URL and LIBSQL_AUTH_TOKEN and run migrations
    pub async fn from_env() -> Result<Self> {
        let url = env::var("LIBSQL_URL").map_err(|_| ScraperError::Database {
            message: "LIBSQL_URL environment variable not set".to_string(),
        })?;

        let auth_token = env::var("LIBSQL_AUTH_TOKEN").map_err(|_| ScraperError::Database {
            message: "LIBSQL_AUTH_TOKEN environment variable not set".to_string(),
        })?;

        info!("Connecting to Turso database at {}", url);

        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| db_error("Failed to connect to database", e))?;

        let store = Self { db };
        store.run_migrations().await?;
        Ok(store)
    }

    fn connection(&self) -> Result<Connection> {
        self.db
            .connect()
            .map_err(|e| db_error("Failed to get database connection", e))
    }

    async fn run_migrations(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(MIGRATION_SQL)
            .await
            .map_err(|e| db_error("Failed to run migrations", e))?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    fn text(row: &Row, idx: i32) -> Result<String> {
        row.get::<String>(idx)
            .map_err(|e| db_error("Failed to read column", e))
    }

    fn optional_text(row: &Row, idx: i32) -> Result<Option<String>> {
        match row
            .get_value(idx)
            .map_err(|e| db_error("Failed to read column", e))?
        {
            Value::Text(s) => Ok(Some(s)),
            _ => Ok(None),
        }
    }

    fn read_row(row: &Row) -> Result<StoredRow> {
        Ok(StoredRow {
            id: Self::text(row, 0)?,
            gallery_name: Self::text(row, 1)?,
            title: Self::text(row, 2)?,
            start_date: Self::optional_text(row, 3)?,
            end_date: Self::optional_text(row, 4)?,
            open_time: Self::optional_text(row, 5)?,
            close_time: Self::optional_text(row, 6)?,
            raw_description: Self::text(row, 7)?,
            description: Self::optional_text(row, 8)?,
            artists: Self::text(row, 9)?,
            location: Self::optional_text(row, 10)?,
            image_urls: Self::text(row, 11)?,
            source_url: Self::text(row, 12)?,
            extraction_status: Self::text(row, 13)?,
            content_hash: Self::text(row, 14)?,
            collected_at: Self::text(row, 15)?,
        })
    }
}

#[async_trait]
impl ExhibitionStore for TursoStore {
    fn name(&self) -> &'static str {
        "turso"
    }

    async fn upsert(&self, exhibition: &Exhibition) -> Result<UpsertOutcome> {
        exhibition.validate()?;
        let row = StoredRow::from_exhibition(exhibition)?;
        let conn = self.connection()?;

        let result = conn
            .execute(
                INSERT_SQL,
                libsql::params![
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
            )
            .await;

        match result {
            Ok(0) => {
                debug!("Duplicate exhibition skipped: {}", exhibition.source_url);
                Ok(UpsertOutcome::Duplicate)
            }
            Ok(_) => Ok(UpsertOutcome::Inserted),
            // Remote errors arrive as text, so match the engine's message
            Err(e) if e.to_string().contains("UNIQUE constraint failed") => {
                Ok(UpsertOutcome::Duplicate)
            }
            Err(e) => Err(db_error("Failed to insert exhibition", e)),
        }
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.connection()?;
        let mut rows = conn
            .query("SELECT COUNT(*) FROM exhibitions", ())
            .await
            .map_err(|e| db_error("Failed to count exhibitions", e))?;
        match rows.next().await.map_err(|e| db_error("Failed to read row", e))? {
            Some(row) => {
                let count = row
                    .get::<i64>(0)
                    .map_err(|e| db_error("Failed to read count", e))?;
                Ok(count as usize)
            }
            None => Ok(0),
        }
    }

    async fn count_by_gallery(&self) -> Result<Vec<(String, usize)>> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT gallery_name, COUNT(*) FROM exhibitions GROUP BY gallery_name ORDER BY gallery_name",
                (),
            )
            .await
            .map_err(|e| db_error("Failed to count exhibitions", e))?;

        let mut counts = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| db_error("Failed to read row", e))? {
            let gallery = Self::text(&row, 0)?;
            let count = row
                .get::<i64>(1)
                .map_err(|e| db_error("Failed to read count", e))?;
            counts.push((gallery, count as usize));
        }
        Ok(counts)
    }

    async fn list_by_gallery(&self, gallery_name: &str) -> Result<Vec<Exhibition>> {
        let conn = self.connection()?;
        let sql = format!(
            "SELECT {} FROM exhibitions WHERE gallery_name = ?1 ORDER BY source_url",
            SELECT_COLUMNS
        );
        let mut rows = conn
            .query(&sql, libsql::params![gallery_name])
            .await
            .map_err(|e| db_error("Failed to query exhibitions", e))?;

        let mut exhibitions = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| db_error("Failed to read row", e))? {
            exhibitions.push(Self::read_row(&row)?.into_exhibition()?);
        }
        Ok(exhibitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_url_is_reported_before_connecting() {
        std::env::remove_var("LIBSQL_URL");
        match TursoStore::from_env().await {
            Err(ScraperError::Database { message }) => assert!(message.contains("LIBSQL_URL")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connected without LIBSQL_URL"),
        }
    }
}
