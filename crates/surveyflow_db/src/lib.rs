//! Unified database layer for Surveyflow
//!
//! This crate provides a single source of truth for all database
//! operations. The CLI, the sanitize engine, and the report builders all
//! go through [`SurveyDb`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use surveyflow_db::{SurveyDb, Result};
//!
//! let db = SurveyDb::open("~/.surveyflow/surveyflow.sqlite3").await?;
//!
//! let questions = db.list_questions().await?;
//! let detail = db.response_detail(5).await?;
//! ```

mod error;
mod schema;
mod types;

// Method implementations organized by domain
mod aggregate;
mod survey;

pub use error::{DbError, Result};
pub use types::*;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Unified database for all Surveyflow operations.
///
/// This is the ONLY way to access the database. Do not use raw sqlx
/// elsewhere.
#[derive(Clone)]
pub struct SurveyDb {
    pool: SqlitePool,
}

impl SurveyDb {
    /// Open or create a database at the given path.
    ///
    /// Creates all tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await?;

        let db = Self { pool };

        db.ensure_schema().await?;

        info!(path = %path.display(), "Database opened");

        Ok(db)
    }

    /// Open an existing database (fails if not exists).
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DbError::NotFound(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        let url = format!("sqlite:{}?mode=rw", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await?;

        Ok(Self { pool })
    }

    /// Get the underlying connection pool (escape hatch for complex queries).
    ///
    /// Prefer using the typed methods instead.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_database() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("test.db");

        let db = SurveyDb::open(&db_path).await.unwrap();
        assert!(db_path.exists());

        db.close().await;
    }

    #[tokio::test]
    async fn test_open_existing_fails_if_not_exists() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("nonexistent.db");

        let result = SurveyDb::open_existing(&db_path).await;
        assert!(result.is_err());
    }
}
