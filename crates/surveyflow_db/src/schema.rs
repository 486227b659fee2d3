//! Database schema creation for the survey tables.
//!
//! All CREATE TABLE statements live here - single source of truth.

use crate::error::Result;
use crate::SurveyDb;
use tracing::info;

impl SurveyDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        // Enable WAL mode for better concurrent access
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(self.pool())
            .await?;
        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(self.pool())
            .await?;
        sqlx::query("PRAGMA foreign_keys=ON")
            .execute(self.pool())
            .await?;

        // Sessions: one survey submission per imported row
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY,
                timestamp TEXT NOT NULL
            )"#,
        )
        .execute(self.pool())
        .await?;

        // Questions: id is the column position in the source export
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY,
                text TEXT NOT NULL
            )"#,
        )
        .execute(self.pool())
        .await?;

        // Responses: at most one per (session, question); duplicate imports
        // are ignored, never overwritten
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS responses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL REFERENCES sessions(id),
                question_id INTEGER NOT NULL REFERENCES questions(id),
                flags INTEGER NOT NULL DEFAULT 0,
                original_value TEXT NOT NULL,
                UNIQUE(session_id, question_id)
            )"#,
        )
        .execute(self.pool())
        .await?;

        // Sanitize: zero-or-one override per response, latest wins
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS sanitize (
                response_id INTEGER PRIMARY KEY REFERENCES responses(id),
                override_value TEXT NOT NULL
            )"#,
        )
        .execute(self.pool())
        .await?;

        // Indexes for the two review selection modes
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_responses_question ON responses(question_id)",
        )
        .execute(self.pool())
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_responses_session ON responses(session_id)",
        )
        .execute(self.pool())
        .await?;

        info!("Database schema verified");
        Ok(())
    }
}
