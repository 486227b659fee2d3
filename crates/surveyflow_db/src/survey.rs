//! Survey database operations (import, lookup, review commits)

use crate::error::{DbError, Result};
use crate::types::*;
use crate::SurveyDb;
use sqlx::Row;

/// Shared SELECT for response rows with their override joined in.
const RESPONSE_SELECT: &str = r#"
    SELECT responses.id AS id,
           responses.session_id AS session_id,
           responses.question_id AS question_id,
           responses.flags AS flags,
           responses.original_value AS original_value,
           sanitize.override_value AS override_value
    FROM responses
    LEFT JOIN sanitize ON sanitize.response_id = responses.id
"#;

impl SurveyDb {
    // ========================================================================
    // Import Operations
    // ========================================================================

    /// Insert a question from the header row. Returns true if the row was
    /// new; an existing id is left untouched (re-import is additive).
    pub async fn import_question(&self, id: i64, text: &str) -> Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO questions (id, text) VALUES (?, ?)")
            .bind(id)
            .bind(text)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Import one submission row: the session plus one response per answer
    /// cell, in a single transaction.
    ///
    /// Duplicate (session, question) pairs are silently ignored - the
    /// intentional idempotency rule, not a failure.
    pub async fn import_submission(
        &self,
        session_id: i64,
        timestamp: &str,
        answers: &[String],
    ) -> Result<ImportCounts> {
        let mut tx = self.pool().begin().await?;
        let mut counts = ImportCounts::default();

        let result = sqlx::query("INSERT OR IGNORE INTO sessions (id, timestamp) VALUES (?, ?)")
            .bind(session_id)
            .bind(timestamp)
            .execute(&mut *tx)
            .await?;
        counts.sessions_inserted = result.rows_affected();

        for (question_id, answer) in answers.iter().enumerate() {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO responses (session_id, question_id, original_value) VALUES (?, ?, ?)",
            )
            .bind(session_id)
            .bind(question_id as i64)
            .bind(answer.trim())
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() > 0 {
                counts.responses_inserted += 1;
            } else {
                counts.responses_ignored += 1;
            }
        }

        tx.commit().await?;
        Ok(counts)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Get a session by ID
    pub async fn get_session(&self, id: i64) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT id, timestamp FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(|row| Session {
            id: row.get("id"),
            timestamp: row.get("timestamp"),
        }))
    }

    /// Get a question by ID
    pub async fn get_question(&self, id: i64) -> Result<Option<Question>> {
        let row = sqlx::query("SELECT id, text FROM questions WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(|row| Question {
            id: row.get("id"),
            text: row.get("text"),
        }))
    }

    /// List all questions in column order
    pub async fn list_questions(&self) -> Result<Vec<Question>> {
        let rows = sqlx::query("SELECT id, text FROM questions ORDER BY id")
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .iter()
            .map(|row| Question {
                id: row.get("id"),
                text: row.get("text"),
            })
            .collect())
    }

    /// All responses for a session, in storage order.
    pub async fn responses_for_session(&self, session_id: i64) -> Result<Vec<StoredResponse>> {
        let sql = format!("{RESPONSE_SELECT} WHERE responses.session_id = ? ORDER BY responses.id");
        let rows = sqlx::query(&sql)
            .bind(session_id)
            .fetch_all(self.pool())
            .await?;

        rows.iter().map(Self::row_to_response).collect()
    }

    /// The response one session gave to one question, if any.
    pub async fn response_for_pair(
        &self,
        session_id: i64,
        question_id: i64,
    ) -> Result<Option<StoredResponse>> {
        let sql =
            format!("{RESPONSE_SELECT} WHERE responses.session_id = ? AND responses.question_id = ?");
        let row = sqlx::query(&sql)
            .bind(session_id)
            .bind(question_id)
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(Self::row_to_response).transpose()
    }

    // ========================================================================
    // Review Selection
    // ========================================================================

    /// Candidate response ids for question-mode review, in storage order.
    pub async fn candidate_ids_by_question(&self, question_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query("SELECT id FROM responses WHERE question_id = ? ORDER BY id")
            .bind(question_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    /// Candidate response ids for session-mode review, in storage order.
    pub async fn candidate_ids_by_session(&self, session_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query("SELECT id FROM responses WHERE session_id = ? ORDER BY id")
            .bind(session_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    /// A response joined with its override and question text, as presented
    /// during review.
    pub async fn response_detail(&self, response_id: i64) -> Result<Option<ResponseDetail>> {
        let row = sqlx::query(
            r#"
            SELECT responses.id AS id,
                   responses.session_id AS session_id,
                   responses.question_id AS question_id,
                   responses.flags AS flags,
                   responses.original_value AS original_value,
                   sanitize.override_value AS override_value,
                   questions.text AS question_text
            FROM responses
            LEFT JOIN sanitize ON sanitize.response_id = responses.id
            LEFT JOIN questions ON questions.id = responses.question_id
            WHERE responses.id = ?
            "#,
        )
        .bind(response_id)
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let response = Self::row_to_response(&row)?;
        // A response always references an imported question; a missing text
        // means the questions table is damaged.
        let question_text: Option<String> = row.get("question_text");
        let question_text = question_text.ok_or_else(|| {
            DbError::integrity(format!(
                "question {} has no matching text",
                response.question_id
            ))
        })?;

        Ok(Some(ResponseDetail {
            response,
            question_text,
        }))
    }

    // ========================================================================
    // Review Commits
    // ========================================================================

    /// Persist one review decision atomically: the flags update and the
    /// override write/delete happen in a single transaction, so a sanitized
    /// flag can never exist without its override row (and undo never leaves
    /// an orphaned row behind).
    pub async fn commit_review(&self, response_id: i64, commit: &ReviewCommit) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        match &commit.record {
            RecordWrite::Upsert(text) => {
                sqlx::query(
                    r#"
                    INSERT INTO sanitize (response_id, override_value) VALUES (?, ?)
                    ON CONFLICT(response_id) DO UPDATE SET
                        override_value = excluded.override_value
                    "#,
                )
                .bind(response_id)
                .bind(text)
                .execute(&mut *tx)
                .await?;
            }
            RecordWrite::Delete => {
                sqlx::query("DELETE FROM sanitize WHERE response_id = ?")
                    .bind(response_id)
                    .execute(&mut *tx)
                    .await?;
            }
            RecordWrite::Keep => {}
        }

        let result = sqlx::query("UPDATE responses SET flags = ? WHERE id = ?")
            .bind(commit.state.as_flags())
            .bind(response_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DbError::not_found(format!("response {response_id}")));
        }

        tx.commit().await?;
        Ok(())
    }

    // ========================================================================
    // Row Conversion
    // ========================================================================

    pub(crate) fn row_to_response(row: &sqlx::sqlite::SqliteRow) -> Result<StoredResponse> {
        Ok(StoredResponse {
            id: row.get("id"),
            session_id: row.get("session_id"),
            question_id: row.get("question_id"),
            state: ReviewState::from_flags(row.get("flags")),
            original: row.get("original_value"),
            override_value: row.get("override_value"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn seed_db(tmp: &TempDir) -> SurveyDb {
        let db = SurveyDb::open(tmp.path().join("survey.db")).await.unwrap();
        db.import_question(0, "Favorite color?").await.unwrap();
        db.import_question(1, "Tools used?").await.unwrap();
        db.import_submission(0, "2026/01/05 10:00:00", &["blue".into(), "hammer;saw".into()])
            .await
            .unwrap();
        db.import_submission(1, "2026/01/05 11:30:00", &["green".into(), "".into()])
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let db = seed_db(&tmp).await;

        let counts = db
            .import_submission(0, "2026/01/05 10:00:00", &["RED".into(), "changed".into()])
            .await
            .unwrap();
        assert_eq!(counts.sessions_inserted, 0);
        assert_eq!(counts.responses_inserted, 0);
        assert_eq!(counts.responses_ignored, 2);

        // Original values survive the duplicate import untouched
        let response = db.response_for_pair(0, 0).await.unwrap().unwrap();
        assert_eq!(response.original, "blue");

        db.close().await;
    }

    #[tokio::test]
    async fn test_import_trims_cell_text() {
        let tmp = TempDir::new().unwrap();
        let db = SurveyDb::open(tmp.path().join("survey.db")).await.unwrap();
        db.import_question(0, "Q").await.unwrap();
        db.import_submission(0, "ts", &["  padded  ".into()])
            .await
            .unwrap();

        let response = db.response_for_pair(0, 0).await.unwrap().unwrap();
        assert_eq!(response.original, "padded");

        db.close().await;
    }

    #[tokio::test]
    async fn test_commit_override_sets_state_and_record() {
        let tmp = TempDir::new().unwrap();
        let db = seed_db(&tmp).await;

        let detail = db.response_detail(1).await.unwrap().unwrap();
        assert_eq!(detail.response.state, ReviewState::Unreviewed);

        let commit = ReviewCommit {
            state: detail.response.state.sanitize(),
            record: RecordWrite::Upsert("Redacted".to_string()),
        };
        db.commit_review(1, &commit).await.unwrap();

        let detail = db.response_detail(1).await.unwrap().unwrap();
        assert_eq!(detail.response.state, ReviewState::Sanitized);
        assert_eq!(detail.response.override_value.as_deref(), Some("Redacted"));
        assert_eq!(detail.response.resolve().unwrap(), "Redacted");

        db.close().await;
    }

    #[tokio::test]
    async fn test_commit_discard_resolves_to_empty() {
        let tmp = TempDir::new().unwrap();
        let db = seed_db(&tmp).await;

        let commit = ReviewCommit {
            state: ReviewState::Unreviewed.sanitize(),
            record: RecordWrite::Upsert(String::new()),
        };
        db.commit_review(1, &commit).await.unwrap();

        let detail = db.response_detail(1).await.unwrap().unwrap();
        assert_eq!(detail.response.resolve().unwrap(), "");

        db.close().await;
    }

    #[tokio::test]
    async fn test_commit_verify_leaves_override_untouched() {
        let tmp = TempDir::new().unwrap();
        let db = seed_db(&tmp).await;

        db.commit_review(
            1,
            &ReviewCommit {
                state: ReviewState::Unreviewed.sanitize(),
                record: RecordWrite::Upsert("fixed".to_string()),
            },
        )
        .await
        .unwrap();

        db.commit_review(
            1,
            &ReviewCommit {
                state: ReviewState::Sanitized.verify(),
                record: RecordWrite::Keep,
            },
        )
        .await
        .unwrap();

        let detail = db.response_detail(1).await.unwrap().unwrap();
        assert_eq!(detail.response.state, ReviewState::SanitizedAndVerified);
        assert_eq!(detail.response.override_value.as_deref(), Some("fixed"));

        db.close().await;
    }

    #[tokio::test]
    async fn test_undo_twice_matches_undo_once() {
        let tmp = TempDir::new().unwrap();
        let db = seed_db(&tmp).await;

        db.commit_review(
            1,
            &ReviewCommit {
                state: ReviewState::Unreviewed.sanitize(),
                record: RecordWrite::Upsert("oops".to_string()),
            },
        )
        .await
        .unwrap();

        let undo = ReviewCommit {
            state: ReviewState::Sanitized.undo(),
            record: RecordWrite::Delete,
        };
        db.commit_review(1, &undo).await.unwrap();
        db.commit_review(1, &undo).await.unwrap();

        let detail = db.response_detail(1).await.unwrap().unwrap();
        assert_eq!(detail.response.state, ReviewState::Unreviewed);
        assert!(detail.response.override_value.is_none());

        db.close().await;
    }

    #[tokio::test]
    async fn test_commit_unknown_response_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let db = seed_db(&tmp).await;

        let result = db
            .commit_review(
                999,
                &ReviewCommit {
                    state: ReviewState::Verified,
                    record: RecordWrite::Keep,
                },
            )
            .await;
        assert!(matches!(result, Err(DbError::NotFound(_))));

        db.close().await;
    }

    #[tokio::test]
    async fn test_candidate_order_is_storage_order() {
        let tmp = TempDir::new().unwrap();
        let db = seed_db(&tmp).await;

        let by_question = db.candidate_ids_by_question(0).await.unwrap();
        assert_eq!(by_question.len(), 2);
        assert!(by_question.windows(2).all(|w| w[0] < w[1]));

        let by_session = db.candidate_ids_by_session(0).await.unwrap();
        assert_eq!(by_session.len(), 2);
        assert!(by_session.windows(2).all(|w| w[0] < w[1]));

        db.close().await;
    }
}
