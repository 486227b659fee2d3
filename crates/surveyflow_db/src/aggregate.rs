//! Read-only fetches feeding the aggregation engine.
//!
//! Aggregation never mutates state; counting and grouping happen in the
//! CLI crate's report module over the rows returned here.

use crate::error::Result;
use crate::types::*;
use crate::SurveyDb;
use sqlx::Row;

impl SurveyDb {
    /// All responses to a question across sessions, overrides joined in,
    /// in storage order. Dead answers are included; the report layer drops
    /// empty resolved values.
    pub async fn responses_for_question(&self, question_id: i64) -> Result<Vec<StoredResponse>> {
        let rows = sqlx::query(
            r#"
            SELECT responses.id AS id,
                   responses.session_id AS session_id,
                   responses.question_id AS question_id,
                   responses.flags AS flags,
                   responses.original_value AS original_value,
                   sanitize.override_value AS override_value
            FROM responses
            LEFT JOIN sanitize ON sanitize.response_id = responses.id
            WHERE responses.question_id = ?
            ORDER BY responses.id
            "#,
        )
        .bind(question_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(Self::row_to_response).collect()
    }

    /// Row counts across the survey tables.
    pub async fn stats(&self) -> Result<DbStats> {
        let row = sqlx::query(
            r#"
            SELECT (SELECT COUNT(*) FROM sessions) AS sessions,
                   (SELECT COUNT(*) FROM questions) AS questions,
                   (SELECT COUNT(*) FROM responses) AS responses,
                   (SELECT COUNT(*) FROM sanitize) AS overrides
            "#,
        )
        .fetch_one(self.pool())
        .await?;

        Ok(DbStats {
            sessions: row.get::<i64, _>("sessions") as u64,
            questions: row.get::<i64, _>("questions") as u64,
            responses: row.get::<i64, _>("responses") as u64,
            overrides: row.get::<i64, _>("overrides") as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_responses_for_question_spans_sessions() {
        let tmp = TempDir::new().unwrap();
        let db = SurveyDb::open(tmp.path().join("survey.db")).await.unwrap();
        db.import_question(0, "Q0").await.unwrap();
        db.import_submission(0, "t0", &["a".into()]).await.unwrap();
        db.import_submission(1, "t1", &["b".into()]).await.unwrap();
        db.import_submission(2, "t2", &["".into()]).await.unwrap();

        let rows = db.responses_for_question(0).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().filter(|r| r.is_dead()).count(), 1);
        assert_eq!(
            rows.iter().map(|r| r.session_id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        db.close().await;
    }

    #[tokio::test]
    async fn test_stats_counts_tables() {
        let tmp = TempDir::new().unwrap();
        let db = SurveyDb::open(tmp.path().join("survey.db")).await.unwrap();
        db.import_question(0, "Q0").await.unwrap();
        db.import_submission(0, "t0", &["a".into()]).await.unwrap();
        db.commit_review(
            1,
            &ReviewCommit {
                state: ReviewState::Unreviewed.sanitize(),
                record: RecordWrite::Upsert("b".to_string()),
            },
        )
        .await
        .unwrap();

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.questions, 1);
        assert_eq!(stats.responses, 1);
        assert_eq!(stats.overrides, 1);

        db.close().await;
    }
}
