//! Sanitization engine: candidate selection, skip predicate, and the
//! commit loop over operator decisions.
//!
//! The engine walks an ordered sequence of candidate responses, presents
//! each through an [`Operator`], and persists every decision as one atomic
//! transaction via `SurveyDb::commit_review`. Batches are not atomic as a
//! whole: cancelling mid-batch keeps the decisions already committed.

mod prompt;

pub use prompt::{
    advance, CandidateView, ConsoleOperator, Decision, Feedback, Operator, PromptEvent,
    PromptOutcome, PromptState,
};

use anyhow::Context;
use surveyflow_db::{RecordWrite, ReviewCommit, ReviewState, StoredResponse, SurveyDb};
use tracing::{debug, info};

use crate::cli::error::HelpfulError;

/// Which responses to review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// One response, reviewed unconditionally (skip rule bypassed)
    Response(i64),
    /// Every response to a question, across sessions, in storage order
    Question(i64),
    /// Every response in a session, in storage order
    Session(i64),
}

/// Batch options from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewOptions {
    /// Also present responses that were already reviewed
    pub show_all: bool,
}

/// What happened over one review batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchSummary {
    pub committed: u64,
    pub skipped: u64,
    pub cancelled: bool,
}

/// Skip rule for batch modes: dead answers never prompt, and reviewed
/// responses only prompt when show-all was requested.
pub fn should_skip(response: &StoredResponse, show_all: bool) -> bool {
    response.is_dead() || (response.state.is_reviewed() && !show_all)
}

/// Map an operator decision onto the state transition and override-row
/// write it implies. `Skip` and `Cancel` persist nothing.
pub fn plan_commit(current: ReviewState, decision: &Decision) -> Option<ReviewCommit> {
    match decision {
        Decision::Override(text) => Some(ReviewCommit {
            state: current.sanitize(),
            record: RecordWrite::Upsert(text.clone()),
        }),
        Decision::Discard => Some(ReviewCommit {
            state: current.sanitize(),
            record: RecordWrite::Upsert(String::new()),
        }),
        Decision::Verify => Some(ReviewCommit {
            state: current.verify(),
            record: RecordWrite::Keep,
        }),
        Decision::Undo => Some(ReviewCommit {
            state: current.undo(),
            record: RecordWrite::Delete,
        }),
        Decision::Skip | Decision::Cancel => None,
    }
}

/// The review engine. Generic over the operator so tests can script
/// decisions without a terminal.
pub struct Engine<'a, O: Operator> {
    db: &'a SurveyDb,
    operator: O,
}

impl<'a, O: Operator> Engine<'a, O> {
    pub fn new(db: &'a SurveyDb, operator: O) -> Self {
        Self { db, operator }
    }

    /// Access the operator (tests inspect scripted ones after a run).
    pub fn operator(&self) -> &O {
        &self.operator
    }

    /// Review the selected responses to completion or cancellation.
    pub async fn run(
        &mut self,
        selection: Selection,
        options: ReviewOptions,
    ) -> anyhow::Result<BatchSummary> {
        let (candidates, forced, question_mode) = match selection {
            Selection::Response(id) => (vec![id], true, false),
            Selection::Question(id) => {
                let ids = self.db.candidate_ids_by_question(id).await?;
                if ids.is_empty() {
                    return Err(HelpfulError::no_responses("question", id).into());
                }
                (ids, false, true)
            }
            Selection::Session(id) => {
                let ids = self.db.candidate_ids_by_session(id).await?;
                if ids.is_empty() {
                    return Err(HelpfulError::no_responses("session", id).into());
                }
                (ids, false, false)
            }
        };

        let mut summary = BatchSummary::default();
        // In question mode the question text is shown on the first prompted
        // candidate only, not repeated per row.
        let mut question_shown = false;

        for id in candidates {
            let detail = self
                .db
                .response_detail(id)
                .await?
                .with_context(|| format!("Unable to find response {id}"))?;

            if !forced && should_skip(&detail.response, options.show_all) {
                continue;
            }

            let show_question = !question_mode || !question_shown;
            let view = CandidateView {
                response_id: detail.response.id,
                session_id: detail.response.session_id,
                question_id: detail.response.question_id,
                question_text: show_question.then(|| detail.question_text.clone()),
                original: detail.response.original.clone(),
                current_override: if detail.response.state.is_sanitized() {
                    detail.response.override_value.clone()
                } else {
                    None
                },
            };

            let decision = self.operator.decide(&view)?;
            question_shown = true;

            match decision {
                Decision::Cancel => {
                    summary.cancelled = true;
                    info!("review cancelled; committed decisions are kept");
                    break;
                }
                Decision::Skip => summary.skipped += 1,
                decision => {
                    if let Some(commit) = plan_commit(detail.response.state, &decision) {
                        self.db.commit_review(id, &commit).await?;
                        summary.committed += 1;
                        debug!(response = id, state = %commit.state, "review committed");
                    }
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(state: ReviewState, original: &str) -> StoredResponse {
        StoredResponse {
            id: 1,
            session_id: 0,
            question_id: 0,
            state,
            original: original.to_string(),
            override_value: None,
        }
    }

    #[test]
    fn test_skip_dead_answers_even_with_show_all() {
        let dead = response(ReviewState::Unreviewed, "");
        assert!(should_skip(&dead, false));
        assert!(should_skip(&dead, true));
    }

    #[test]
    fn test_skip_reviewed_unless_show_all() {
        for state in [
            ReviewState::Verified,
            ReviewState::Sanitized,
            ReviewState::SanitizedAndVerified,
        ] {
            let reviewed = response(state, "text");
            assert!(should_skip(&reviewed, false));
            assert!(!should_skip(&reviewed, true));
        }
        assert!(!should_skip(&response(ReviewState::Unreviewed, "text"), false));
    }

    #[test]
    fn test_plan_commit_matches_decision_table() {
        let over = plan_commit(
            ReviewState::Unreviewed,
            &Decision::Override("new".to_string()),
        )
        .unwrap();
        assert_eq!(over.state, ReviewState::Sanitized);
        assert_eq!(over.record, RecordWrite::Upsert("new".to_string()));

        let discard = plan_commit(ReviewState::Verified, &Decision::Discard).unwrap();
        assert_eq!(discard.state, ReviewState::SanitizedAndVerified);
        assert_eq!(discard.record, RecordWrite::Upsert(String::new()));

        let verify = plan_commit(ReviewState::Sanitized, &Decision::Verify).unwrap();
        assert_eq!(verify.state, ReviewState::SanitizedAndVerified);
        assert_eq!(verify.record, RecordWrite::Keep);

        let undo = plan_commit(ReviewState::SanitizedAndVerified, &Decision::Undo).unwrap();
        assert_eq!(undo.state, ReviewState::Unreviewed);
        assert_eq!(undo.record, RecordWrite::Delete);

        assert!(plan_commit(ReviewState::Unreviewed, &Decision::Skip).is_none());
        assert!(plan_commit(ReviewState::Unreviewed, &Decision::Cancel).is_none());
    }
}
