//! Unified types for all Surveyflow database entities.
//!
//! These types are the single source of truth. All interfaces (CLI,
//! sanitize engine, reports) should use these types.

use crate::error::{DbError, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Survey Entities
// ============================================================================

/// One survey submission, created once per imported row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Row position in the source export, zero-based
    pub id: i64,
    /// Submission timestamp, stored verbatim from the export
    pub timestamp: String,
}

/// One survey question, identified by its column position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Column position in the source export, zero-based
    /// (the timestamp column is excluded from numbering)
    pub id: i64,
    /// Question text from the header row
    pub text: String,
}

// ============================================================================
// Review State
// ============================================================================

/// Review state of a response.
///
/// Persisted as a two-bit flags column (`valid` = 0x1, `sanitized` = 0x2)
/// but surfaced as a closed enum so an impossible bit combination cannot
/// leak into domain code. `Sanitized*` states must always be accompanied by
/// an override row; `commit_review` maintains that invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// Never reviewed by an operator
    Unreviewed,
    /// Reviewed, original confirmed fine
    Verified,
    /// An override exists and is authoritative
    Sanitized,
    /// Override applied after (or alongside) verification
    SanitizedAndVerified,
}

const FLAG_VALID: i64 = 0x1;
const FLAG_SANITIZED: i64 = 0x2;

impl ReviewState {
    /// Decode the persisted flags column. Unknown high bits are ignored.
    pub fn from_flags(flags: i64) -> Self {
        match (flags & FLAG_SANITIZED != 0, flags & FLAG_VALID != 0) {
            (false, false) => Self::Unreviewed,
            (false, true) => Self::Verified,
            (true, false) => Self::Sanitized,
            (true, true) => Self::SanitizedAndVerified,
        }
    }

    /// Encode back to the flags column.
    pub fn as_flags(&self) -> i64 {
        match self {
            Self::Unreviewed => 0,
            Self::Verified => FLAG_VALID,
            Self::Sanitized => FLAG_SANITIZED,
            Self::SanitizedAndVerified => FLAG_SANITIZED | FLAG_VALID,
        }
    }

    /// An override row exists and takes precedence over the original.
    pub fn is_sanitized(&self) -> bool {
        matches!(self, Self::Sanitized | Self::SanitizedAndVerified)
    }

    /// An operator has looked at this response (either bit set).
    pub fn is_reviewed(&self) -> bool {
        !matches!(self, Self::Unreviewed)
    }

    /// Transition: operator confirmed the original needs no change.
    /// Leaves an existing sanitized mark untouched.
    pub fn verify(self) -> Self {
        match self {
            Self::Unreviewed | Self::Verified => Self::Verified,
            Self::Sanitized | Self::SanitizedAndVerified => Self::SanitizedAndVerified,
        }
    }

    /// Transition: an override was written for this response.
    pub fn sanitize(self) -> Self {
        match self {
            Self::Unreviewed | Self::Sanitized => Self::Sanitized,
            Self::Verified | Self::SanitizedAndVerified => Self::SanitizedAndVerified,
        }
    }

    /// Transition: all review actions reverted.
    pub fn undo(self) -> Self {
        Self::Unreviewed
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unreviewed => "unreviewed",
            Self::Verified => "verified",
            Self::Sanitized => "sanitized",
            Self::SanitizedAndVerified => "sanitized+verified",
        }
    }
}

impl std::fmt::Display for ReviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Responses
// ============================================================================

/// A response row as fetched from storage, with its override (if any)
/// joined in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResponse {
    /// Database ID
    pub id: i64,
    /// Owning session
    pub session_id: i64,
    /// Answered question
    pub question_id: i64,
    /// Review state decoded from the flags column
    pub state: ReviewState,
    /// Original answer text as imported (empty = dead answer)
    pub original: String,
    /// Override text from the sanitize table, if a row exists
    pub override_value: Option<String>,
}

impl StoredResponse {
    /// The single authoritative text value for this response.
    ///
    /// When the state says sanitized, the override row must exist; a
    /// missing row is an integrity error, never silently ignored.
    pub fn resolve(&self) -> Result<&str> {
        if self.state.is_sanitized() {
            self.override_value.as_deref().ok_or_else(|| {
                DbError::integrity(format!(
                    "response {} is marked sanitized but has no override row",
                    self.id
                ))
            })
        } else {
            Ok(&self.original)
        }
    }

    /// A dead answer: the question was skipped by the respondent.
    pub fn is_dead(&self) -> bool {
        self.original.is_empty()
    }
}

/// A response joined with its question text, as presented during review.
#[derive(Debug, Clone)]
pub struct ResponseDetail {
    pub response: StoredResponse,
    pub question_text: String,
}

/// What `commit_review` should do to the override row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordWrite {
    /// Insert or replace the override row with this text (latest wins)
    Upsert(String),
    /// Delete the override row if present
    Delete,
    /// Leave the override row untouched
    Keep,
}

/// One review decision, ready to be persisted atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCommit {
    /// New review state for the flags column
    pub state: ReviewState,
    /// Override row operation, applied in the same transaction
    pub record: RecordWrite,
}

// ============================================================================
// Stats
// ============================================================================

/// Row counts across the survey tables.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DbStats {
    pub sessions: u64,
    pub questions: u64,
    pub responses: u64,
    pub overrides: u64,
}

/// Result of importing one submission row.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportCounts {
    /// 1 if the session row was new, 0 if it already existed
    pub sessions_inserted: u64,
    /// Responses inserted for this row
    pub responses_inserted: u64,
    /// Responses ignored because the (session, question) pair already existed
    pub responses_ignored: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_state_flags_roundtrip() {
        for state in [
            ReviewState::Unreviewed,
            ReviewState::Verified,
            ReviewState::Sanitized,
            ReviewState::SanitizedAndVerified,
        ] {
            assert_eq!(ReviewState::from_flags(state.as_flags()), state);
        }
    }

    #[test]
    fn test_review_state_ignores_unknown_bits() {
        assert_eq!(ReviewState::from_flags(0x8 | 0x2), ReviewState::Sanitized);
    }

    #[test]
    fn test_verify_keeps_sanitized_bit() {
        assert_eq!(
            ReviewState::Sanitized.verify(),
            ReviewState::SanitizedAndVerified
        );
        assert_eq!(ReviewState::Unreviewed.verify(), ReviewState::Verified);
    }

    #[test]
    fn test_sanitize_keeps_valid_bit() {
        assert_eq!(
            ReviewState::Verified.sanitize(),
            ReviewState::SanitizedAndVerified
        );
        assert_eq!(ReviewState::Unreviewed.sanitize(), ReviewState::Sanitized);
    }

    #[test]
    fn test_undo_is_idempotent() {
        for state in [
            ReviewState::Unreviewed,
            ReviewState::Verified,
            ReviewState::SanitizedAndVerified,
        ] {
            assert_eq!(state.undo(), ReviewState::Unreviewed);
            assert_eq!(state.undo().undo(), ReviewState::Unreviewed);
        }
    }

    #[test]
    fn test_resolve_prefers_override_when_sanitized() {
        let response = StoredResponse {
            id: 5,
            session_id: 1,
            question_id: 2,
            state: ReviewState::Sanitized,
            original: "raw".to_string(),
            override_value: Some("Redacted".to_string()),
        };
        assert_eq!(response.resolve().unwrap(), "Redacted");
    }

    #[test]
    fn test_resolve_returns_original_when_not_sanitized() {
        let response = StoredResponse {
            id: 5,
            session_id: 1,
            question_id: 2,
            state: ReviewState::Verified,
            // An override row may linger after verify; it must not win.
            original: "raw".to_string(),
            override_value: Some("stale".to_string()),
        };
        assert_eq!(response.resolve().unwrap(), "raw");
    }

    #[test]
    fn test_resolve_missing_override_is_integrity_error() {
        let response = StoredResponse {
            id: 5,
            session_id: 1,
            question_id: 2,
            state: ReviewState::Sanitized,
            original: "raw".to_string(),
            override_value: None,
        };
        assert!(matches!(
            response.resolve(),
            Err(DbError::Integrity(_))
        ));
    }
}
