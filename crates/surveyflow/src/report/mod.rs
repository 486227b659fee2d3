//! Aggregation engine: grouped counts and cross-tabulations over
//! resolved response values.
//!
//! Aggregation is a pure read. Every function here takes rows fetched by
//! `surveyflow_db` and returns deterministic structures (lexicographic
//! bucket order) so reports are reproducible and testable.

mod registry;

pub use registry::{ReportKind, ReportRegistry, ReportSpec};

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use surveyflow_db::{Result, StoredResponse};

/// The delimiter used by multi-select spreadsheet answers.
pub const SPLIT_DELIMITER: char = ';';

// ============================================================================
// Single-Question Frequency
// ============================================================================

/// One frequency bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyRow {
    pub value: String,
    pub count: u64,
    /// Percent of the respondent denominator, truncated
    pub percent: u64,
}

/// Frequency counts for one question.
#[derive(Debug, Clone, Serialize)]
pub struct FrequencyReport {
    pub title: String,
    /// Column label for the value axis (e.g. "Tool")
    pub key: String,
    /// Count of responses whose resolved value is non-empty. Split mode
    /// does not change this: percentages are measured against respondents,
    /// not tokens.
    pub denominator: u64,
    pub rows: Vec<FrequencyRow>,
}

/// Count resolved values for one question.
///
/// Dead and discarded answers (empty resolved value) are dropped. With
/// `split` enabled each resolved value contributes one count per `;`
/// token, so a single response may land in several buckets; the
/// denominator still counts the response once.
pub fn frequency(rows: &[StoredResponse], split: bool) -> Result<(BTreeMap<String, u64>, u64)> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut denominator = 0u64;

    for row in rows {
        let value = row.resolve()?;
        if value.is_empty() {
            continue;
        }
        denominator += 1;

        if split {
            for token in value.split(SPLIT_DELIMITER) {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                *counts.entry(token.to_string()).or_default() += 1;
            }
        } else {
            *counts.entry(value.to_string()).or_default() += 1;
        }
    }

    Ok((counts, denominator))
}

/// Assemble the presentation structure from raw counts.
pub fn frequency_report(
    title: impl Into<String>,
    key: impl Into<String>,
    counts: BTreeMap<String, u64>,
    denominator: u64,
) -> FrequencyReport {
    let rows = counts
        .into_iter()
        .map(|(value, count)| FrequencyRow {
            value,
            count,
            percent: if denominator == 0 {
                0
            } else {
                count * 100 / denominator
            },
        })
        .collect();

    FrequencyReport {
        title: title.into(),
        key: key.into(),
        denominator,
        rows,
    }
}

// ============================================================================
// Two-Level Cross-Tabulation
// ============================================================================

/// Counts of one breakdown value under one anchor value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrosstabChild {
    pub value: String,
    pub count: u64,
}

/// One breakdown dimension nested under an anchor bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrosstabSlice {
    /// Breakdown question label
    pub label: String,
    pub children: Vec<CrosstabChild>,
}

/// One top-level anchor bucket.
#[derive(Debug, Clone, Serialize)]
pub struct CrosstabParent {
    pub value: String,
    /// Sessions holding this anchor value
    pub count: u64,
    pub slices: Vec<CrosstabSlice>,
}

/// Hierarchical cross-tabulation of one anchor question against one or
/// more breakdown questions, joined by session.
#[derive(Debug, Clone, Serialize)]
pub struct CrosstabReport {
    pub title: String,
    pub parents: Vec<CrosstabParent>,
}

/// Cross-tabulate anchor values against breakdown dimensions.
///
/// Two explicitly separate passes: pass 1 counts sessions per distinct
/// non-empty anchor value (the top-level totals); pass 2 counts (anchor,
/// breakdown) pairs per dimension (the children). A session whose
/// breakdown response is absent or empty shows up in pass 1 only, so the
/// children under a parent can sum to less than the parent count.
pub fn crosstab(
    title: impl Into<String>,
    anchor_rows: &[StoredResponse],
    breakdowns: &[(String, Vec<StoredResponse>)],
) -> Result<CrosstabReport> {
    // Pass 1: anchor value per session, top-level session counts.
    let mut anchor_by_session: HashMap<i64, String> = HashMap::new();
    let mut parent_counts: BTreeMap<String, u64> = BTreeMap::new();
    for row in anchor_rows {
        let value = row.resolve()?;
        if value.is_empty() {
            continue;
        }
        anchor_by_session.insert(row.session_id, value.to_string());
        *parent_counts.entry(value.to_string()).or_default() += 1;
    }

    // Pass 2: per dimension, count (anchor, breakdown) pairs.
    let mut children: BTreeMap<(String, String, String), u64> = BTreeMap::new();
    for (label, rows) in breakdowns {
        for row in rows {
            let value = row.resolve()?;
            if value.is_empty() {
                continue;
            }
            let Some(anchor_value) = anchor_by_session.get(&row.session_id) else {
                continue;
            };
            let bucket = (anchor_value.clone(), label.clone(), value.to_string());
            *children.entry(bucket).or_default() += 1;
        }
    }

    let parents = parent_counts
        .into_iter()
        .map(|(value, count)| {
            let slices = breakdowns
                .iter()
                .map(|(label, _)| {
                    let slice_children = children
                        .iter()
                        .filter(|((anchor, slice, _), _)| anchor == &value && slice == label)
                        .map(|((_, _, child), count)| CrosstabChild {
                            value: child.clone(),
                            count: *count,
                        })
                        .collect();
                    CrosstabSlice {
                        label: label.clone(),
                        children: slice_children,
                    }
                })
                .collect();
            CrosstabParent {
                value,
                count,
                slices,
            }
        })
        .collect();

    Ok(CrosstabReport {
        title: title.into(),
        parents,
    })
}
