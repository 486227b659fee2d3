//! Surveyflow - Core Library
//!
//! Shared functionality for the survey CLI: the sanitize review engine and
//! the aggregation/report builders. The `cli` module holds the command
//! implementations driven by `main.rs`.

pub mod cli;
pub mod report;
pub mod sanitize;

pub use report::{crosstab, frequency, ReportKind, ReportRegistry, ReportSpec};
pub use sanitize::{plan_commit, Decision, Engine, ReviewOptions, Selection};
