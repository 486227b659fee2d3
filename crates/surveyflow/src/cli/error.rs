//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    /// Create a new helpful error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a suggestion for fixing the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add multiple suggestions
    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions
            .extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Survey database file does not exist
    pub fn db_not_found(path: &Path) -> Self {
        Self::new(format!("Survey database not found: {}", path.display()))
            .with_context("This command needs an imported survey database")
            .with_suggestions([
                "TRY: Import a spreadsheet export first: surveyflow import survey.csv".to_string(),
                format!("TRY: Check the path: ls -la {}", path.display()),
                "TRY: Point at a different database with --db".to_string(),
            ])
    }

    /// CSV file does not exist
    pub fn file_not_found(path: &Path) -> Self {
        Self::new(format!("File not found: {}", path.display()))
            .with_context("The specified file does not exist")
            .with_suggestions([
                format!("TRY: Check if the file exists: ls -la {}", path.display()),
                "TRY: Check for typos in the path".to_string(),
            ])
    }

    /// CSV parsing error
    pub fn csv_parse_error(path: &Path, details: &str) -> Self {
        Self::new(format!("CSV parse error: {details}"))
            .with_context(format!("Failed to parse CSV file: {}", path.display()))
            .with_suggestions([
                "TRY: Verify the CSV file is well-formed".to_string(),
                format!("TRY: Inspect the raw file: head {}", path.display()),
            ])
    }

    /// Question id has no row
    pub fn question_not_found(id: i64) -> Self {
        Self::new(format!("Question {id} not found"))
            .with_context("Question ids are column positions from the imported header row")
            .with_suggestion("TRY: List known questions: surveyflow questions")
    }

    /// Session id has no row
    pub fn session_not_found(id: i64) -> Self {
        Self::new(format!("Session {id} not found"))
            .with_context("Session ids are row positions from the imported export")
            .with_suggestion("TRY: Session ids start at 0 and follow import order")
    }

    /// A review selection matched no responses
    pub fn no_responses(kind: &str, id: i64) -> Self {
        Self::new(format!("No responses found for {kind} {id}"))
            .with_context("Nothing was read, so nothing was changed")
            .with_suggestion("TRY: List known questions: surveyflow questions")
    }

    /// Named report is not in the registry
    pub fn unknown_report(name: &str, known: &[&str]) -> Self {
        let err = Self::new(format!("Unknown report: '{name}'"))
            .with_suggestion("TRY: List available reports: surveyflow report list");
        if known.is_empty() {
            err.with_context("The report registry is empty")
        } else {
            err.with_context(format!("Known reports: {}", known.join(", ")))
        }
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as JSON on stdout (used when a `--json` command fails).
pub fn print_json_error(err: &anyhow::Error) {
    let payload = serde_json::json!({
        "error": format!("{err:#}"),
    });
    println!("{payload}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While processing data")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While processing data"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_db_not_found() {
        let path = PathBuf::from("/nonexistent/survey.sqlite3");
        let err = HelpfulError::db_not_found(&path);

        let display = format!("{}", err);
        assert!(display.contains("/nonexistent/survey.sqlite3"));
        assert!(display.contains("TRY:"));
    }

    #[test]
    fn test_unknown_report_lists_names() {
        let err = HelpfulError::unknown_report("oss", &["os", "tools"]);
        let display = format!("{}", err);
        assert!(display.contains("os, tools"));
    }
}
