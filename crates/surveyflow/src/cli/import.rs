//! Import command - Load a spreadsheet export into the survey database
//!
//! The header row carries the question texts (first column is the
//! submission timestamp, excluded from question numbering); every
//! following row is one session. Import is idempotent: an existing
//! (session, question) pair is never overwritten.

use crate::cli::error::HelpfulError;
use crate::cli::output::pluralize;
use std::path::PathBuf;
use surveyflow_db::SurveyDb;
use tracing::info;

/// Arguments for the import command
#[derive(Debug, clap::Args)]
pub struct ImportArgs {
    /// Survey CSV file exported from the spreadsheet
    pub csv: PathBuf,
}

/// Totals across one import run
#[derive(Debug, Default)]
struct ImportSummary {
    questions_seen: u64,
    questions_new: u64,
    sessions_seen: u64,
    sessions_new: u64,
    responses_new: u64,
    responses_ignored: u64,
}

/// Execute the import command
pub async fn run(db: &SurveyDb, args: ImportArgs) -> anyhow::Result<()> {
    if !args.csv.is_file() {
        return Err(HelpfulError::file_not_found(&args.csv).into());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(&args.csv)
        .map_err(|err| HelpfulError::csv_parse_error(&args.csv, &err.to_string()))?;

    let mut records = reader.records();
    let mut summary = ImportSummary::default();

    // First line contains the questions, so we'll handle it first.
    let header = match records.next() {
        Some(record) => {
            record.map_err(|err| HelpfulError::csv_parse_error(&args.csv, &err.to_string()))?
        }
        None => {
            return Err(HelpfulError::csv_parse_error(&args.csv, "file is empty")
                .with_suggestion("TRY: The first row must contain the question texts")
                .into());
        }
    };

    // First column is the timestamp
    for (question_id, text) in header.iter().skip(1).enumerate() {
        summary.questions_seen += 1;
        if db.import_question(question_id as i64, text.trim()).await? {
            summary.questions_new += 1;
        }
    }

    for (session_id, record) in records.enumerate() {
        let record =
            record.map_err(|err| HelpfulError::csv_parse_error(&args.csv, &err.to_string()))?;
        let Some(timestamp) = record.get(0) else {
            continue;
        };
        let answers: Vec<String> = record.iter().skip(1).map(str::to_string).collect();

        let counts = db
            .import_submission(session_id as i64, timestamp.trim(), &answers)
            .await?;
        summary.sessions_seen += 1;
        summary.sessions_new += counts.sessions_inserted;
        summary.responses_new += counts.responses_inserted;
        summary.responses_ignored += counts.responses_ignored;
    }

    info!(
        sessions = summary.sessions_new,
        questions = summary.questions_new,
        responses = summary.responses_new,
        "Import finished"
    );

    println!(
        "Imported {} ({} new), {} ({} new)",
        pluralize(summary.questions_seen, "question"),
        summary.questions_new,
        pluralize(summary.sessions_seen, "session"),
        summary.sessions_new,
    );
    println!(
        "Responses: {} new, {} already present",
        summary.responses_new, summary.responses_ignored
    );

    Ok(())
}
