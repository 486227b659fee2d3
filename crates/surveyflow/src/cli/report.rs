//! Report command - Aggregate resolved values into tables
//!
//! Rendering is deliberately plain: tables on the terminal, or JSON for
//! whatever charting tool consumes the output downstream.

use crate::cli::config;
use crate::cli::error::HelpfulError;
use crate::cli::output::print_table;
use crate::report::{
    crosstab, frequency, frequency_report, CrosstabReport, ReportKind, ReportRegistry,
};
use clap::Subcommand;
use std::path::PathBuf;
use surveyflow_db::{StoredResponse, SurveyDb};

/// Arguments for the report command
#[derive(Debug, clap::Args)]
pub struct ReportArgs {
    /// Report registry file (TOML); default ~/.surveyflow/reports.toml
    #[arg(long)]
    pub reports: Option<PathBuf>,

    #[command(subcommand)]
    pub action: ReportAction,
}

/// Subcommands for reporting
#[derive(Subcommand, Debug, Clone)]
pub enum ReportAction {
    /// List available named reports
    List {
        #[arg(long)]
        json: bool,
    },
    /// Run a named report from the registry
    Run {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Frequency counts over one question
    Freq {
        /// Question id to aggregate
        #[arg(short = 'q', long)]
        question: i64,

        /// Split multi-select answers on `;` before counting
        #[arg(long)]
        split: bool,

        /// Column label for the value axis
        #[arg(long)]
        key: Option<String>,

        /// Report title (defaults to the question text)
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// Cross-tabulate an anchor question against breakdown questions
    Crosstab {
        /// Anchor question id (top-level buckets)
        #[arg(long)]
        anchor: i64,

        /// Breakdown question id (repeatable)
        #[arg(long = "by", required = true)]
        breakdowns: Vec<i64>,

        /// Report title (defaults to the anchor question text)
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

pub fn wants_json(args: &ReportArgs) -> bool {
    match &args.action {
        ReportAction::List { json }
        | ReportAction::Run { json, .. }
        | ReportAction::Freq { json, .. }
        | ReportAction::Crosstab { json, .. } => *json,
    }
}

/// Execute the report command
pub async fn run(db: &SurveyDb, args: ReportArgs) -> anyhow::Result<()> {
    let registry_path = args
        .reports
        .unwrap_or_else(config::default_reports_path);
    let registry = ReportRegistry::load(&registry_path)?;

    match args.action {
        ReportAction::List { json } => run_list(&registry, json),

        ReportAction::Run { name, json } => {
            let spec = registry
                .get(&name)
                .ok_or_else(|| HelpfulError::unknown_report(&name, &registry.names()))?;
            match spec.kind.clone() {
                ReportKind::Frequency {
                    question,
                    split,
                    key,
                } => run_frequency(db, question, split, key, Some(spec.title.clone()), json).await,
                ReportKind::Crosstab { anchor, breakdowns } => {
                    run_crosstab(db, anchor, breakdowns, Some(spec.title.clone()), json).await
                }
            }
        }

        ReportAction::Freq {
            question,
            split,
            key,
            title,
            json,
        } => {
            run_frequency(
                db,
                question,
                split,
                key.unwrap_or_else(|| "Value".to_string()),
                title,
                json,
            )
            .await
        }

        ReportAction::Crosstab {
            anchor,
            breakdowns,
            title,
            json,
        } => run_crosstab(db, anchor, breakdowns, title, json).await,
    }
}

fn run_list(registry: &ReportRegistry, json: bool) -> anyhow::Result<()> {
    if json {
        let payload = serde_json::json!({ "reports": registry.specs() });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No named reports configured.");
        println!("Define some in ~/.surveyflow/reports.toml, or use 'report freq' / 'report crosstab' directly.");
        return Ok(());
    }

    let rows = registry
        .specs()
        .iter()
        .map(|spec| {
            let kind = match &spec.kind {
                ReportKind::Frequency { question, split, .. } => {
                    if *split {
                        format!("frequency (split) on Q{question}")
                    } else {
                        format!("frequency on Q{question}")
                    }
                }
                ReportKind::Crosstab { anchor, breakdowns } => {
                    let by: Vec<String> = breakdowns.iter().map(|id| format!("Q{id}")).collect();
                    format!("crosstab Q{anchor} by {}", by.join(", "))
                }
            };
            vec![spec.name.clone(), spec.title.clone(), kind]
        })
        .collect();
    print_table(&["NAME", "TITLE", "KIND"], rows);

    Ok(())
}

/// Fetch one question's responses, failing helpfully if the question is
/// unknown or nothing was imported for it.
async fn fetch_question_rows(db: &SurveyDb, question_id: i64) -> anyhow::Result<(String, Vec<StoredResponse>)> {
    let question = db
        .get_question(question_id)
        .await?
        .ok_or_else(|| HelpfulError::question_not_found(question_id))?;
    let rows = db.responses_for_question(question_id).await?;
    if rows.is_empty() {
        return Err(HelpfulError::no_responses("question", question_id).into());
    }
    Ok((question.text, rows))
}

async fn run_frequency(
    db: &SurveyDb,
    question_id: i64,
    split: bool,
    key: String,
    title: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let (question_text, rows) = fetch_question_rows(db, question_id).await?;
    let (counts, denominator) = frequency(&rows, split)?;
    let report = frequency_report(
        title.unwrap_or(question_text),
        key,
        counts,
        denominator,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", report.title);
    println!(
        "Respondents with a non-empty answer: {}",
        report.denominator
    );
    let key = report.key.clone();
    let rows = report
        .rows
        .into_iter()
        .map(|row| {
            vec![
                row.value,
                row.count.to_string(),
                format!("{}%", row.percent),
            ]
        })
        .collect();
    print_table(&[key.as_str(), "COUNT", "PERCENT"], rows);

    Ok(())
}

async fn run_crosstab(
    db: &SurveyDb,
    anchor_id: i64,
    breakdown_ids: Vec<i64>,
    title: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let (anchor_text, anchor_rows) = fetch_question_rows(db, anchor_id).await?;

    let mut breakdowns = Vec::with_capacity(breakdown_ids.len());
    for id in breakdown_ids {
        let question = db
            .get_question(id)
            .await?
            .ok_or_else(|| HelpfulError::question_not_found(id))?;
        let rows = db.responses_for_question(id).await?;
        breakdowns.push((question.text, rows));
    }

    let report = crosstab(title.unwrap_or(anchor_text), &anchor_rows, &breakdowns)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_crosstab(&report);
    Ok(())
}

fn print_crosstab(report: &CrosstabReport) {
    println!("{}", report.title);
    println!();
    for parent in &report.parents {
        println!("{}  ({})", parent.value, parent.count);
        for slice in &parent.slices {
            if slice.children.is_empty() {
                continue;
            }
            println!("  {}", slice.label);
            for child in &slice.children {
                println!("    {}: {}", child.value, child.count);
            }
        }
    }
}
