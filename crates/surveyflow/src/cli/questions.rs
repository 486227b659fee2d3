//! Questions command - List imported questions

use crate::cli::output::print_table;
use surveyflow_db::SurveyDb;

/// Arguments for the questions command
#[derive(Debug, clap::Args)]
pub struct QuestionsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the questions command
pub async fn run(db: &SurveyDb, args: QuestionsArgs) -> anyhow::Result<()> {
    let questions = db.list_questions().await?;

    if args.json {
        let payload = serde_json::json!({ "questions": questions });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if questions.is_empty() {
        println!("No questions imported yet. Run: surveyflow import <csv>");
        return Ok(());
    }

    let rows = questions
        .iter()
        .map(|q| vec![q.id.to_string(), q.text.clone()])
        .collect();
    print_table(&["ID", "QUESTION"], rows);

    Ok(())
}
