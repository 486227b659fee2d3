//! Responses command - Show one session's answers
//!
//! Dead answers with no override are skipped; sanitized responses show
//! both the original and the current override.

use crate::cli::error::HelpfulError;
use anyhow::Context;
use std::collections::HashMap;
use surveyflow_db::{StoredResponse, SurveyDb};

/// Arguments for the responses command
#[derive(Debug, clap::Args)]
pub struct ResponsesArgs {
    /// Session id to show responses for
    pub session: i64,

    /// Limit to a single question id
    #[arg(short = 'q', long)]
    pub question: Option<i64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the responses command
pub async fn run(db: &SurveyDb, args: ResponsesArgs) -> anyhow::Result<()> {
    let Some(session) = db.get_session(args.session).await? else {
        return Err(HelpfulError::session_not_found(args.session).into());
    };

    let responses = match args.question {
        Some(question_id) => {
            if db.get_question(question_id).await?.is_none() {
                return Err(HelpfulError::question_not_found(question_id).into());
            }
            let response = db
                .response_for_pair(args.session, question_id)
                .await?
                .ok_or_else(|| HelpfulError::no_responses("question", question_id))?;
            vec![response]
        }
        None => db.responses_for_session(args.session).await?,
    };

    let question_texts: HashMap<i64, String> = db
        .list_questions()
        .await?
        .into_iter()
        .map(|q| (q.id, q.text))
        .collect();

    if args.json {
        let mut rows = Vec::with_capacity(responses.len());
        for response in &responses {
            let resolved = response.resolve()?.to_string();
            rows.push(serde_json::json!({
                "responseId": response.id,
                "questionId": response.question_id,
                "question": question_texts.get(&response.question_id),
                "state": response.state,
                "original": response.original,
                "override": response.override_value,
                "resolved": resolved,
            }));
        }
        let payload = serde_json::json!({ "session": args.session, "responses": rows });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!(
        "Session {} (submitted {})",
        session.id,
        format_timestamp(&session.timestamp)
    );
    println!();
    for response in &responses {
        print_response(response, &question_texts)?;
    }

    Ok(())
}

/// Normalize a spreadsheet timestamp for display; unparseable values are
/// shown verbatim (the export format is not under our control).
fn format_timestamp(raw: &str) -> String {
    match chrono::NaiveDateTime::parse_from_str(raw, "%Y/%m/%d %H:%M:%S") {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn print_response(
    response: &StoredResponse,
    question_texts: &HashMap<i64, String>,
) -> anyhow::Result<()> {
    // Dead answer with no override: nothing to show
    if !response.state.is_sanitized() && response.original.is_empty() {
        return Ok(());
    }

    let question = question_texts
        .get(&response.question_id)
        .with_context(|| format!("question {} has no matching text", response.question_id))?;

    println!("QUESTION: {question}");
    println!("RESPONSE: {}", response.original);
    if response.state.is_sanitized() {
        // The override must exist when the state says sanitized
        println!("SANITIZE: {}", response.resolve()?);
    }
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_normalizes_known_format() {
        assert_eq!(
            format_timestamp("2026/01/05 10:03:41"),
            "2026-01-05 10:03"
        );
    }

    #[test]
    fn test_format_timestamp_passes_through_unknown_format() {
        assert_eq!(
            format_timestamp("2019/10/13 2:03:41 PM GMT+2"),
            "2019/10/13 2:03:41 PM GMT+2"
        );
        assert_eq!(format_timestamp(""), "");
    }
}
