//! Sanitize command - Interactive review of survey responses

use crate::cli::error::HelpfulError;
use crate::sanitize::{ConsoleOperator, Engine, ReviewOptions, Selection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use surveyflow_db::SurveyDb;

/// Arguments for the sanitize command
#[derive(Debug, clap::Args)]
pub struct SanitizeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Also show responses that were already reviewed
    #[arg(long)]
    pub all: bool,
}

/// Exactly one selection mode must be given.
#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Review a single response id unconditionally
    #[arg(short = 'r', long)]
    pub response: Option<i64>,

    /// Review every response to a question, across sessions
    #[arg(short = 'q', long)]
    pub question: Option<i64>,

    /// Review every response in a session
    #[arg(short = 's', long)]
    pub session: Option<i64>,
}

impl TargetArgs {
    fn selection(&self) -> Selection {
        // clap guarantees exactly one is set
        if let Some(id) = self.response {
            Selection::Response(id)
        } else if let Some(id) = self.question {
            Selection::Question(id)
        } else {
            Selection::Session(self.session.unwrap_or_default())
        }
    }
}

/// Execute the sanitize command
pub async fn run(db: &SurveyDb, args: SanitizeArgs) -> anyhow::Result<()> {
    let selection = args.target.selection();

    // Validate the target before entering the loop, for friendlier errors
    // than a bare empty-candidate failure.
    match selection {
        Selection::Question(id) => {
            if db.get_question(id).await?.is_none() {
                return Err(HelpfulError::question_not_found(id).into());
            }
        }
        Selection::Session(id) => {
            if db.get_session(id).await?.is_none() {
                return Err(HelpfulError::session_not_found(id).into());
            }
        }
        Selection::Response(_) => {}
    }

    let cancel = install_cancel_handler()?;
    let stdin = std::io::stdin().lock();
    let operator = ConsoleOperator::new(stdin, std::io::stdout(), cancel);
    let mut engine = Engine::new(db, operator);

    let summary = engine
        .run(selection, ReviewOptions { show_all: args.all })
        .await?;

    if summary.cancelled {
        println!();
        println!("Review cancelled. Committed decisions are kept.");
    }
    println!(
        "Reviewed: {} committed, {} skipped",
        summary.committed, summary.skipped
    );

    Ok(())
}

/// Install a SIGINT/Ctrl-C handler that flips the shared cancel flag
/// instead of killing the process, so an in-flight batch ends cleanly.
fn install_cancel_handler() -> anyhow::Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));

    #[cfg(unix)]
    {
        use signal_hook::consts::SIGINT;
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT])?;
        let handler_flag = flag.clone();
        std::thread::spawn(move || {
            if signals.forever().next().is_some() {
                handler_flag.store(true, Ordering::SeqCst);
            }
        });
    }

    #[cfg(windows)]
    {
        let handler_flag = flag.clone();
        ctrlc::set_handler(move || {
            handler_flag.store(true, Ordering::SeqCst);
        })?;
    }

    Ok(flag)
}
