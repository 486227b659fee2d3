//! Surveyflow - survey import, sanitization, and reporting
//!
//! Single-operator, single-connection CLI over a SQLite survey database.
//! Commands run on a current-thread runtime; the only blocking point is
//! the per-response prompt during review.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use surveyflow::cli;
use surveyflow_db::SurveyDb;

#[derive(Parser, Debug)]
#[command(name = "surveyflow", about = "Survey import, sanitization, and reporting")]
struct Cli {
    /// Survey database file (default: ~/.surveyflow/surveyflow.sqlite3)
    #[arg(long, global = true, env = "SURVEYFLOW_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a spreadsheet CSV export (creates the database if needed)
    Import(cli::import::ImportArgs),

    /// List imported questions
    Questions(cli::questions::QuestionsArgs),

    /// Show one session's responses
    Responses(cli::responses::ResponsesArgs),

    /// Review responses interactively
    Sanitize(cli::sanitize::SanitizeArgs),

    /// Aggregate resolved values into reports
    Report(cli::report::ReportArgs),

    /// Show current configuration and paths
    Config(cli::config::ConfigArgs),
}

impl Commands {
    fn wants_json(&self) -> bool {
        match self {
            Commands::Questions(args) => args.json,
            Commands::Responses(args) => args.json,
            Commands::Report(args) => cli::report::wants_json(args),
            Commands::Config(args) => args.json,
            Commands::Import(_) | Commands::Sanitize(_) => false,
        }
    }

    /// Everything except import and config reads an existing database.
    fn requires_existing_db(&self) -> bool {
        !matches!(self, Commands::Import(_) | Commands::Config(_))
    }
}

async fn run_command(command: Commands, db_path: PathBuf) -> Result<()> {
    match command {
        Commands::Config(args) => cli::config::run(args),
        Commands::Import(args) => {
            // open() creates the database (and parent directory) if needed
            let db = SurveyDb::open(&db_path).await?;
            let result = cli::import::run(&db, args).await;
            db.close().await;
            result
        }
        Commands::Questions(args) => {
            let db = SurveyDb::open_existing(&db_path).await?;
            let result = cli::questions::run(&db, args).await;
            db.close().await;
            result
        }
        Commands::Responses(args) => {
            let db = SurveyDb::open_existing(&db_path).await?;
            let result = cli::responses::run(&db, args).await;
            db.close().await;
            result
        }
        Commands::Sanitize(args) => {
            let db = SurveyDb::open_existing(&db_path).await?;
            let result = cli::sanitize::run(&db, args).await;
            db.close().await;
            result
        }
        Commands::Report(args) => {
            let db = SurveyDb::open_existing(&db_path).await?;
            let result = cli::report::run(&db, args).await;
            db.close().await;
            result
        }
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();

    // Initialize logging - route to stderr in JSON mode so structured
    // output on stdout stays parseable
    let json_mode = args.command.wants_json();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "surveyflow=info,surveyflow_db=info".into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);
    if json_mode {
        subscriber.with_writer(std::io::stderr).init();
    } else {
        subscriber.init();
    }

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(cli::config::default_db_path);

    // The driver validates the storage location before any core operation
    if args.command.requires_existing_db() && !db_path.is_file() {
        eprintln!("{}", cli::HelpfulError::db_not_found(&db_path));
        return ExitCode::from(1);
    }

    // Single operator, single connection: a current-thread runtime is all
    // the concurrency this tool has
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start runtime: {err}");
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run_command(args.command, db_path)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{err:#}");
            }
            ExitCode::from(1)
        }
    }
}
