//! Configuration paths for Surveyflow
//!
//! Simple path resolution with sensible defaults.
//! All paths are under ~/.surveyflow/

use std::path::PathBuf;

/// Get the Surveyflow home directory: ~/.surveyflow
///
/// Honors `SURVEYFLOW_HOME` for tests and unusual setups.
pub fn surveyflow_home() -> PathBuf {
    if let Ok(home) = std::env::var("SURVEYFLOW_HOME") {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".surveyflow")
}

/// Default survey database path: ~/.surveyflow/surveyflow.sqlite3
pub fn default_db_path() -> PathBuf {
    surveyflow_home().join("surveyflow.sqlite3")
}

/// Default report registry path: ~/.surveyflow/reports.toml
pub fn default_reports_path() -> PathBuf {
    surveyflow_home().join("reports.toml")
}

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved paths in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run the config command - shows current paths
pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let home = surveyflow_home();
    let db = default_db_path();
    let reports = default_reports_path();

    if args.json {
        let config = serde_json::json!({
            "home": home.to_string_lossy(),
            "database": {
                "path": db.to_string_lossy(),
                "exists": db.exists(),
            },
            "reports": {
                "path": reports.to_string_lossy(),
                "exists": reports.exists(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("SURVEYFLOW CONFIGURATION");
        println!("========================");
        println!();
        println!("Home:     {}", home.display());
        println!();
        println!(
            "Database: {} ({})",
            db.display(),
            if db.exists() { "exists" } else { "not found" }
        );
        println!(
            "Reports:  {} ({})",
            reports.display(),
            if reports.exists() { "exists" } else { "not found" }
        );
    }

    Ok(())
}
