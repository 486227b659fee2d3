//! CLI module for Surveyflow
//!
//! One module per subcommand, plus shared helpers for configuration,
//! errors, and table output.

pub mod config;
pub mod error;
pub mod output;

pub mod import;
pub mod questions;
pub mod report;
pub mod responses;
pub mod sanitize;

pub use error::HelpfulError;
pub use output::print_table;
