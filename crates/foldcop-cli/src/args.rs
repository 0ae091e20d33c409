use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the foldcop binary.
#[derive(Parser, Debug)]
#[command(
    name = "foldcop",
    version,
    about = "Finds reduce/inject blocks that drop their accumulator"
)]
pub struct CliArgs {
    /// Files or directories to lint.
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output format.
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Path to a .foldcop.json file. Defaults to the nearest one above the
    /// current directory.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Only analyze reduce/inject calls that pass an initial value.
    #[arg(long = "require-initial-value", value_name = "BOOL")]
    pub require_initial_value: Option<bool>,

    /// List the available rules and exit.
    #[arg(long = "list-rules")]
    pub list_rules: bool,

    /// Print the resolved configuration and exit.
    #[arg(long = "show-config")]
    pub show_config: bool,

    /// Lowest severity that makes the process exit with status 1.
    #[arg(long = "fail-level", value_enum, default_value_t = FailLevel::Warning)]
    pub fail_level: FailLevel,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FailLevel {
    Info,
    Warning,
    Error,
}
