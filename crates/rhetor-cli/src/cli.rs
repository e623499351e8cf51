//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};

/// Rhetor CLI - Detect logical fallacies in text and review past analyses.
#[derive(Debug, Parser)]
#[command(name = "rhetor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RHETOR_CONFIG")]
    pub config: Option<String>,

    /// Attempt database path
    #[arg(long, global = true, env = "RHETOR_DB")]
    pub db: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze text for logical fallacies
    Analyze(AnalyzeArgs),

    /// List recorded analysis attempts
    History(HistoryArgs),

    /// Show one recorded attempt
    Show(ShowArgs),

    /// Aggregate statistics over recorded attempts
    Stats(StatsArgs),

    /// List the fallacy kinds the analyzer reports
    Kinds,

    /// Describe a fallacy kind
    Explain(ExplainArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Text to analyze
    pub text: Option<String>,

    /// Read the text from stdin
    #[arg(long, conflicts_with = "text")]
    pub stdin: bool,

    /// Also write a friendly reply explaining the findings
    #[arg(long)]
    pub respond: bool,
}

/// Filters shared by history and stats.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct QueryArgs {
    /// Filter by status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// Only attempts requested at or after this time (unix milliseconds)
    #[arg(long)]
    pub since: Option<u64>,

    /// Only attempts requested at or before this time (unix milliseconds)
    #[arg(long)]
    pub until: Option<u64>,
}

/// Arguments for the history command.
#[derive(Debug, Parser)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Maximum number of results
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Attempt ID
    pub id: String,
}

/// Arguments for the stats command.
#[derive(Debug, Parser)]
pub struct StatsArgs {
    #[command(flatten)]
    pub query: QueryArgs,
}

/// Arguments for the explain command.
#[derive(Debug, Parser)]
pub struct ExplainArgs {
    /// Fallacy kind (e.g. ad_hominem, "slippery slope")
    pub kind: String,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Status filter argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StatusArg {
    /// Successful attempts
    Success,
    /// Failed attempts
    Failed,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<StatusArg> for rhetor_domain::StatusFilter {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Success => rhetor_domain::StatusFilter::Success,
            StatusArg::Failed => rhetor_domain::StatusFilter::Failed,
        }
    }
}

impl QueryArgs {
    /// Convert to a store query.
    pub fn to_query(&self, limit: Option<usize>) -> rhetor_domain::AttemptQuery {
        rhetor_domain::AttemptQuery {
            status: self.status.map(Into::into),
            since: self.since,
            until: self.until,
            limit,
        }
    }
}
