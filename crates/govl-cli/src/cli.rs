use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "govl",
    about = "Governance Ledger: tamper-evident audit trail for credit decisions",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Ledger file (overrides `ledger.path` from the configuration)
    #[arg(short, long, global = true)]
    pub ledger: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record a scoring decision (refused while the model is paused)
    Record(RecordArgs),
    /// Show the most recent entries, newest first
    Log(LogArgs),
    /// Show one entry in full
    Show(ShowArgs),
    /// Verify hash-chain integrity
    Verify(VerifyArgs),
    /// Pause live predictions
    Pause(PauseArgs),
    /// Resume live predictions
    Resume(ResumeArgs),
    /// Show gate status and ledger length
    Status,
    /// Compute group approval rates and the disparate impact ratio
    Fairness(FairnessArgs),
    /// Show decision and gate-transition totals
    Summary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutcomeArg {
    Approve,
    Deny,
}

#[derive(Args)]
pub struct RecordArgs {
    #[arg(short, long)]
    pub model_version: String,
    #[arg(short, long)]
    pub outcome: OutcomeArg,
    /// Model probability in [0, 1]
    #[arg(short, long)]
    pub probability: f64,
    /// Model inputs as one JSON object
    #[arg(long)]
    pub inputs: Option<String>,
    /// A single input as KEY=VALUE; VALUE is parsed as JSON, else kept as text
    #[arg(short, long = "input", value_name = "KEY=VALUE")]
    pub input: Vec<String>,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub sequence: u64,
}

#[derive(Args)]
pub struct VerifyArgs {
    #[arg(long, default_value = "1")]
    pub from: u64,
    /// Last sequence to verify (defaults to the current length)
    #[arg(long)]
    pub to: Option<u64>,
}

#[derive(Args)]
pub struct PauseArgs {
    pub reason: String,
}

#[derive(Args)]
pub struct ResumeArgs {
    /// Reason to record (defaults to `gate.resume_reason`)
    #[arg(short, long)]
    pub reason: Option<String>,
}

#[derive(Args)]
pub struct FairnessArgs {
    /// Input field holding the protected attribute
    #[arg(short, long, default_value = "gender")]
    pub group_key: String,
    /// Disparate impact threshold (defaults to the configured policy)
    #[arg(short, long)]
    pub threshold: Option<f64>,
}
