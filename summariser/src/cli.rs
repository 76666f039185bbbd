use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(about, long_about = None)]
pub struct CliArgs {
    /// Path to a TOML report configuration. Defaults are used when not given.
    #[arg(long, global = true, env = "LATENCY_REPORT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyse result logs and print a report for each.
    Report(ReportArgs),

    /// Compare result logs against the first one given.
    Compare(CompareArgs),

    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Result logs to analyse.
    pub inputs: Vec<PathBuf>,

    /// Analyse every CSV result log found below this directory.
    #[arg(long, env = "LATENCY_RESULTS_DIR")]
    pub dir: Option<PathBuf>,

    /// Only keep the most recent run for each delay and round count.
    #[arg(long, default_value = "false")]
    pub latest_only: bool,

    /// Directory to write JSON reports to. No JSON is written when not given.
    #[arg(long, env = "LATENCY_REPORT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// Replace JSON reports that already exist.
    #[arg(long, default_value = "false")]
    pub overwrite: bool,

    /// Directory to write the per-object timing tables to as CSV.
    #[arg(long)]
    pub stats_csv: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompareArgs {
    /// Result logs to compare, the first is the baseline.
    #[arg(required = true, num_args = 2..)]
    pub inputs: Vec<PathBuf>,

    /// Write the comparison as JSON to this file.
    #[arg(long)]
    pub json: Option<PathBuf>,
}
