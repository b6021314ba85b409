use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "combiner",
    version,
    about = "Submit spreadsheets to the combiner backend and track the resulting jobs"
)]
pub struct Cli {
    /// RON configuration file (defaults to ./combiner.ron when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Backend base URL, e.g. http://127.0.0.1:8000
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// File holding the jobs tracked between runs
    #[arg(long, global = true, value_name = "FILE")]
    pub state_file: Option<PathBuf>,
    /// Milliseconds between status checks of an unfinished job
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,
    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload files as a new job and follow it until it finishes
    Submit(SubmitArgs),
    /// Follow every unfinished job until it finishes
    Watch,
    /// Show the tracked jobs without contacting the backend
    List,
    /// Rename a job; an empty name leaves it unchanged
    Rename(RenameArgs),
    /// Delete a job on the backend and stop tracking it
    Delete(JobArgs),
    /// Save the result file of a completed job
    Download(DownloadArgs),
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Display name of the job
    #[arg(short, long)]
    pub name: String,
    /// Files to combine
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
    /// Return once the job is created instead of waiting for it to finish
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Args)]
pub struct JobArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    pub id: String,
    /// Directory to save into (defaults to the configured download dir)
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}
