use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Proof-of-delivery progression tracker
///
/// Walks each trip/client pair through the POD steps
/// (started → complete → pod_received → pod_submitted → settled) and keeps
/// the evidence documents for every step. Without `--api-url` all data lives
/// in a local SQLite database.
#[derive(Parser)]
#[command(version, about, name = "pod")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/podtrack/podtrack.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Directory uploaded files are copied into in local mode
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Base URL of the fleet back office API; switches to remote mode
    #[arg(long, global = true, env = "PODTRACK_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for the API
    #[arg(long, global = true, env = "PODTRACK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Seconds a single request may take
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Show unrecognized statuses as the first step instead of failing
    #[arg(long, global = true)]
    pub lenient_status: bool,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the pod CLI
#[derive(Subcommand)]
pub enum Commands {
    /// List the POD steps in order
    Steps,
    /// Create a POD record for a trip/client pair (local mode only)
    #[command(alias = "r")]
    Register(RegisterArgs),
    /// Show the current step and the uploaded documents
    #[command(alias = "s")]
    Show(PodArgs),
    /// Move to the next step
    #[command(alias = "a")]
    Advance(PodArgs),
    /// Move back to the previous step
    Revert(PodArgs),
    /// Upload an evidence document for a step
    #[command(alias = "u")]
    Upload(UploadArgs),
    /// Upload a standalone file and print its URL
    Attach(AttachArgs),
    /// List uploaded documents grouped by step
    #[command(alias = "d")]
    Docs(PodArgs),
}

/// Identifies a trip/client pair
#[derive(ClapArgs)]
pub struct PodArgs {
    #[arg(help = "Trip identifier")]
    pub trip_id: String,
    #[arg(help = "Client identifier within the trip")]
    pub client_id: String,
}

#[derive(ClapArgs)]
pub struct RegisterArgs {
    #[command(flatten)]
    pub pod: PodArgs,
    #[arg(short, long, help = "Initial step key (defaults to the first step)")]
    pub status: Option<String>,
}

#[derive(ClapArgs)]
pub struct UploadArgs {
    #[command(flatten)]
    pub pod: PodArgs,
    #[arg(help = "Key of the step the document is evidence for")]
    pub step: String,
    #[arg(help = "Path of the file to upload")]
    pub file: PathBuf,
}

#[derive(ClapArgs)]
pub struct AttachArgs {
    #[command(flatten)]
    pub pod: PodArgs,
    #[arg(help = "Path of the file to upload")]
    pub file: PathBuf,
}
