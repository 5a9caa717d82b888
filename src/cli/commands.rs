//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Singer tap for the Zoom API
#[derive(Parser, Debug)]
#[command(name = "tap-zoom")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Endpoint graph: built-in name or YAML/JSON file
    #[arg(short = 'e', long, global = true, default_value = "zoom")]
    pub graph: String,

    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Catalog file (JSON)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Directory of `<stream>.json` schema files
    #[arg(long, global = true)]
    pub schemas_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Test connection to the API
    Check,

    /// Print the catalog of available streams
    Discover,

    /// Sync selected streams to stdout
    Sync {
        /// Streams to sync (comma-separated, empty = catalog selection)
        #[arg(long, value_delimiter = ',')]
        streams: Vec<String>,

        /// Resume at the stream named by `currently_syncing`
        #[arg(long)]
        resume: bool,

        /// Also write every state checkpoint to this file
        #[arg(long)]
        state_output: Option<PathBuf>,
    },

    /// Validate the endpoint graph
    Validate,

    /// Show the stream tree
    Streams,

    /// List built-in graphs
    List,
}
