//! CLI module
//!
//! Command-line interface for the tap.
//!
//! # Commands
//!
//! - `check` - Test connection to the API
//! - `discover` - Print the catalog
//! - `sync` - Sync selected streams as Singer messages on stdout
//! - `validate` - Validate the endpoint graph
//! - `streams` - Show the stream tree
//! - `list` - List built-in graphs

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_sync_args() {
        let cli = Cli::parse_from([
            "tap-zoom",
            "-C",
            "config.json",
            "sync",
            "--streams",
            "users,meetings",
            "--resume",
        ]);

        assert_eq!(cli.graph, "zoom");
        assert_eq!(cli.config.unwrap().to_str(), Some("config.json"));
        match cli.command {
            Commands::Sync {
                streams,
                resume,
                state_output,
            } => {
                assert_eq!(streams, vec!["users", "meetings"]);
                assert!(resume);
                assert!(state_output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["tap-zoom", "discover", "-e", "graph.yaml", "-v"]);
        assert_eq!(cli.graph, "graph.yaml");
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Discover));
    }

    #[test]
    fn test_missing_subcommand_fails() {
        assert!(Cli::try_parse_from(["tap-zoom"]).is_err());
    }
}
