//! CLI definitions for Tandem.

use std::convert::Infallible;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tandem_config::ConfigLoader;

/// Path argument with `~` expanded to the home directory.
fn expanded_path(value: &str) -> Result<PathBuf, Infallible> {
    Ok(PathBuf::from(ConfigLoader::expand_path(value)))
}

/// Tandem CLI.
#[derive(Parser)]
#[command(name = "tandem")]
#[command(about = "Research assistant that delegates email drafting to a second agent")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (built-in defaults when omitted)
    #[arg(short, long, global = true, env = "TANDEM_CONFIG", value_parser = expanded_path)]
    pub config: Option<PathBuf>,

    /// Also write logs to daily rolling files in this directory
    #[arg(long, global = true, value_parser = expanded_path)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run one prompt through the research assistant
    Run {
        /// JSON script of model replies, keyed by agent id
        #[arg(short, long, value_parser = expanded_path)]
        script: PathBuf,

        /// Print the final report as JSON instead of text
        #[arg(long)]
        json: bool,

        /// The prompt
        prompt: String,
    },

    /// Load and validate the configuration
    CheckConfig,
}
