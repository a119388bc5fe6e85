//! Command-line interface for edugen.

pub mod commands;
pub mod output;
pub mod table;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

#[derive(Parser, Debug)]
#[command(name = "edugen")]
#[command(
    about = "Extract, validate and converge structured educational content from model replies",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .edugen/config.yaml and .edugen/local.yaml)
    #[arg(short, long, global = true, env = "EDUGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the generator profiles and their fields
    Profiles(commands::profiles::ProfilesArgs),

    /// Apply one stored reply to a generation state
    Parse(commands::parse::ParseArgs),

    /// Request replies from the configured model and fold them into a state
    Run(commands::run::RunArgs),

    /// Apply one stored `@@`-separated reply to a format-driven state
    Format(commands::format::FormatArgs),

    /// Parse a course outline into sections and topics
    Plan(commands::plan::PlanArgs),

    /// Inspect the effective configuration
    Config(commands::config::ConfigArgs),
}

/// Load configuration from an explicit file or the default hierarchy.
pub fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Report a command failure and exit with a non-zero status.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": chain,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
