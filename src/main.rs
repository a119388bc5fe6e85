//! edugen CLI entry point.

use clap::Parser;

use edugen::cli::{self, commands, Cli, Commands};
use edugen::infrastructure::logging::{LogConfig, LoggerImpl};
use edugen::LoggingConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // `config validate` reports load failures itself, so logging falls back
    // to defaults when the configuration cannot be loaded.
    let loaded = cli::load_config(cli.config.as_ref());
    let logging = loaded
        .as_ref()
        .map_or_else(|_| LoggingConfig::default(), |c| c.logging.clone());
    let mut log_config = LogConfig::from(&logging);
    if cli.verbose {
        log_config.level = "debug".to_string();
    }
    let _logger = match LoggerImpl::init(&log_config) {
        Ok(logger) => logger,
        Err(err) => cli::handle_error(err, cli.json),
    };

    let result = match (cli.command, loaded) {
        (Commands::Config(args), _) => {
            commands::config::execute(args, cli.config.as_ref(), cli.json).await
        }
        (_, Err(err)) => Err(err),
        (Commands::Profiles(args), Ok(config)) => {
            commands::profiles::execute(args, &config, cli.json).await
        }
        (Commands::Parse(args), Ok(config)) => {
            commands::parse::execute(args, &config, cli.json).await
        }
        (Commands::Run(args), Ok(config)) => commands::run::execute(args, &config, cli.json).await,
        (Commands::Format(args), Ok(config)) => {
            commands::format::execute(args, &config, cli.json).await
        }
        (Commands::Plan(args), Ok(_)) => commands::plan::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        cli::handle_error(err, cli.json);
    }
}
