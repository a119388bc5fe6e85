//! `edugen config`: show or validate the effective configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::load_config;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the merged configuration (API key redacted)
    Show,
    /// Check the merged configuration and report the first problem
    Validate,
}

#[derive(Debug, serde::Serialize)]
pub struct ConfigShowOutput {
    pub config: Config,
    pub api_key_present: bool,
}

impl ConfigShowOutput {
    fn new(config: &Config) -> Self {
        let api_key_present = config.substrate.resolve_api_key().is_some();
        let mut config = config.clone();
        if config.substrate.api_key.is_some() {
            config.substrate.api_key = Some("<redacted>".to_string());
        }
        Self {
            config,
            api_key_present,
        }
    }
}

impl CommandOutput for ConfigShowOutput {
    fn to_human(&self) -> String {
        let yaml = serde_yaml::to_string(&self.config).unwrap_or_default();
        format!(
            "{}\napi key: {}",
            yaml.trim_end(),
            if self.api_key_present { "present" } else { "missing" }
        )
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ConfigValidateOutput {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandOutput for ConfigValidateOutput {
    fn to_human(&self) -> String {
        match &self.error {
            None => "Configuration is valid.".to_string(),
            Some(err) => format!("Configuration is invalid: {err}"),
        }
    }
}

impl ConfigValidateOutput {
    fn from_result(result: &Result<Config>) -> Self {
        Self {
            valid: result.is_ok(),
            error: result.as_ref().err().map(|e| format!("{e:#}")),
        }
    }
}

/// Loads the configuration itself so that `validate` can report a broken
/// file instead of failing before dispatch.
pub async fn execute(args: ConfigArgs, path: Option<&PathBuf>, json_mode: bool) -> Result<()> {
    let loaded = load_config(path);
    match args.command {
        ConfigCommands::Show => output(&ConfigShowOutput::new(&loaded?), json_mode),
        ConfigCommands::Validate => {
            let out = ConfigValidateOutput::from_result(&loaded);
            output(&out, json_mode);
            if !out.valid {
                anyhow::bail!("configuration is invalid");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_show_redacts_api_key() {
        let mut config = Config::default();
        config.substrate.api_key = Some("sk-secret".to_string());

        let out = ConfigShowOutput::new(&config);
        assert!(out.api_key_present);
        let human = out.to_human();
        assert!(!human.contains("sk-secret"));
        assert!(human.contains("<redacted>"));
        assert!(human.ends_with("api key: present"));
    }

    #[test]
    fn test_validate_reports_broken_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "engine:\n  max_attempts: 0").unwrap();
        file.flush().unwrap();

        temp_env::with_vars_unset(["EDUGEN_ENGINE__MAX_ATTEMPTS"], || {
            let path = file.path().to_path_buf();
            let out = ConfigValidateOutput::from_result(&load_config(Some(&path)));
            assert!(!out.valid);
            assert!(out.to_human().contains("max_attempts"));
        });
    }

    #[test]
    fn test_validate_accepts_good_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "engine:\n  max_attempts: 3").unwrap();
        file.flush().unwrap();

        temp_env::with_vars_unset(["EDUGEN_ENGINE__MAX_ATTEMPTS"], || {
            let path = file.path().to_path_buf();
            let out = ConfigValidateOutput::from_result(&load_config(Some(&path)));
            assert!(out.valid);
            assert_eq!(out.to_human(), "Configuration is valid.");
        });
    }
}
