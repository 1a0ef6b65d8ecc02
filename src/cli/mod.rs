//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Caviardeur using clap.

pub mod commands;

use crate::config::{load_config, load_default_config, CaviardeurConfig};
use crate::domain::Result;
use clap::{Parser, Subcommand};
use std::path::Path;

/// Configuration file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "caviardeur.toml";

/// Caviardeur - pseudonymization of personal data in documents
#[derive(Parser, Debug)]
#[command(name = "caviardeur")]
#[command(version, about, long_about = None)]
#[command(author = "Caviardeur Contributors")]
pub struct Cli {
    /// Path to configuration file (defaults to ./caviardeur.toml when present)
    #[arg(long, env = "CAVIARDEUR_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CAVIARDEUR_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect and pseudonymize personal data in documents
    Run(commands::run::RunArgs),

    /// Put original values back into a pseudonymized text file
    Restore(commands::restore::RestoreArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

/// Load the configuration for a command
///
/// An explicit path must exist. Without one, `./caviardeur.toml` is used
/// when present, otherwise defaults plus environment overrides.
pub fn resolve_config(config_path: Option<&str>) -> Result<CaviardeurConfig> {
    match config_path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load_config(DEFAULT_CONFIG_FILE),
        None => load_default_config(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["caviardeur", "run", "documents"]);
        assert!(cli.config.is_none());
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.input, PathBuf::from("documents"));
        assert!(!args.dry_run);
    }

    #[test]
    fn test_cli_parse_run_options() {
        let cli = Cli::parse_from([
            "caviardeur",
            "run",
            "in",
            "-o",
            "out",
            "--dry-run",
            "-c",
            "0.85",
            "-m",
            "old/mapping.json",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert!(args.dry_run);
        assert_eq!(args.confidence, Some(0.85));
        assert_eq!(args.mapping, Some(PathBuf::from("old/mapping.json")));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["caviardeur", "--config", "custom.toml", "validate-config"]);
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["caviardeur", "--log-level", "debug", "init"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_restore_requires_mapping() {
        assert!(Cli::try_parse_from(["caviardeur", "restore", "pseudo.txt"]).is_err());

        let cli = Cli::parse_from(["caviardeur", "restore", "pseudo.txt", "-m", "mapping.json"]);
        assert!(matches!(cli.command, Commands::Restore(_)));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["caviardeur", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["caviardeur", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_resolve_config_missing_explicit_file() {
        assert!(resolve_config(Some("/nonexistent/caviardeur.toml")).is_err());
    }
}
