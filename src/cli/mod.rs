//! Command Line Interface module
//!
//! Implements the CLI commands and argument parsing for PantryBot.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "pantrybot")]
#[command(about = "PantryBot Discord food scanner")]
#[command(
    long_about = "A Discord bot that scans food photos and receipts with Gemini and suggests recipes"
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    #[arg(long, default_value = "config.toml")]
    pub config_file: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Dry-run mode: show the resolved configuration without connecting to Discord
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug, Clone, Default)]
pub enum Commands {
    /// Connect to Discord and serve commands
    #[default]
    Run,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the actual command, using default if none provided
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or_default()
    }

    /// Adjust log level based on verbose flag
    pub fn effective_log_level(&self) -> String {
        if self.verbose {
            "debug".to_string()
        } else {
            self.log_level.clone()
        }
    }

    /// Check if we're running in dry-run mode
    pub fn is_dry_run_mode(&self) -> bool {
        self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_run() {
        let cli = Cli::parse_from(["pantrybot"]);
        assert!(matches!(cli.command(), Commands::Run));
        assert_eq!(cli.config_file, "config.toml");
        assert_eq!(cli.effective_log_level(), "info");
        assert!(!cli.is_dry_run_mode());
    }

    #[test]
    fn test_verbose_overrides_log_level() {
        let cli = Cli::parse_from(["pantrybot", "-v", "--log-level", "warn", "--dry-run"]);
        assert_eq!(cli.effective_log_level(), "debug");
        assert!(cli.is_dry_run_mode());
    }

    #[test]
    fn test_config_subcommand() {
        let cli = Cli::parse_from(["pantrybot", "--config-file", "bot.toml", "config", "reset"]);
        assert_eq!(cli.config_file, "bot.toml");
        assert!(matches!(
            cli.command(),
            Commands::Config {
                action: Some(ConfigAction::Reset)
            }
        ));
    }
}
