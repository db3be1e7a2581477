// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warrantor - warranty registration backend.
//!
//! This is the binary entry point.

mod config_cmd;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use warrantor_config::{ConfigError, WarrantorConfig};

/// Warrantor - warranty registration backend.
#[derive(Parser, Debug)]
#[command(name = "warrantor", version, about, long_about = None)]
struct Cli {
    /// Read this TOML file instead of the standard config locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP/WebSocket server.
    Serve,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate and print the effective configuration, secrets redacted.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            warrantor_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("warrantor: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config {
            action: ConfigAction::Check,
        }) => match config_cmd::render(&config) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("warrantor: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("warrantor: use --help for available commands");
        }
    }
}

fn load(path: Option<&std::path::Path>) -> Result<WarrantorConfig, Vec<ConfigError>> {
    match path {
        Some(path) => warrantor_config::load_and_validate_path(path),
        None => warrantor_config::load_and_validate(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_and_config_check() {
        let cli = Cli::try_parse_from(["warrantor", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));

        let cli =
            Cli::try_parse_from(["warrantor", "config", "check", "--config", "w.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Check
            })
        ));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("w.toml")));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["warrantor", "shell"]).is_err());
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warrantor.toml");
        std::fs::write(&path, "[server]\nport = 4100\n").unwrap();
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 4100);
    }
}
