//! Command-line interface.
//!
//! Parses arguments, loads settings and dispatches to the command modules.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "docverify")]
#[command(about = "Laboratory report verification and quality certification")]
#[command(version)]
pub struct Cli {
    /// Data directory holding standards/, extracted_data/ and certificates/
    #[arg(long, short = 'd', global = true, env = "DOCVERIFY_DATA_DIR")]
    data: Option<PathBuf>,

    /// Config file (TOML, YAML or JSON); discovered automatically if omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative config paths against the current directory
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Check if the server is being started (for early logging setup).
pub fn is_serve() -> bool {
    std::env::args().skip(1).any(|arg| arg == "serve")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: $HOST:$PORT or 0.0.0.0:8000)
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Extract and verify PDFs against the configured standard
    Verify {
        /// PDF files to verify
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Do not write certificates for passing documents
        #[arg(long)]
        no_certificate: bool,
    },

    /// Verify a pre-extracted parameters JSON file
    VerifyJson {
        /// Parameters file (as written to extracted_data/)
        file: PathBuf,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a standard JSON from a standard PDF
    ExtractStandard {
        /// Standard document
        pdf: PathBuf,
        /// Output JSON path (default: the configured standard file)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Standard family
        #[arg(long, default_value = "honey")]
        kind: String,
    },

    /// Check external tools and configuration
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        data: cli.data,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Serve { bind } => commands::serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Verify {
            files,
            json,
            no_certificate,
        } => commands::verify::cmd_verify(&settings, &files, json, !no_certificate).await,
        Commands::VerifyJson { file, json } => {
            commands::verify::cmd_verify_json(&settings, &file, json).await
        }
        Commands::ExtractStandard { pdf, output, kind } => {
            commands::standard::cmd_extract_standard(&settings, &pdf, output.as_deref(), &kind)
                .await
        }
        Commands::Check => commands::check::cmd_check(&settings).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_verify() {
        let cli = Cli::try_parse_from(["docverify", "-v", "verify", "a.pdf", "b.pdf", "--json"])
            .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Verify { files, json, .. } => {
                assert_eq!(files.len(), 2);
                assert!(json);
            }
            _ => panic!("expected verify"),
        }
    }

    #[test]
    fn test_verify_requires_files() {
        assert!(Cli::try_parse_from(["docverify", "verify"]).is_err());
    }
}
