//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod init;
mod migrate;
mod serve;
mod stats;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vocab_store::config::{load_settings_with_options, LoadOptions};
use vocab_store::models::Language;

#[derive(Parser)]
#[command(name = "vocab")]
#[command(about = "Vocabulary record store for language learning")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing vocab.db or a .db file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

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

/// Collections selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LanguageArg {
    En,
    Es,
    /// Every language
    All,
}

impl LanguageArg {
    fn languages(self) -> Vec<Language> {
        match self {
            Self::En => vec![Language::En],
            Self::Es => vec![Language::Es],
            Self::All => Language::ALL.to_vec(),
        }
    }
}

fn parse_language(s: &str) -> Result<Language, String> {
    Language::from_str(s).ok_or_else(|| format!("unsupported language '{}' (expected en or es)", s))
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the web server
    Serve {
        /// Address to bind (port, host, or host:port). Defaults to the configured bind.
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Backfill missing fields on stored words
    Migrate {
        /// Language collection to migrate
        #[arg(value_enum, default_value = "all")]
        language: LanguageArg,
    },

    /// Show learning statistics for a language
    Stats {
        /// Language collection (en or es)
        #[arg(value_parser = parse_language)]
        language: Language,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        target: cli.target,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind).await
        }
        Commands::Migrate { language } => {
            migrate::cmd_migrate(&settings, &language.languages()).await
        }
        Commands::Stats { language, json } => stats::cmd_stats(&settings, language, json).await,
    }
}
