//! classbook - text-menu attendance, grades and document tracking
//!
//! Wires together:
//! - Configuration loading (user directory, ledger location)
//! - Ledger store
//! - Interaction shell on stdin/stdout

use anyhow::{Context, Result};
use clap::Parser;
use classbook::Shell;
use classbook_core::Classbook;
use classbook_store::LedgerStore;
use classbook_util::{CLASSBOOK_CONFIG_ENV, CLASSBOOK_LEDGER_ENV, default_config_path};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// classbook - attendance, grades and documents for a class
#[derive(Parser, Debug)]
#[command(name = "classbook")]
#[command(about = "Track class sessions, attendance, grades and document submissions", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/classbook/config.toml)
    #[arg(short, long, env = CLASSBOOK_CONFIG_ENV, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Ledger file override
    #[arg(long, env = CLASSBOOK_LEDGER_ENV)]
    ledger: Option<PathBuf>,

    /// Log level (logs go to stderr)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "classbook starting");

    let config = classbook_config::load_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let ledger_path = args.ledger.unwrap_or(config.ledger_path);

    // A corrupt ledger aborts startup; it is never repaired automatically
    let store = LedgerStore::open_file(&ledger_path)
        .with_context(|| format!("Failed to open ledger {:?}", ledger_path))?;

    let mut book = Classbook::new(config.directory, store);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mask_password = stdin.is_terminal();
    Shell::new(&mut book, stdin.lock(), stdout.lock())
        .with_masked_password(mask_password)
        .run()?;

    info!("classbook exiting");
    Ok(())
}
