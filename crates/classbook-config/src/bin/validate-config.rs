//! Config validation CLI tool
//!
//! Validates a classbook configuration file and reports any errors.

use classbook_config::Role;
use classbook_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a classbook configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match classbook_config::load_config(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", classbook_config::CURRENT_CONFIG_VERSION);
            println!("  Ledger: {}", config.ledger_path.display());
            println!("  Users: {}", config.directory.len());

            let teachers = config
                .directory
                .users()
                .iter()
                .filter(|u| u.role == Role::Teacher)
                .count();
            println!("    teachers: {}", teachers);
            println!("    students: {}", config.directory.students().len());

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                classbook_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                classbook_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                classbook_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                classbook_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        classbook_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
