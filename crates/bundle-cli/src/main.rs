use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::Level;

mod cli;
mod commands;

/// Exit status for anticipated failures: lock contention, corruption, bad input.
const EXIT_EXPECTED: u8 = 1;
/// Exit status for system failures.
const EXIT_SYSTEM: u8 = 2;

fn main() -> ExitCode {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_EXPECTED)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let ctx = commands::Context {
        format: cli.format,
        config: cli.config,
    };
    match commands::run_command(&ctx, cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(exit_status(&err))
        }
    }
}

fn exit_status(err: &anyhow::Error) -> u8 {
    let expected = err.chain().any(|cause| {
        if let Some(e) = cause.downcast_ref::<bundle_core::BundleError>() {
            e.is_expected()
        } else if let Some(e) = cause.downcast_ref::<bundle_pool::PoolError>() {
            e.is_expected()
        } else {
            matches!(
                cause.downcast_ref::<bundle_lock::LockError>(),
                Some(bundle_lock::LockError::Held { .. })
            )
        }
    });
    if expected {
        EXIT_EXPECTED
    } else {
        EXIT_SYSTEM
    }
}
