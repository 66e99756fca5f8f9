//! NNA pipeline CLI.

use clap::{ColorChoice, Parser};
use nna_cli::config::{env_file_from_args, resolve_config};
use nna_cli::logging::{LogConfig, LogFormat, init_logging};
use nna_cli::pipeline::run_pipeline;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};

mod cli;
mod summary;

use crate::cli::{Cli, LogFormatArg, LogLevelArg};
use crate::summary::print_summary;

fn main() {
    // before parsing, so .env can supply NNA_CONFIG
    let env_file = env_file_from_args(std::env::args_os().skip(1));
    let loaded_env = load_env_file(env_file.as_deref());
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    if let Some(path) = loaded_env {
        debug!(path = %path.display(), "loaded environment file");
    }
    std::process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let resolved = match resolve_config(&cli.overrides(), |key| std::env::var(key).ok()) {
        Ok(resolved) => resolved,
        Err(error) => {
            error!(%error, "configuration rejected");
            eprintln!("error: {error}");
            return 1;
        }
    };
    match run_pipeline(&resolved.config, &resolved.notes) {
        Ok(outcome) => {
            print_summary(&outcome);
            0
        }
        Err(error) => {
            error!(%error, "pipeline aborted");
            eprintln!("error: {error}");
            if error.is_fatal() { 1 } else { 0 }
        }
    }
}

/// Loads `--env-file` or `./.env`; a missing default file is not an error.
fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => match dotenvy::from_path(path) {
            Ok(()) => Some(path.to_path_buf()),
            Err(error) => {
                eprintln!("warning: failed to load {}: {error}", path.display());
                None
            }
        },
        None => dotenvy::dotenv().ok(),
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
