//! CLI argument definitions for the NNA pipeline.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use nna_cli::config::ConfigOverrides;

#[derive(Parser)]
#[command(
    name = "nna-pipeline",
    version,
    about = "NNA data-quality pipeline - audit, clean and profile an intervention table",
    long_about = "Load a CSV or Excel extract of child and adolescent interventions, audit \
                  its quality, clean it and write the cleaned table plus profiling tables.\n\n\
                  Settings are layered: built-in defaults, then the --config TOML file, then \
                  environment variables (DATA_FILE, SENTINEL_CODES, NNA_OUTPUT_DIR), then flags."
)]
pub struct Cli {
    /// Input table (.csv, .xlsx or .xls); overrides DATA_FILE.
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output directory (default: ./output); overrides NNA_OUTPUT_DIR.
    #[arg(long = "output-dir", short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// TOML file with pipeline settings.
    #[arg(long = "config", short = 'c', value_name = "PATH", env = "NNA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Sentinel code treated as "not applicable" (repeatable); overrides
    /// SENTINEL_CODES.
    #[arg(long = "sentinel", value_name = "CODE")]
    pub sentinels: Vec<String>,

    /// Read environment variables from this file instead of ./.env.
    #[arg(long = "env-file", value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Keep personal columns and raw identifiers.
    #[arg(long = "no-pii")]
    pub no_pii: bool,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            input: self.input.clone(),
            output_dir: self.output_dir.clone(),
            sentinels: (!self.sentinels.is_empty()).then(|| self.sentinels.clone()),
            disable_pii: self.no_pii,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
