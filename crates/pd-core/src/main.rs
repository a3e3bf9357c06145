//! pd-core: digest prevalence survey snapshots into consistent rolled-up tables.

use std::path::PathBuf;

use clap::Parser;
use pd_common::{Error, FileVariant};
use pd_config::{resolve_config, DigestConfig};
use pd_core::logging::{init_logging, LogFormat};
use pd_core::{run_file, ExitCode};
use tracing::{error, info};

/// Validate and digest prevalence survey snapshot files
#[derive(Parser, Debug)]
#[command(name = "pd-core", version, about)]
struct Cli {
    /// Input CSV files; each one is an independent run
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Root directory for output tables (one subdirectory per input)
    #[arg(long, default_value = "out/prevalence_digest")]
    out: PathBuf,

    /// Config file (overrides PD_CONFIG and the XDG config)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Grouping that carries a uniform scale factor; detected from the file name if absent
    #[arg(long, value_enum)]
    variant: Option<FileVariant>,

    /// Rolling window length in days; repeat for several (replaces the configured windows)
    #[arg(long = "window", value_name = "DAYS")]
    windows: Vec<usize>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load_config(cli: &Cli) -> Result<DigestConfig, Error> {
    let (mut config, source) =
        resolve_config(cli.config.as_deref()).map_err(|e| Error::Config(e.to_string()))?;
    info!(%source, "configuration loaded");

    if !cli.windows.is_empty() {
        config.windows = cli.windows.clone();
        config.validate().map_err(|e| Error::Config(e.to_string()))?;
    }
    Ok(config)
}

fn run(cli: &Cli) -> ExitCode {
    let config = match load_config(cli) {
        Ok(config) => config,
        Err(err) => {
            error!(code = err.code(), "{err}");
            return ExitCode::from_error(&err);
        }
    };

    let mut worst = ExitCode::Clean;
    for input in &cli.inputs {
        let code = match run_file(input, &cli.out, &config, cli.variant) {
            Ok(report) => report.exit_code(),
            Err(err) => {
                error!(file = %input.display(), code = err.code(), "{err}");
                ExitCode::from_error(&err)
            }
        };
        worst = worst.max(code);
    }
    worst
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbose);
    let code = run(&cli);
    std::process::exit(code.as_i32());
}
