pub mod chain_cleaner;
pub mod config;
pub mod demo;
pub mod errors;
pub mod labels;
pub mod log_sorter;
pub mod logger;
pub mod logging;
pub mod runtime;
pub mod scheduling;
pub mod sort_key;
pub mod task_metadata;
pub mod types;
pub mod usher;

use clap::{error::ErrorKind, Parser};
use config::{load_config, AppConfig, CliOverrides};
use errors::SchedlogError;
use log_sorter::ScheduleBasedLogSorter;
use logger::Logger;
use logging::read_jsonl_records;
use runtime::ProductionRuntime;
use std::path::{Path, PathBuf};
use types::LogLevel;
use std::sync::Arc;

#[derive(Debug, Clone, Parser)]
#[command(name = "schedlog")]
#[command(about = "Re-sort logged batches into the order their work was scheduled")]
pub struct Cli {
    /// JSONL batch written through `logger.log_file`
    pub input: Option<PathBuf>,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Write sorted lines here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Bit mask of active levels: 1 info, 2 detailed, 4 debug
    #[arg(long)]
    pub activation_level: Option<u8>,
    /// Enable this level and every less verbose one: info, detailed or debug
    #[arg(long, value_parser = parse_level, conflicts_with = "activation_level")]
    pub level: Option<LogLevel>,
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// Run a fork-join demo with schedule-based logging and flush it
    #[arg(long, default_value_t = false)]
    pub demo: bool,
}

fn parse_level(value: &str) -> Result<LogLevel, String> {
    LogLevel::parse_cli(value).ok_or_else(|| {
        let known = LogLevel::ALL.map(LogLevel::as_str).join(", ");
        format!("unknown level {value:?}, expected one of {known}")
    })
}

pub fn run() -> Result<i32, SchedlogError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let runtime = ProductionRuntime::new();
    run_with_runtime(&args, &runtime)
}

pub fn run_with_runtime(
    args: &[std::ffi::OsString],
    runtime: &ProductionRuntime,
) -> Result<i32, SchedlogError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(SchedlogError::Cli(error.to_string())),
        },
    };

    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        output_path: cli.output.clone(),
        activation_level: cli.activation_level,
        level: cli.level,
        log_file: cli.log_file.clone(),
    };
    let cfg = load_config(&overrides, runtime.file_system.as_ref())?;

    if cli.demo {
        run_demo(&cfg, runtime)?;
        return Ok(0);
    }

    let Some(input) = cli.input.as_deref() else {
        return Err(SchedlogError::Cli(
            "an INPUT batch or --demo is required".to_string(),
        ));
    };
    let lines = sort_batch_file(runtime, input)?;
    emit_lines(&cfg, runtime, &lines)?;
    Ok(0)
}

/// Reads a persisted JSONL batch and returns its lines in scheduling order.
pub fn sort_batch_file(
    runtime: &ProductionRuntime,
    input: &Path,
) -> Result<Vec<String>, SchedlogError> {
    let records = read_jsonl_records(runtime.file_system.as_ref(), input)?;
    ScheduleBasedLogSorter::new(&records)?.sort()
}

fn emit_lines(
    cfg: &AppConfig,
    runtime: &ProductionRuntime,
    lines: &[String],
) -> Result<(), SchedlogError> {
    let Some(path) = cfg.output.path.as_deref() else {
        return runtime.terminal.write_lines(lines);
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            runtime.file_system.create_dir_all(parent)?;
        }
    }
    let mut contents = lines.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    runtime.file_system.write_string(path, &contents)
}

fn run_demo(cfg: &AppConfig, runtime: &ProductionRuntime) -> Result<(), SchedlogError> {
    let mut logger_cfg = cfg.logger.clone();
    logger_cfg.schedule_based_logging = true;
    let logger = Arc::new(Logger::new(logger_cfg, runtime));

    let executor = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| SchedlogError::Io(e.to_string()))?;
    executor.block_on(demo::fork_join(Arc::clone(&logger)))?;
    logger.flush()
}
