use crate::errors::SchedlogError;
use crate::runtime::FileSystem;
use crate::types::LogLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub activation_level: Option<u8>,
    pub level: Option<LogLevel>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logger: LoggerConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggerConfig {
    pub activation_level: u8,
    pub schedule_based_logging: bool,
    pub log_file: Option<PathBuf>,
    /// Literal substrings replaced in every message, e.g. long root paths.
    pub unclutter: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            activation_level: LogLevel::Info.bit(),
            schedule_based_logging: false,
            log_file: None,
            unclutter: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialAppConfig {
    logger: Option<PartialLoggerConfig>,
    output: Option<PartialOutputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialLoggerConfig {
    activation_level: Option<u8>,
    schedule_based_logging: Option<bool>,
    log_file: Option<PathBuf>,
    unclutter: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialOutputConfig {
    path: Option<PathBuf>,
}

pub fn load_config(
    overrides: &CliOverrides,
    fs: &dyn FileSystem,
) -> Result<AppConfig, SchedlogError> {
    let mut cfg = AppConfig::default();

    if let Some(path) = &overrides.config_path {
        if !fs.exists(path) {
            return Err(SchedlogError::InvalidConfig(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        let file_contents = fs.read_to_string(path)?;
        cfg = parse_config(&file_contents)?;
    }

    apply_cli_overrides(&mut cfg, overrides);
    validate_config(&cfg)?;
    Ok(cfg)
}

pub fn parse_config(text: &str) -> Result<AppConfig, SchedlogError> {
    let partial: PartialAppConfig =
        toml::from_str(text).map_err(|e| SchedlogError::ConfigParse(e.to_string()))?;
    let mut cfg = AppConfig::default();
    merge_partial_config(&mut cfg, partial);
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut AppConfig, partial: PartialAppConfig) {
    if let Some(logger) = partial.logger {
        if let Some(value) = logger.activation_level {
            cfg.logger.activation_level = value;
        }
        if let Some(value) = logger.schedule_based_logging {
            cfg.logger.schedule_based_logging = value;
        }
        if let Some(value) = logger.log_file {
            cfg.logger.log_file = Some(value);
        }
        if let Some(value) = logger.unclutter {
            cfg.logger.unclutter = value;
        }
    }

    if let Some(output) = partial.output {
        if let Some(path) = output.path {
            cfg.output.path = Some(path);
        }
    }
}

fn apply_cli_overrides(cfg: &mut AppConfig, overrides: &CliOverrides) {
    if let Some(level) = overrides.level {
        cfg.logger.activation_level = level.mask_through();
    }
    if let Some(level) = overrides.activation_level {
        cfg.logger.activation_level = level;
    }
    if let Some(path) = &overrides.output_path {
        cfg.output.path = Some(path.clone());
    }
    if let Some(path) = &overrides.log_file {
        cfg.logger.log_file = Some(path.clone());
    }
}

fn validate_config(cfg: &AppConfig) -> Result<(), SchedlogError> {
    if cfg.logger.activation_level > LogLevel::ALL_BITS {
        return Err(SchedlogError::InvalidConfig(format!(
            "logger.activation_level must be between 0 and {}, got {}",
            LogLevel::ALL_BITS,
            cfg.logger.activation_level
        )));
    }

    if cfg.logger.unclutter.keys().any(|needle| needle.is_empty()) {
        return Err(SchedlogError::InvalidConfig(
            "logger.unclutter keys must be non-empty".to_string(),
        ));
    }

    Ok(())
}
