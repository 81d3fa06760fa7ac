//! Run configuration: defaults < TOML file < command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use energy_analyser_consolidate::{C_OUTPUT_FILE_NAME_DEFAULT, SpecSourceConfig};
use serde::Deserialize;

use crate::args::Cli;

const C_PATTERN_DEFAULT: &str = "*.csv";

/// Front-end settings that are not part of the source layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecRunConfig {
    pub pattern: Option<String>,
    pub output: Option<PathBuf>,
    pub workers: Option<usize>,
    pub log_level: Option<String>,
}

/// Shape of the `--config` TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecConfigFile {
    pub source: SpecSourceConfig,
    pub run: SpecRunConfig,
}

/// Fully merged settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRunPlan {
    pub source: SpecSourceConfig,
    pub pattern: String,
    pub output: PathBuf,
    pub workers: Option<usize>,
    pub log_level: Option<String>,
}

pub fn load_config_file(path: &Path) -> Result<SpecConfigFile> {
    let c_text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&c_text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Merge the optional config file and the flags of `cli`.
pub fn resolve_run_plan(cli: &Cli) -> Result<SpecRunPlan> {
    let config_file = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => SpecConfigFile::default(),
    };
    Ok(merge_run_plan(config_file, cli))
}

fn merge_run_plan(config_file: SpecConfigFile, cli: &Cli) -> SpecRunPlan {
    let SpecConfigFile { mut source, run } = config_file;

    override_with(&mut source.date_column_label, &cli.date_column);
    override_with(&mut source.time_column_label, &cli.time_column);
    override_with(&mut source.power_column_label, &cli.power_column);
    override_with(&mut source.header_row_number, &cli.header_row);
    override_with(&mut source.delimiter, &cli.delimiter);
    override_with(&mut source.timestamp_format, &cli.timestamp_format);
    override_with(&mut source.field_names.date, &cli.field_date);
    override_with(&mut source.field_names.time, &cli.field_time);
    override_with(&mut source.field_names.power, &cli.field_power);
    if cli.resample_minutes.is_some() {
        source.resample_minutes = cli.resample_minutes;
    }

    SpecRunPlan {
        source,
        pattern: cli
            .pattern
            .clone()
            .or(run.pattern)
            .unwrap_or_else(|| C_PATTERN_DEFAULT.to_string()),
        output: cli
            .output
            .clone()
            .or(run.output)
            .unwrap_or_else(|| PathBuf::from(C_OUTPUT_FILE_NAME_DEFAULT)),
        workers: cli.workers.or(run.workers),
        log_level: cli.log_level.clone().or(run.log_level),
    }
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}
