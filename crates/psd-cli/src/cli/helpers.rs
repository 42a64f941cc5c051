use super::CliError;
use anyhow::Context;
use psd_core::common::{ExtractionConfig, PlotFormat, load_extraction_config};
use psd_core::domain::{Dof, OutputArtifact, PsdError, PsdWarning};
use serde::Serialize;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. `RUST_LOG` takes precedence over the flags.
pub(super) fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else if quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    // A subscriber may already be installed when commands run in-process.
    if let Err(error) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init()
    {
        debug!("keeping existing tracing subscriber: {error}");
    }
}

pub(super) fn load_config(path: Option<&Path>) -> Result<ExtractionConfig, CliError> {
    match path {
        Some(path) => load_extraction_config(path).map_err(|error| CliError::Compute(error.into())),
        None => Ok(ExtractionConfig::default()),
    }
}

pub(super) fn validated(config: ExtractionConfig) -> Result<ExtractionConfig, CliError> {
    config
        .validate()
        .map_err(|error| CliError::Compute(PsdError::from(error)))
}

pub(super) fn default_output_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub(super) fn print_artifacts(output_dir: &Path, artifacts: &[OutputArtifact]) {
    for artifact in artifacts {
        println!("{}", output_dir.join(&artifact.relative_path).display());
    }
}

pub(super) fn log_warnings(warnings: &[PsdWarning]) {
    for warning in warnings {
        warn!(code = warning.code(), "{warning}");
    }
}

pub(super) fn write_json_report<T: Serialize>(path: &Path, report: &T) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    let mut json = serde_json::to_string_pretty(report)
        .with_context(|| format!("failed to serialize report for '{}'", path.display()))?;
    json.push('\n');
    fs::write(path, json).with_context(|| format!("failed to write report '{}'", path.display()))?;
    Ok(())
}

pub(super) fn check_non_negative(name: &str, value: f64) -> Result<f64, CliError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CliError::Usage(format!(
            "--{name} must be a finite non-negative number, got {value}"
        )))
    }
}

pub(super) fn parse_dof(value: &str) -> Result<Dof, String> {
    Dof::from_label(&value.to_ascii_uppercase())
        .ok_or_else(|| format!("expected one of T1, T2, T3, R1, R2, R3, got '{value}'"))
}

pub(super) fn parse_plot_format(value: &str) -> Result<PlotFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "png" => Ok(PlotFormat::Png),
        "jpg" | "jpeg" => Ok(PlotFormat::Jpeg),
        _ => Err(format!("expected png or jpg, got '{value}'")),
    }
}
