use crate::domain::PsdError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ACCELERATION_FILE: &str = "acceleration_results.csv";
pub const DEFAULT_DISPLACEMENT_FILE: &str = "displacement_results.csv";
pub const DEFAULT_DELTA_ACCELERATION_FILE: &str = "acceleration_results_delta.csv";
pub const DEFAULT_DELTA_DISPLACEMENT_FILE: &str = "displacement_results_delta.csv";
pub const DEFAULT_PROCESSED_ACCELERATION_FILE: &str = "acceleration_results_processed.csv";
pub const DEFAULT_PROCESSED_DISPLACEMENT_FILE: &str = "displacement_results_processed.csv";
pub const DEFAULT_SIGNIFICANT_DIGITS: usize = 10;
pub const DEFAULT_DELTA_DEADBAND: f64 = 1.0e-6;

/// What to do with a channel that does not cover the shared frequency axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AxisPolicy {
    /// Abort the whole input.
    #[default]
    Strict,
    /// Treat the channel as absent and warn.
    SkipChannel,
}

/// Encoding of response plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlotFormat {
    #[default]
    Png,
    Jpeg,
}

impl PlotFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionConfig {
    pub acceleration_file: String,
    pub displacement_file: String,
    pub delta_acceleration_file: String,
    pub delta_displacement_file: String,
    /// Re-rendered copies of the current tables written next to the deltas.
    pub processed_acceleration_file: String,
    pub processed_displacement_file: String,
    pub significant_digits: usize,
    pub delta_deadband: f64,
    pub axis_policy: AxisPolicy,
    pub plot_format: PlotFormat,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            acceleration_file: DEFAULT_ACCELERATION_FILE.to_string(),
            displacement_file: DEFAULT_DISPLACEMENT_FILE.to_string(),
            delta_acceleration_file: DEFAULT_DELTA_ACCELERATION_FILE.to_string(),
            delta_displacement_file: DEFAULT_DELTA_DISPLACEMENT_FILE.to_string(),
            processed_acceleration_file: DEFAULT_PROCESSED_ACCELERATION_FILE.to_string(),
            processed_displacement_file: DEFAULT_PROCESSED_DISPLACEMENT_FILE.to_string(),
            significant_digits: DEFAULT_SIGNIFICANT_DIGITS,
            delta_deadband: DEFAULT_DELTA_DEADBAND,
            axis_policy: AxisPolicy::default(),
            plot_format: PlotFormat::default(),
        }
    }
}

impl ExtractionConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(1..=17).contains(&self.significant_digits) {
            return Err(ConfigError::Invalid(format!(
                "significantDigits must be within 1..=17, got {}",
                self.significant_digits
            )));
        }
        if !self.delta_deadband.is_finite() || self.delta_deadband < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "deltaDeadband must be finite and non-negative, got {}",
                self.delta_deadband
            )));
        }
        for (field, name) in [
            ("accelerationFile", &self.acceleration_file),
            ("displacementFile", &self.displacement_file),
            ("deltaAccelerationFile", &self.delta_acceleration_file),
            ("deltaDisplacementFile", &self.delta_displacement_file),
            ("processedAccelerationFile", &self.processed_acceleration_file),
            ("processedDisplacementFile", &self.processed_displacement_file),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} cannot be empty")));
            }
        }
        Ok(self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read extraction config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse extraction config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid extraction config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for PsdError {
    fn from(error: ConfigError) -> Self {
        match &error {
            ConfigError::Read { .. } => PsdError::io_system("IO.CONFIG_READ", error.to_string()),
            ConfigError::Parse { .. } | ConfigError::Invalid(_) => {
                PsdError::input_validation("INPUT.CONFIG_PARSE", error.to_string())
            }
        }
    }
}

pub fn parse_extraction_config(source: &str) -> Result<ExtractionConfig, serde_json::Error> {
    serde_json::from_str(source)
}

pub fn load_extraction_config(path: impl AsRef<Path>) -> Result<ExtractionConfig, ConfigError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_extraction_config(&source)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
        .validate()
}
