use super::ModuleExecutor;
use super::delta::{DeltaOutcome, compute_delta};
use super::extract::{
    ExtractionModule, ExtractionReport, ExtractionRequest, ensure_output_dir, log_warnings,
};
use super::serialization::{load_table_csv, write_table_csv};
use crate::common::ExtractionConfig;
use crate::common::config::{DEFAULT_DELTA_DEADBAND, DEFAULT_SIGNIFICANT_DIGITS};
use crate::domain::{OutputArtifact, PsdResult, ResponseKind};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct DeltaRequest {
    pub current_path: PathBuf,
    pub baseline_path: PathBuf,
    pub output_path: PathBuf,
    pub deadband: f64,
    pub significant_digits: usize,
}

impl DeltaRequest {
    pub fn new(
        current_path: impl Into<PathBuf>,
        baseline_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            current_path: current_path.into(),
            baseline_path: baseline_path.into(),
            output_path: output_path.into(),
            deadband: DEFAULT_DELTA_DEADBAND,
            significant_digits: DEFAULT_SIGNIFICANT_DIGITS,
        }
    }
}

/// Diffs two table files on disk and writes `baseline - current`.
pub struct DeltaModule;

impl DeltaModule {
    pub fn run(&self, request: &DeltaRequest) -> PsdResult<DeltaOutcome> {
        let current = load_table_csv(&request.current_path)?;
        let baseline = load_table_csv(&request.baseline_path)?;
        let outcome = compute_delta(&current, &baseline, request.deadband)?;
        log_warnings(&outcome.warnings);

        if let Some(parent) = request
            .output_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            ensure_output_dir(parent)?;
        }
        write_table_csv(
            &request.output_path,
            &outcome.table,
            request.significant_digits,
        )?;
        info!(path = %request.output_path.display(), "wrote delta table");
        Ok(outcome)
    }
}

impl ModuleExecutor for DeltaModule {
    type Request = DeltaRequest;

    fn execute(&self, request: &DeltaRequest) -> PsdResult<Vec<OutputArtifact>> {
        self.run(request)?;
        Ok(vec![OutputArtifact::new(&request.output_path)])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub extraction: ExtractionRequest,
    pub baseline_acceleration: Option<PathBuf>,
    pub baseline_displacement: Option<PathBuf>,
}

impl PipelineRequest {
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            extraction: ExtractionRequest::new(input_path, output_dir),
            baseline_acceleration: None,
            baseline_displacement: None,
        }
    }

    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.extraction = self.extraction.with_config(config);
        self
    }

    pub fn with_baselines(
        mut self,
        acceleration: Option<PathBuf>,
        displacement: Option<PathBuf>,
    ) -> Self {
        self.baseline_acceleration = acceleration;
        self.baseline_displacement = displacement;
        self
    }

    fn delta_file(&self, kind: ResponseKind) -> &str {
        let config = &self.extraction.config;
        match kind {
            ResponseKind::Acceleration => &config.delta_acceleration_file,
            ResponseKind::Displacement => &config.delta_displacement_file,
        }
    }

    fn processed_file(&self, kind: ResponseKind) -> &str {
        let config = &self.extraction.config;
        match kind {
            ResponseKind::Acceleration => &config.processed_acceleration_file,
            ResponseKind::Displacement => &config.processed_displacement_file,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub extraction: ExtractionReport,
    /// Empty when the delta step was skipped.
    pub deltas: Vec<(ResponseKind, DeltaOutcome)>,
    pub artifacts: Vec<OutputArtifact>,
}

/// Extracts both tables and, when both baselines exist, writes both deltas
/// plus re-rendered copies of the current tables.
pub fn run_pipeline(request: &PipelineRequest) -> PsdResult<PipelineReport> {
    let extraction = ExtractionModule.run(&request.extraction)?;
    let mut artifacts = extraction.artifacts.clone();
    let mut deltas = Vec::new();

    let baselines = match (&request.baseline_acceleration, &request.baseline_displacement) {
        (Some(acceleration), Some(displacement))
            if acceleration.is_file() && displacement.is_file() =>
        {
            Some([
                (ResponseKind::Acceleration, acceleration),
                (ResponseKind::Displacement, displacement),
            ])
        }
        _ => None,
    };
    let Some(baselines) = baselines else {
        info!("baseline tables not available; skipping delta computation");
        return Ok(PipelineReport {
            extraction,
            deltas,
            artifacts,
        });
    };

    let config = &request.extraction.config;
    let output_dir = &request.extraction.output_dir;
    for (kind, baseline_path) in baselines {
        // Diff the tables as written so both sides carry the same rounding.
        let current = load_table_csv(&output_dir.join(request.extraction.output_file(kind)))?;
        let baseline = load_table_csv(baseline_path)?;
        let outcome = compute_delta(&current, &baseline, config.delta_deadband)?;
        log_warnings(&outcome.warnings);

        let delta = OutputArtifact::new(request.delta_file(kind));
        let path = output_dir.join(&delta.relative_path);
        write_table_csv(&path, &outcome.table, config.significant_digits)?;
        info!(path = %path.display(), kind = %kind, "wrote delta table");

        let processed = OutputArtifact::new(request.processed_file(kind));
        let path = output_dir.join(&processed.relative_path);
        write_table_csv(&path, &current, config.significant_digits)?;
        info!(path = %path.display(), kind = %kind, "wrote processed table");

        artifacts.push(delta);
        artifacts.push(processed);
        deltas.push((kind, outcome));
    }

    Ok(PipelineReport {
        extraction,
        deltas,
        artifacts,
    })
}
