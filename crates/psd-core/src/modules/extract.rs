use super::ModuleExecutor;
use super::plot::{all_nodes_plot_file, node_plot_file, plot_all_nodes, plot_node_response};
use super::serialization::write_table_csv;
use super::table::TableAssembler;
use crate::common::ExtractionConfig;
use crate::domain::{
    Dof, FeatureTable, NodeId, OutputArtifact, PsdError, PsdResult, PsdWarning, ResponseKind,
};
use crate::parser::{ParsedResponses, parse_response_blocks};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSummary {
    pub source: String,
    pub node_count: usize,
    pub acceleration_headers: usize,
    pub displacement_headers: usize,
    pub malformed_headers: usize,
    pub skipped_rows: usize,
    pub channel_count: usize,
    pub frequency_count: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub acceleration: FeatureTable,
    pub displacement: FeatureTable,
    pub summary: ExtractionSummary,
    pub warnings: Vec<PsdWarning>,
}

impl ExtractionOutcome {
    pub fn table(&self, kind: ResponseKind) -> &FeatureTable {
        match kind {
            ResponseKind::Acceleration => &self.acceleration,
            ResponseKind::Displacement => &self.displacement,
        }
    }
}

pub(crate) fn log_warnings(warnings: &[PsdWarning]) {
    for warning in warnings {
        warn!(code = warning.code(), "{warning}");
    }
}

/// Parses one response file and assembles both feature tables.
///
/// `source_label` names the input in diagnostics. Fails when nothing usable
/// was recovered or, under the strict axis policy, when a channel does not
/// cover the frequency axis.
pub fn extract_features(
    source: &str,
    source_label: &str,
    config: &ExtractionConfig,
) -> PsdResult<ExtractionOutcome> {
    let parsed = parse_response_blocks(source).ensure_populated(source_label)?;
    assemble_outcome(&parsed, source_label, config)
}

fn assemble_outcome(
    parsed: &ParsedResponses,
    source_label: &str,
    config: &ExtractionConfig,
) -> PsdResult<ExtractionOutcome> {
    info!(
        source = source_label,
        acce_headers = parsed.stats.acceleration_headers,
        disp_headers = parsed.stats.displacement_headers,
        channels = parsed.channels.len(),
        frequencies = parsed.axis.len(),
        nodes = parsed.nodes.len(),
        "parsed response blocks"
    );

    let assembler = TableAssembler::new(parsed, config.axis_policy);
    let acceleration = assembler.assemble(ResponseKind::Acceleration)?;
    let displacement = assembler.assemble(ResponseKind::Displacement)?;

    let mut warnings = parsed.warnings.clone();
    warnings.extend(acceleration.warnings);
    warnings.extend(displacement.warnings);
    log_warnings(&warnings);

    let summary = ExtractionSummary {
        source: source_label.to_string(),
        node_count: parsed.nodes.len(),
        acceleration_headers: parsed.stats.acceleration_headers,
        displacement_headers: parsed.stats.displacement_headers,
        malformed_headers: parsed.stats.malformed_headers,
        skipped_rows: parsed.stats.skipped_rows,
        channel_count: parsed.channels.len(),
        frequency_count: parsed.axis.len(),
        warnings: warnings.iter().map(PsdWarning::diagnostic_line).collect(),
    };

    Ok(ExtractionOutcome {
        acceleration: acceleration.table,
        displacement: displacement.table,
        summary,
        warnings,
    })
}

/// Response plots written next to the tables. Nothing is plotted by default.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    /// Node for the stacked acceleration/displacement comparison.
    pub node: Option<NodeId>,
    /// One plot per response kind with every node overlaid.
    pub all_nodes: bool,
    pub dof: Dof,
}

impl Default for PlotRequest {
    fn default() -> Self {
        Self {
            node: None,
            all_nodes: false,
            dof: Dof::T1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub config: ExtractionConfig,
    pub plots: PlotRequest,
}

impl ExtractionRequest {
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            config: ExtractionConfig::default(),
            plots: PlotRequest::default(),
        }
    }

    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_plots(mut self, plots: PlotRequest) -> Self {
        self.plots = plots;
        self
    }

    pub fn output_file(&self, kind: ResponseKind) -> &str {
        match kind {
            ResponseKind::Acceleration => &self.config.acceleration_file,
            ResponseKind::Displacement => &self.config.displacement_file,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub outcome: ExtractionOutcome,
    pub artifacts: Vec<OutputArtifact>,
}

pub(crate) fn read_input_source(path: &Path) -> PsdResult<String> {
    fs::read_to_string(path).map_err(|source| {
        PsdError::io_system(
            "IO.INPUT_READ",
            format!("failed to read input '{}': {}", path.display(), source),
        )
    })
}

pub(crate) fn ensure_output_dir(path: &Path) -> PsdResult<()> {
    fs::create_dir_all(path).map_err(|source| {
        PsdError::io_system(
            "IO.OUTPUT_DIRECTORY",
            format!(
                "failed to create output directory '{}': {}",
                path.display(),
                source
            ),
        )
    })
}

pub struct ExtractionModule;

impl ExtractionModule {
    pub fn run(&self, request: &ExtractionRequest) -> PsdResult<ExtractionReport> {
        let source = read_input_source(&request.input_path)?;
        let label = request.input_path.display().to_string();
        let parsed = parse_response_blocks(&source).ensure_populated(&label)?;
        let outcome = assemble_outcome(&parsed, &label, &request.config)?;

        ensure_output_dir(&request.output_dir)?;
        let mut artifacts = Vec::new();
        for kind in ResponseKind::ALL {
            let artifact = OutputArtifact::new(request.output_file(kind));
            let path = request.output_dir.join(&artifact.relative_path);
            write_table_csv(&path, outcome.table(kind), request.config.significant_digits)?;
            info!(path = %path.display(), kind = %kind, "wrote feature table");
            artifacts.push(artifact);
        }
        artifacts.extend(write_plots(&parsed, request)?);

        Ok(ExtractionReport { outcome, artifacts })
    }
}

fn write_plots(
    parsed: &ParsedResponses,
    request: &ExtractionRequest,
) -> PsdResult<Vec<OutputArtifact>> {
    let PlotRequest {
        node,
        all_nodes,
        dof,
    } = &request.plots;
    let format = request.config.plot_format;
    let mut artifacts = Vec::new();

    if let Some(node) = node {
        let artifact = OutputArtifact::new(node_plot_file(node, *dof, format));
        let path = request.output_dir.join(&artifact.relative_path);
        plot_node_response(parsed, node, *dof, &path, format)?;
        artifacts.push(artifact);
    }
    if *all_nodes {
        for kind in ResponseKind::ALL {
            let artifact = OutputArtifact::new(all_nodes_plot_file(kind, *dof, format));
            let path = request.output_dir.join(&artifact.relative_path);
            plot_all_nodes(parsed, kind, *dof, &path, format)?;
            artifacts.push(artifact);
        }
    }
    Ok(artifacts)
}

impl ModuleExecutor for ExtractionModule {
    type Request = ExtractionRequest;

    fn execute(&self, request: &ExtractionRequest) -> PsdResult<Vec<OutputArtifact>> {
        self.run(request).map(|report| report.artifacts)
    }
}
