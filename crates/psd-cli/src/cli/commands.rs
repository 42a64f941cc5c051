use super::CliError;
use super::helpers::*;
use anyhow::Context;
use psd_core::common::config::DEFAULT_DELTA_DEADBAND;
use psd_core::common::PlotFormat;
use psd_core::domain::{Dof, NodeId, PsdError};
use psd_core::modules::delta::DEFAULT_ZERO_TOLERANCE;
use psd_core::modules::{
    DeltaModule, DeltaRequest, ExtractionModule, ExtractionRequest, PipelineRequest, PlotRequest,
    load_table_csv, parse_bush_source, run_pipeline, verify_zero,
};
use psd_core::numerics::format_solver_literal;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub(super) struct ExtractArgs {
    /// Solver response file with `$ACCE` / `$DISP` channel blocks
    #[arg(long)]
    input: PathBuf,

    /// Directory for the feature tables (default: the input's directory)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Acceleration table file name
    #[arg(long)]
    acce_file: Option<String>,

    /// Displacement table file name
    #[arg(long)]
    disp_file: Option<String>,

    /// JSON extraction config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the extraction summary as JSON
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Plot this node's acceleration and displacement against frequency
    #[arg(long, value_name = "NODE")]
    plot_node: Option<String>,

    /// Plot every node, one image per response kind
    #[arg(long)]
    plot_all: bool,

    /// Degree of freedom to plot
    #[arg(long, default_value = "T1", value_parser = parse_dof)]
    plot_dof: Dof,

    /// Plot image format (png or jpg)
    #[arg(long, value_parser = parse_plot_format)]
    plot_format: Option<PlotFormat>,
}

#[derive(clap::Args)]
pub(super) struct DeltaArgs {
    /// Table from the current run
    #[arg(long)]
    current: PathBuf,

    /// Table from the baseline run
    #[arg(long)]
    baseline: PathBuf,

    /// Delta table path
    #[arg(long)]
    output: PathBuf,

    /// Differences below this magnitude are written as zero
    #[arg(long, default_value_t = DEFAULT_DELTA_DEADBAND)]
    deadband: f64,
}

#[derive(clap::Args)]
pub(super) struct VerifyZeroArgs {
    /// Delta table to check
    #[arg(value_name = "CSV")]
    table: PathBuf,

    /// Largest accepted absolute value
    #[arg(long, default_value_t = DEFAULT_ZERO_TOLERANCE)]
    tolerance: f64,
}

#[derive(clap::Args)]
pub(super) struct StiffnessArgs {
    /// Bulk data file with PBUSH cards
    #[arg(long)]
    bush: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct RunArgs {
    /// Solver response file with `$ACCE` / `$DISP` channel blocks
    #[arg(long)]
    input: PathBuf,

    /// Directory for feature and delta tables (default: the input's directory)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Baseline acceleration table
    #[arg(long)]
    baseline_acce: Option<PathBuf>,

    /// Baseline displacement table
    #[arg(long)]
    baseline_disp: Option<PathBuf>,

    /// JSON extraction config
    #[arg(long)]
    config: Option<PathBuf>,
}

pub(super) fn run_extract_command(args: ExtractArgs) -> Result<i32, CliError> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(name) = args.acce_file {
        config.acceleration_file = name;
    }
    if let Some(name) = args.disp_file {
        config.displacement_file = name;
    }
    if let Some(format) = args.plot_format {
        config.plot_format = format;
    }
    let config = validated(config)?;

    let output_dir = args
        .output_dir
        .unwrap_or_else(|| default_output_dir(&args.input));
    let plots = PlotRequest {
        node: args.plot_node.as_deref().map(NodeId::parse),
        all_nodes: args.plot_all,
        dof: args.plot_dof,
    };
    let request = ExtractionRequest::new(&args.input, &output_dir)
        .with_config(config)
        .with_plots(plots);
    let report = ExtractionModule.run(&request)?;
    print_artifacts(&output_dir, &report.artifacts);

    if let Some(path) = args.summary {
        write_json_report(&path, &report.outcome.summary)?;
        info!(path = %path.display(), "wrote extraction summary");
    }
    Ok(0)
}

pub(super) fn run_delta_command(args: DeltaArgs) -> Result<i32, CliError> {
    let mut request = DeltaRequest::new(&args.current, &args.baseline, &args.output);
    request.deadband = check_non_negative("deadband", args.deadband)?;

    let outcome = DeltaModule.run(&request)?;
    println!("{}", args.output.display());
    if !outcome.warnings.is_empty() {
        info!(count = outcome.warnings.len(), "delta completed with warnings");
    }
    Ok(0)
}

pub(super) fn run_verify_zero_command(args: VerifyZeroArgs) -> Result<i32, CliError> {
    let tolerance = check_non_negative("tolerance", args.tolerance)?;
    let table = load_table_csv(&args.table).map_err(PsdError::from)?;
    let report = verify_zero(&table, tolerance);

    for column in &report.columns {
        let status = if column.passed { "ok" } else { "FAIL" };
        println!("{}: max |delta| = {:e} {}", column.column, column.max_abs, status);
    }

    if report.passed() {
        println!(
            "zero check passed for {} column(s) within {:e}",
            report.columns.len(),
            tolerance
        );
        Ok(0)
    } else {
        println!(
            "zero check failed for {} of {} column(s) within {:e}",
            report.failures().count(),
            report.columns.len(),
            tolerance
        );
        Ok(1)
    }
}

pub(super) fn run_stiffness_command(args: StiffnessArgs) -> Result<i32, CliError> {
    let source = fs::read_to_string(&args.bush)
        .with_context(|| format!("failed to read PBUSH file '{}'", args.bush.display()))?;
    let deck = parse_bush_source(&source);
    log_warnings(&deck.warnings);

    if deck.cards.is_empty() {
        return Err(CliError::Compute(PsdError::input_validation(
            "INPUT.STIFFNESS_EMPTY",
            format!("no PBUSH cards found in '{}'", args.bush.display()),
        )));
    }

    for card in deck.cards.values() {
        let stiffnesses = card
            .rotational
            .iter()
            .map(|value| format_solver_literal(*value))
            .collect::<Vec<_>>();
        let levels = card
            .rotational_levels()
            .iter()
            .map(|level| level.map_or_else(|| "-".to_string(), |level| level.to_string()))
            .collect::<Vec<_>>();
        println!(
            "{}: rotational {} levels {}",
            card.id,
            stiffnesses.join(" "),
            levels.join(" ")
        );
    }
    Ok(0)
}

pub(super) fn run_pipeline_command(args: RunArgs) -> Result<i32, CliError> {
    let config = validated(load_config(args.config.as_deref())?)?;
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| default_output_dir(&args.input));

    let request = PipelineRequest::new(&args.input, &output_dir)
        .with_config(config)
        .with_baselines(args.baseline_acce, args.baseline_disp);
    let report = run_pipeline(&request)?;
    print_artifacts(&output_dir, &report.artifacts);
    Ok(0)
}
