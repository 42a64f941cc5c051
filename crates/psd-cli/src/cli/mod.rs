mod commands;
mod helpers;

use clap::Parser;
use psd_core::domain::PsdError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let compute_error = error.as_psd_error();
            eprintln!("{}", compute_error.diagnostic_line());
            eprintln!("{}", compute_error.fatal_exit_line());
            compute_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("psd-extract".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_logging(cli.verbose, cli.quiet);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "psd-extract",
    version,
    about = "PSD response feature extraction and baseline deltas"
)]
struct Cli {
    /// Log debug detail (recovered rows, ignored channels)
    #[arg(long, short, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Extract acceleration and displacement feature tables from a response file
    Extract(commands::ExtractArgs),
    /// Write `baseline - current` for one pair of feature tables
    Delta(commands::DeltaArgs),
    /// Check that every column of a delta table is zero within tolerance
    VerifyZero(commands::VerifyZeroArgs),
    /// Print rotational stiffnesses and levels from PBUSH cards
    Stiffness(commands::StiffnessArgs),
    /// Extract both tables and diff them against baseline tables when present
    Run(commands::RunArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Extract(args) => commands::run_extract_command(args),
        CliCommand::Delta(args) => commands::run_delta_command(args),
        CliCommand::VerifyZero(args) => commands::run_verify_zero_command(args),
        CliCommand::Stiffness(args) => commands::run_stiffness_command(args),
        CliCommand::Run(args) => commands::run_pipeline_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(PsdError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<PsdError> for CliError {
    fn from(error: PsdError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_psd_error(&self) -> PsdError {
        match self {
            Self::Usage(message) => PsdError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => PsdError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
