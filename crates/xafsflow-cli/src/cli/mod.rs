mod commands;
mod helpers;

use clap::Parser;
use xafsflow_core::domain::XafsError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let domain_error = error.as_xafs_error();
            eprintln!("{}", domain_error.diagnostic_line());
            if let Some(summary_line) = domain_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            domain_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("xafsflow".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
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
    name = "xafsflow",
    version,
    about = "Align XAFS spectra and decompose unknowns into reference standards"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Print the energy range shared by every spectrum and the grid inside it
    Bound(commands::BoundArgs),
    /// Interpolate spectra onto a grid, grouped by sample label
    Interpolate(commands::InterpolateArgs),
    /// Run a decomposition workflow described by a JSON config
    Decompose(commands::DecomposeArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Bound(args) => commands::run_bound_command(args),
        CliCommand::Interpolate(args) => commands::run_interpolate_command(args),
        CliCommand::Decompose(args) => commands::run_decompose_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(XafsError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<XafsError> for CliError {
    fn from(error: XafsError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_xafs_error(&self) -> XafsError {
        match self {
            Self::Usage(message) => XafsError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => XafsError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
