mod commands;
mod helpers;

use crate::logging::setup_logging;
use clap::{ArgAction, Parser};
use nnpot_core::domain::NnpError;
use std::path::PathBuf;

const PROGRAM_NAME: &str = "nnpot";

pub fn run_from_env() -> i32 {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let result = parse(args).and_then(|parsed| match parsed {
        Some(cli) => {
            setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;
            dispatch_parsed(cli.command)
        }
        None => Ok(0),
    });

    match result {
        Ok(code) => code,
        Err(error) => {
            let compatibility_error = error.as_nnp_error();
            eprintln!("{}", compatibility_error.diagnostic_line());
            compatibility_error.exit_code()
        }
    }
}

/// Runs one invocation without installing a log subscriber.
#[cfg(test)]
pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    match parse(args.into_iter().map(Into::into).collect())? {
        Some(cli) => dispatch_parsed(cli.command),
        None => Ok(0),
    }
}

/// `Ok(None)` when clap already printed help or version text.
fn parse(args: Vec<String>) -> Result<Option<Cli>, CliError> {
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(args)
        .collect::<Vec<_>>();

    match Cli::try_parse_from(&full_args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(None)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "nnpot",
    version,
    about = "Fit and evaluate n2p2 neural network potentials"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Convert a JSON dataset into an n2p2 `input.data` file
    WriteData(commands::WriteDataArgs),
    /// Render an `input.nn` file from default and user settings
    WriteInput(commands::WriteInputArgs),
    /// Read an n2p2 `input.data`/`output.data` file
    ReadData(commands::ReadDataArgs),
    /// Fit a potential with nnp-scaling and nnp-train
    Train(commands::TrainArgs),
    /// Compare nnp-predict results against a reference dataset
    Evaluate(commands::EvaluateArgs),
    /// Energy, forces and stress of one structure through LAMMPS
    Predict(commands::PredictArgs),
    /// Summarize a saved parameter bundle
    Inspect(commands::InspectArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::WriteData(args) => commands::run_write_data_command(args),
        CliCommand::WriteInput(args) => commands::run_write_input_command(args),
        CliCommand::ReadData(args) => commands::run_read_data_command(args),
        CliCommand::Train(args) => commands::run_train_command(args),
        CliCommand::Evaluate(args) => commands::run_evaluate_command(args),
        CliCommand::Predict(args) => commands::run_predict_command(args),
        CliCommand::Inspect(args) => commands::run_inspect_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(NnpError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_nnp_error(&self) -> NnpError {
        match self {
            Self::Usage(message) => NnpError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => NnpError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
