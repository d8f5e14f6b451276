mod commands;
mod helpers;

use clap::Parser;
use ecl_core::domain::EclError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_ecl_error();
            eprintln!("{}", error.diagnostic_line());
            if let Some(summary_line) = error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("ecl-rs".to_string())
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
    name = "ecl-rs",
    version,
    about = "Summary header index and schedule inspection for ECLIPSE-style decks"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// List general summary keys matching a pattern
    Keys(commands::KeysArgs),
    /// Print one summary column as JSON
    Lookup(commands::LookupArgs),
    /// Print the column mapping from one summary header to another
    Map(commands::MapArgs),
    /// Print the variable type of summary mnemonics
    Classify(commands::ClassifyArgs),
    /// Build the schedule of a deck and print a JSON report
    Schedule(commands::ScheduleArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Keys(args) => commands::run_keys_command(args),
        CliCommand::Lookup(args) => commands::run_lookup_command(args),
        CliCommand::Map(args) => commands::run_map_command(args),
        CliCommand::Classify(args) => commands::run_classify_command(args),
        CliCommand::Schedule(args) => commands::run_schedule_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(EclError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<EclError> for CliError {
    fn from(error: EclError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_ecl_error(&self) -> EclError {
        match self {
            Self::Usage(message) => EclError::invalid_input("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => EclError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
