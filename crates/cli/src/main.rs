use std::process::ExitCode;

use clap::Parser;
use ilc::commands::instrument_command;
use ilc_core::parse::ParseError;

/// Comment-marker driven coverage instrumenter for C sources.
///
/// This CLI is a thin wrapper around `ilc-core` (exposed in code as
/// `ilc_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "ilc",
    version,
    about = "Instrument C sources with coverage check calls",
    long_about = "Scans a C source file for ILC: markers inside function-body comments, \
writes a copy with a run-time check call spliced in at every marker, and records each \
checkpoint in a coverage data file that is merged, never truncated, across runs."
)]
struct Cli {
    /// C source file to instrument.
    file: String,

    /// Coverage data file (defaults to ilc.dat in the working directory).
    #[arg(short = 'f', long = "data-file")]
    data_file: Option<String>,

    /// Instrumented output file (defaults to the input name with `_ilc`
    /// inserted before the extension).
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Emit the run summary as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

/// Exit status for a syntax error in the input file.
const EXIT_SYNTAX: u8 = 1;
/// Exit status for resource exhaustion while recording checkpoints.
const EXIT_RESOURCE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match instrument_command(&cli.file, cli.data_file.as_deref(), cli.output.as_deref(), cli.json)
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            match err.downcast_ref::<ParseError>() {
                Some(ParseError::Syntax { .. }) => ExitCode::from(EXIT_SYNTAX),
                Some(ParseError::Registry(_)) => ExitCode::from(EXIT_RESOURCE),
                None => ExitCode::FAILURE,
            }
        }
    }
}
