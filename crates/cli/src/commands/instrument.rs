use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ilc_core::ledger::Ledger;
use ilc_core::model::FunctionRecord;
use ilc_core::parse::Parser;

use crate::derive_output_path;

/// What one instrumentation run did, for the `--json` summary.
#[derive(Debug, serde::Serialize)]
struct RunSummary<'a> {
    file: &'a str,
    output: String,
    functions: &'a [FunctionRecord],
    checkpoints: usize,
    data_file: String,
    entries: usize,
    added: usize,
}

/// Instrument one C source file and fold its checkpoints into the coverage
/// ledger.
///
/// The sequence: read the input, load the ledger (explicit path or the
/// default), parse and instrument, write the instrumented copy (only reached
/// on a successful parse), merge the discoveries, print the summary, persist
/// the ledger. A ledger that cannot be persisted is reported as a warning and
/// does not fail the run.
pub fn instrument_command(
    file: &str,
    data_file: Option<&str>,
    output: Option<&str>,
    json: bool,
) -> Result<()> {
    let input_path = Path::new(file);
    let source = fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read input file {}", input_path.display()))?;

    let ledger_path = data_file.map(PathBuf::from);
    let mut ledger =
        Ledger::open(ledger_path.as_deref()).context("Failed to load coverage data")?;

    // Checkpoint keys carry the file name exactly as given on the command
    // line, so repeat runs from the same directory dedup against each other.
    let instrumented = Parser::new(&source, file).run()?;

    let output_path = match output {
        Some(path) => PathBuf::from(path),
        None => derive_output_path(input_path),
    };
    fs::write(&output_path, &instrumented.text).with_context(|| {
        format!("Failed to write instrumented output to {}", output_path.display())
    })?;

    let added = ledger
        .merge(&instrumented.registry, file)
        .context("Failed to merge checkpoints into coverage data")?;

    let registry = &instrumented.registry;
    if json {
        let summary = RunSummary {
            file,
            output: output_path.display().to_string(),
            functions: registry.functions(),
            checkpoints: registry.total_markers(),
            data_file: ledger.path().display().to_string(),
            entries: ledger.len(),
            added,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Instrumented {} -> {}", file, output_path.display());
        println!("  Functions with checkpoints: {}", registry.functions().len());
        println!("  Checkpoints found: {}", registry.total_markers());
        println!(
            "  Coverage data: {} ({} entries, {} new)",
            ledger.path().display(),
            ledger.len(),
            added
        );
    }

    if let Err(err) = ledger.persist() {
        eprintln!("warning: {err}; coverage data for this run was not saved");
    }

    Ok(())
}
