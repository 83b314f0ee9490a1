use std::fmt;
use std::io::{self as stdio, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;

use mol_forge::io::{
    Compression, MolFormat, MolInputStream, MolOutputStream, PathSpec, ReadOptions, WriteOptions,
};
use mol_forge::{ChemContext, Mol};

pub mod convert;
pub mod info;
pub mod smiles;
pub mod table;

/// Record formats accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordFormat {
    /// MDL SD file.
    #[value(name = "sdf")]
    Sdf,
    /// One SMILES string and title per line.
    #[value(name = "smiles")]
    Smiles,
}

impl From<RecordFormat> for MolFormat {
    fn from(format: RecordFormat) -> Self {
        match format {
            RecordFormat::Sdf => MolFormat::Sdf,
            RecordFormat::Smiles => MolFormat::Smiles,
        }
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MolFormat::from(*self).name())
    }
}

/// Aggregated IO parameters shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct IoParameters {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub input_format: Option<RecordFormat>,
    pub output_format: Option<RecordFormat>,
}

impl IoParameters {
    fn input_format(&self) -> MolFormat {
        self.input_format
            .map(MolFormat::from)
            .or_else(|| self.input.as_deref().and_then(format_from_path))
            .unwrap_or(MolFormat::Sdf)
    }

    fn output_format(&self) -> MolFormat {
        self.output_format
            .map(MolFormat::from)
            .or_else(|| self.output.as_deref().and_then(format_from_path))
            .unwrap_or(MolFormat::Sdf)
    }
}

fn format_from_path(path: &Path) -> Option<MolFormat> {
    PathSpec::inspect(path).format
}

/// Opens the configured input as a molecule stream.
pub fn open_input(params: &IoParameters, ctx: &ChemContext) -> Result<MolInputStream> {
    let options = ReadOptions {
        format: params.input_format.map(MolFormat::from),
        ..ReadOptions::default()
    };
    match &params.input {
        Some(path) => MolInputStream::open(path, ctx, options)
            .with_context(|| format!("Failed to open input file {}", path.display())),
        None => {
            ensure_piped_stdin()?;
            Ok(MolInputStream::from_reader(
                BufReader::new(stdio::stdin()),
                params.input_format(),
                ctx,
                options,
            ))
        }
    }
}

/// Creates the configured output as a molecule sink.
pub fn open_output(params: &IoParameters) -> Result<MolOutputStream> {
    match &params.output {
        Some(path) => {
            let options = WriteOptions {
                format: params.output_format.map(MolFormat::from),
                ..WriteOptions::default()
            };
            MolOutputStream::create(path, options)
                .with_context(|| format!("Failed to create output file {}", path.display()))
        }
        None => Ok(MolOutputStream::from_writer(
            stdio::stdout(),
            params.output_format(),
            Compression::None,
        )),
    }
}

/// Writes already collected records to the configured output.
pub fn save_output(mols: &[Mol], params: &IoParameters) -> Result<()> {
    let mut output = open_output(params)?;
    output
        .write_all(mols)
        .context("Failed to write output records")?;
    output.close().context("Failed to close output")?;
    Ok(())
}

pub fn ensure_piped_stdin() -> Result<()> {
    if stdio::stdin().is_terminal() {
        bail!(
            "No --input provided and stdin is a TTY. Provide -i/--input or pipe records into molforge."
        );
    }
    Ok(())
}

/// Wraps long-running operations with a spinner rendered to stderr.
pub fn run_with_spinner<T, F>(message: &str, work: F) -> Result<T>
where
    F: FnOnce(&ProgressBar) -> Result<T>,
{
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg} [{pos} records]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());

    let result = work(&spinner);

    match &result {
        Ok(_) => spinner.finish_with_message(format!("{} ✓", message)),
        Err(_) => spinner.abandon_with_message(format!("{} ✗", message)),
    }

    result
}

/// Returns true when stdout is a TTY and no explicit output file was supplied.
pub fn interactive_stdout_requested(params: &IoParameters) -> bool {
    params.output.is_none() && stdio::stdout().is_terminal()
}

/// Ensures commands do not dump record output directly into an interactive terminal.
pub fn ensure_noninteractive_stdout(command: &str, params: &IoParameters) -> Result<()> {
    if interactive_stdout_requested(params) {
        bail!(
            "Refusing to stream {command} results to an interactive terminal. Use -o/--output or pipe the command into a file."
        );
    }
    Ok(())
}
