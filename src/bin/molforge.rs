use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod commands;

use commands::{IoParameters, RecordFormat};
use commands::{convert, info, smiles, table};

use mol_forge::{ChemContext, Toolkit};

#[derive(Parser, Debug)]
#[command(
    name = "molforge",
    about = "A command-line tool for streaming, converting, and tabulating small-molecule SD and SMILES files.",
    version,
    author,
    arg_required_else_help = true
)]
struct Cli {
    /// Input file path. When omitted, stdin is used.
    #[arg(short, long, value_name = "FILE", global = true)]
    input: Option<PathBuf>,
    /// Output file path. When omitted, stdout is used.
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,
    /// Force the input format (sdf or smiles).
    #[arg(long = "format", value_enum, global = true)]
    input_format: Option<RecordFormat>,
    /// Force the output format (sdf or smiles).
    #[arg(long = "out-format", value_enum, global = true)]
    output_format: Option<RecordFormat>,
    /// Chemistry toolkit (graph or table). Defaults to $MOLFORGE_TOOLKIT, then the best available.
    #[arg(long, value_name = "NAME", global = true)]
    toolkit: Option<Toolkit>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect records without modifying the data stream.
    Info(info::InfoArgs),
    /// Stream records to another format, optionally transforming them.
    Convert(convert::ConvertArgs),
    /// Collect records into a CSV table.
    ToTable(table::ToTableArgs),
    /// Write CSV table rows as molecule records.
    FromTable(table::FromTableArgs),
    /// Parse one SMILES string and print its canonical forms.
    Smiles(smiles::SmilesArgs),
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let io_params = IoParameters {
        input: cli.input.clone(),
        output: cli.output.clone(),
        input_format: cli.input_format,
        output_format: cli.output_format,
    };
    let ctx = match cli.toolkit {
        Some(toolkit) => ChemContext::new(toolkit),
        None => ChemContext::from_env().context("Failed to select a chemistry toolkit")?,
    };
    log::debug!("Using the {} toolkit", ctx.toolkit());

    match cli.command {
        Command::Info(args) => {
            let mols = info::run(&io_params, &ctx, &args)?;
            if !commands::interactive_stdout_requested(&io_params) {
                commands::save_output(&mols, &io_params)?;
            }
        }
        Command::Convert(args) => {
            commands::ensure_noninteractive_stdout("convert", &io_params)?;
            let written = convert::run(&io_params, &ctx, &args)?;
            log::info!("Converted {} records", written);
        }
        Command::ToTable(args) => {
            table::to_table(&io_params, &ctx, &args)?;
        }
        Command::FromTable(args) => {
            commands::ensure_noninteractive_stdout("from-table", &io_params)?;
            let written = table::from_table(&io_params, &ctx, &args)?;
            log::info!("Wrote {} records", written);
        }
        Command::Smiles(args) => {
            smiles::run(&ctx, &args)?;
        }
    }

    Ok(())
}
