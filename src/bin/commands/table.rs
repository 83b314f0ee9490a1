use std::io::{self as stdio, BufWriter, Write};

use anyhow::{Context, Result};
use clap::Args;

use mol_forge::ChemContext;
use mol_forge::table::{
    FingerprintColumns, MissingColumns, Table, TableReadOptions, TableWriteOptions,
    TypePolicy, flat_file_to_table, write_table,
};

use crate::commands::{
    IoParameters, ensure_piped_stdin, open_input, open_output, run_with_spinner,
};

/// Fingerprint options shared by both table directions.
#[derive(Debug, Default, Args)]
pub struct FingerprintArgs {
    /// SD property holding a base64 fingerprint.
    #[arg(long = "fp-field", value_name = "TAG")]
    pub field: Option<String>,
    /// Prefix of the per-bit fingerprint columns.
    #[arg(long = "fp-prefix", value_name = "PREFIX", default_value = "fp_")]
    pub prefix: String,
}

impl FingerprintArgs {
    fn columns(&self) -> Option<FingerprintColumns> {
        self.field
            .as_ref()
            .map(|field| FingerprintColumns::new(field.as_str(), self.prefix.as_str()))
    }
}

/// Collects SD or SMILES records into a CSV table.
#[derive(Debug, Default, Args)]
pub struct ToTableArgs {
    /// Name of the SMILES column.
    #[arg(long, value_name = "NAME", default_value = "smiles")]
    pub smiles_column: String,
    /// Position of the SMILES column.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub smiles_index: usize,
    /// Name of the identifier column.
    #[arg(long, value_name = "NAME")]
    pub id_column: Option<String>,
    /// Position of the identifier column.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub id_index: usize,
    /// Property supplying the identifier instead of the record title.
    #[arg(long, value_name = "TAG")]
    pub id_field: Option<String>,
    /// Leave missing cells instead of failing when a record lacks a column.
    #[arg(long)]
    pub allow_missing: bool,
    #[command(flatten)]
    pub fingerprint: FingerprintArgs,
}

/// Writes one SD record per CSV row.
#[derive(Debug, Default, Args)]
pub struct FromTableArgs {
    /// Name of the SMILES column.
    #[arg(long, value_name = "NAME", default_value = "smiles")]
    pub smiles_column: String,
    /// Column supplying record titles.
    #[arg(long, value_name = "NAME")]
    pub id_column: Option<String>,
    #[command(flatten)]
    pub fingerprint: FingerprintArgs,
}

pub fn to_table(params: &IoParameters, ctx: &ChemContext, args: &ToTableArgs) -> Result<()> {
    let mut options = TableReadOptions::new(args.smiles_column.as_str(), args.smiles_index);
    if let Some(id_column) = &args.id_column {
        options = options.with_id_column(id_column.as_str(), args.id_index);
    }
    if let Some(id_field) = &args.id_field {
        options = options.with_id_field(id_field.as_str());
    }
    if let Some(fp) = args.fingerprint.columns() {
        options = options.with_fingerprint(fp);
    }
    if args.allow_missing {
        options = options.with_missing(MissingColumns::Allow);
    }

    let table = run_with_spinner("Building table", |_| {
        let input = open_input(params, ctx)?;
        Ok(flat_file_to_table(input, &options)?)
    })?;

    match &params.output {
        Some(path) => table
            .write_csv(path)
            .with_context(|| format!("Failed to write table to {}", path.display()))?,
        None => {
            let mut writer = BufWriter::new(stdio::stdout().lock());
            table
                .to_csv_writer(&mut writer)
                .context("Failed to write table to stdout")?;
            writer.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

pub fn from_table(
    params: &IoParameters,
    ctx: &ChemContext,
    args: &FromTableArgs,
) -> Result<usize> {
    let table = match &params.input {
        Some(path) => Table::read_csv(path, &TypePolicy::default())
            .with_context(|| format!("Failed to read table from {}", path.display()))?,
        None => {
            ensure_piped_stdin()?;
            Table::from_csv_reader(stdio::stdin().lock(), &TypePolicy::default())
                .context("Failed to read table from stdin")?
        }
    };

    let mut options = TableWriteOptions::new(args.smiles_column.as_str());
    if let Some(id_column) = &args.id_column {
        options = options.with_id_column(id_column.as_str());
    }
    if let Some(fp) = args.fingerprint.columns() {
        options = options.with_fingerprint(fp);
    }

    run_with_spinner("Writing records", |spinner| {
        let mut output = open_output(params)?;
        let written = write_table(&table, &options, ctx, &mut output)?;
        spinner.set_position(written as u64);
        output.close().context("Failed to close output")?;
        Ok(written)
    })
}
