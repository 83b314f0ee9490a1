use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;
use prettytable::{Table, format, row};

use mol_forge::stream::PullStream;
use mol_forge::{ChemContext, Mol};

use crate::commands::{IoParameters, open_input, run_with_spinner};

/// Report-only command that inspects every record and mirrors the input stream.
#[derive(Debug, Default, Args)]
pub struct InfoArgs {
    /// Show at most this many records in the per-record table.
    #[arg(long, value_name = "N", default_value_t = 25)]
    pub limit: usize,
}

/// Reads all records, prints per-record and summary tables, and returns the records.
pub fn run(params: &IoParameters, ctx: &ChemContext, args: &InfoArgs) -> Result<Vec<Mol>> {
    let mols = run_with_spinner("Reading records", |spinner| {
        let mut input = open_input(params, ctx)?;
        let mut mols = Vec::new();
        while input.has_next()? {
            mols.push(input.advance()?);
            spinner.inc(1);
        }
        input.close()?;
        Ok(mols)
    })?;

    let reports: Vec<RecordReport> = mols.iter().map(RecordReport::from_mol).collect();
    print_tables(&reports, args.limit, ctx)?;
    Ok(mols)
}

#[derive(Debug)]
struct RecordReport {
    title: String,
    atoms: usize,
    bonds: usize,
    charge: i32,
    properties: usize,
    smiles: String,
}

impl RecordReport {
    fn from_mol(mol: &Mol) -> Self {
        Self {
            title: mol.title().to_string(),
            atoms: mol.num_atoms(),
            bonds: mol.num_bonds(),
            charge: mol.formal_charge(),
            properties: mol.keys().len(),
            smiles: mol.canonical_smiles(),
        }
    }
}

fn print_tables(reports: &[RecordReport], limit: usize, ctx: &ChemContext) -> Result<()> {
    let mut stderr = io::stderr().lock();

    print_boxed_label(&mut stderr, "MolForge Record Report")?;
    writeln!(&mut stderr)?;

    let mut record_table = Table::new();
    print_boxed_label(&mut stderr, "Records")?;
    record_table.set_format(*format::consts::FORMAT_BOX_CHARS);
    record_table.set_titles(row!["#", "Title", "Atoms", "Bonds", "Charge", "Properties", "SMILES"]);
    for (idx, report) in reports.iter().take(limit).enumerate() {
        record_table.add_row(row![
            idx + 1,
            report.title,
            report.atoms,
            report.bonds,
            report.charge,
            report.properties,
            report.smiles
        ]);
    }
    record_table
        .print(&mut stderr)
        .context("Failed to render record table")?;
    if reports.len() > limit {
        writeln!(&mut stderr, "... {} more records", reports.len() - limit)?;
    }
    writeln!(&mut stderr)?;

    let mut summary_table = Table::new();
    print_boxed_label(&mut stderr, "Summary")?;
    summary_table.set_format(*format::consts::FORMAT_BOX_CHARS);
    summary_table.set_titles(row!["Metric", "Value"]);
    summary_table.add_row(row!["Toolkit", ctx.toolkit()]);
    summary_table.add_row(row!["Records", reports.len()]);
    summary_table.add_row(row![
        "Total Atoms",
        reports.iter().map(|r| r.atoms).sum::<usize>()
    ]);
    summary_table.add_row(row![
        "Charged Records",
        reports.iter().filter(|r| r.charge != 0).count()
    ]);
    summary_table
        .print(&mut stderr)
        .context("Failed to render summary")?;

    Ok(())
}

fn print_boxed_label<W: Write>(writer: &mut W, title: &str) -> io::Result<()> {
    let inner = format!(" {title} ");
    let width = inner.chars().count();
    writeln!(writer, "╭{}╮", "─".repeat(width))?;
    writeln!(writer, "│{}│", inner)?;
    writeln!(writer, "╰{}╯", "─".repeat(width))?;
    Ok(())
}
