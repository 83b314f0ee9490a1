use anyhow::{Context, Result};
use clap::Args;

use mol_forge::ops::{CountAtoms, FormatArrays, HydroConfig, Hydrogens, ParseArrays};
use mol_forge::stream::{PullStream, Transform};
use mol_forge::{ChemContext, Mol};

use crate::commands::{IoParameters, open_input, open_output, run_with_spinner};

/// Streams records from input to output through optional processing stages.
#[derive(Debug, Default, Args)]
pub struct ConvertArgs {
    /// Store each record's atom count under this property tag.
    #[arg(long, value_name = "TAG")]
    pub count_atoms: Option<String>,
    /// Make implicit hydrogens explicit.
    #[arg(long, conflicts_with = "remove_hydrogens")]
    pub add_hydrogens: bool,
    /// Fold explicit hydrogens back into their parent atoms.
    #[arg(long)]
    pub remove_hydrogens: bool,
    /// Properties holding comma-separated numbers to re-render.
    #[arg(long = "array-field", value_name = "TAG")]
    pub array_fields: Vec<String>,
    /// Decimal places kept when re-rendering array properties.
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub precision: usize,
}

/// Builds the stage chain and pumps every record into the output.
pub fn run(params: &IoParameters, ctx: &ChemContext, args: &ConvertArgs) -> Result<usize> {
    run_with_spinner("Converting records", |spinner| {
        let input = open_input(params, ctx)?;
        let mut stream: Box<dyn PullStream<Item = Mol>> = Box::new(input);

        if args.add_hydrogens {
            stream = Box::new(Transform::new(stream, Hydrogens::new(HydroConfig::add())));
        }
        if args.remove_hydrogens {
            stream = Box::new(Transform::new(
                stream,
                Hydrogens::new(HydroConfig::remove()),
            ));
        }
        if let Some(tag) = &args.count_atoms {
            stream = Box::new(Transform::new(stream, CountAtoms::new(tag.as_str())));
        }
        if !args.array_fields.is_empty() {
            stream = Box::new(Transform::new(
                stream,
                ParseArrays::new(args.array_fields.iter().cloned()),
            ));
            stream = Box::new(Transform::new(stream, FormatArrays::new(args.precision)));
        }

        let mut output = open_output(params)?;
        while stream.has_next().context("Failed to read input record")? {
            let mol = stream.advance()?;
            output.write(&mol).context("Failed to write output record")?;
            spinner.inc(1);
        }
        stream.close()?;
        output.close().context("Failed to close output")?;
        Ok(output.records_written())
    })
}
