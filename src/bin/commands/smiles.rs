use anyhow::{Context, Result};
use clap::Args;

use mol_forge::ChemContext;

/// Parses one SMILES string and prints its canonical forms.
#[derive(Debug, Args)]
pub struct SmilesArgs {
    /// SMILES string to parse.
    #[arg(value_name = "SMILES")]
    pub smiles: String,
    /// Make implicit hydrogens explicit before printing.
    #[arg(long)]
    pub add_hydrogens: bool,
}

pub fn run(ctx: &ChemContext, args: &SmilesArgs) -> Result<()> {
    let mut mol = ctx
        .mol_from_smiles(&args.smiles)
        .with_context(|| format!("Failed to parse SMILES '{}'", args.smiles))?;
    if args.add_hydrogens {
        mol.add_hydrogens(false);
    }

    println!("toolkit        {}", mol.toolkit());
    println!("atoms          {}", mol.num_atoms());
    println!("bonds          {}", mol.num_bonds());
    println!("charge         {}", mol.formal_charge());
    println!("isomeric       {}", mol.canonical_smiles());
    println!("non-isomeric   {}", mol.canonical_non_isomeric_smiles());
    Ok(())
}
