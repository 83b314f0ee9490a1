use crate::error::Error;
use crate::model::mol::Mol;
use crate::stream::Compute;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydroMode {
    /// Convert implicit hydrogens into explicit atoms.
    Add,
    /// Fold plain terminal hydrogens back into their parents.
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HydroConfig {
    pub mode: HydroMode,
    /// Place added hydrogens next to their parent when the molecule has coordinates.
    pub add_coords: bool,
}

impl Default for HydroConfig {
    fn default() -> Self {
        Self {
            mode: HydroMode::Add,
            add_coords: true,
        }
    }
}

impl HydroConfig {
    pub fn add() -> Self {
        Self::default()
    }

    pub fn remove() -> Self {
        Self {
            mode: HydroMode::Remove,
            ..Self::default()
        }
    }
}

pub fn apply_hydrogens(mol: &mut Mol, config: &HydroConfig) {
    match config.mode {
        HydroMode::Add => mol.add_hydrogens(config.add_coords),
        HydroMode::Remove => mol.remove_hydrogens(),
    }
}

/// Pipeline stage applying [`apply_hydrogens`] to every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hydrogens {
    pub config: HydroConfig,
}

impl Hydrogens {
    pub fn new(config: HydroConfig) -> Self {
        Self { config }
    }
}

impl Compute<Mol> for Hydrogens {
    type Output = Mol;

    fn compute(&mut self, mut mol: Mol) -> Result<Option<Mol>, Error> {
        apply_hydrogens(&mut mol, &self.config);
        Ok(Some(mol))
    }
}
