//! Native molecule engines.
//!
//! Each toolkit owns its own molecule representation and implements [`NativeMolecule`],
//! the capability contract the [`Mol`](crate::Mol) facade is written against. The closed
//! [`NativeMol`] enum is the only place that knows which engines exist.

#[cfg(feature = "graph")]
mod graph;
mod table;

#[cfg(feature = "graph")]
pub use graph::GraphMol;
pub use table::TableMol;

use crate::error::Error;
use crate::model::skeleton::Skeleton;
use crate::model::tags::TagStore;
use crate::model::types::{Element, Point};
use crate::toolkit::Toolkit;
use nalgebra::Vector3;

/// Snapshot of the per-atom values the facade exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomRecord {
    pub element: Element,
    pub formal_charge: i8,
    pub total_hydrogens: u8,
}

/// Capabilities every native engine provides.
///
/// Atom indices are engine-defined: the graph engine renumbers atoms contiguously after a
/// deletion, the table engine keeps stable slot ids. `atom_indices` always lists the live
/// atoms in atom-list order.
pub trait NativeMolecule {
    fn toolkit(&self) -> Toolkit;

    fn from_skeleton(skeleton: Skeleton) -> Self
    where
        Self: Sized;

    fn to_skeleton(&self) -> Skeleton;

    fn num_atoms(&self) -> usize;

    fn num_bonds(&self) -> usize;

    fn atom_indices(&self) -> Vec<usize>;

    fn atom(&self, idx: usize) -> Option<AtomRecord>;

    fn set_atomic_num(&mut self, idx: usize, atomic_num: u8) -> Result<(), Error>;

    fn delete_atom(&mut self, idx: usize) -> Result<(), Error>;

    fn add_hydrogens(&mut self, add_coords: bool);

    fn remove_hydrogens(&mut self);

    fn coordinates(&self) -> Option<Vec<Point>>;

    fn set_coordinates(&mut self, coordinates: &[Point]) -> Result<(), Error>;

    fn canonical_smiles(&self, isomeric: bool) -> String;

    fn title(&self) -> &str;

    fn set_title(&mut self, title: &str);

    fn tags(&self) -> &TagStore;

    fn tags_mut(&mut self) -> &mut TagStore;

    fn make_read_write(&mut self) {}

    fn make_read_only(&mut self) {}

    fn is_read_only(&self) -> bool {
        false
    }
}

/// Closed set of native molecule representations.
#[derive(Debug, Clone)]
pub enum NativeMol {
    #[cfg(feature = "graph")]
    Graph(GraphMol),
    Table(TableMol),
}

impl NativeMol {
    /// Builds the native representation of `toolkit` from a parsed connection table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolkitUnavailable`] when the toolkit was compiled out.
    pub fn from_skeleton(toolkit: Toolkit, skeleton: Skeleton) -> Result<Self, Error> {
        match toolkit {
            #[cfg(feature = "graph")]
            Toolkit::Graph => Ok(NativeMol::Graph(GraphMol::from_skeleton(skeleton))),
            #[cfg(not(feature = "graph"))]
            Toolkit::Graph => Err(Error::ToolkitUnavailable { toolkit }),
            Toolkit::Table => Ok(NativeMol::Table(TableMol::from_skeleton(skeleton))),
        }
    }

    /// Builds a native molecule from a parsed SMILES string, applying the toolkit's own
    /// SMILES conventions (the graph engine folds explicit hydrogens into their parents).
    pub fn from_smiles_skeleton(toolkit: Toolkit, skeleton: Skeleton) -> Result<Self, Error> {
        let mut native = Self::from_skeleton(toolkit, skeleton)?;
        if native.toolkit() == Toolkit::Graph {
            native.as_dyn_mut().remove_hydrogens();
        }
        Ok(native)
    }

    pub fn toolkit(&self) -> Toolkit {
        self.as_dyn().toolkit()
    }

    pub fn as_dyn(&self) -> &dyn NativeMolecule {
        match self {
            #[cfg(feature = "graph")]
            NativeMol::Graph(mol) => mol,
            NativeMol::Table(mol) => mol,
        }
    }

    pub fn as_dyn_mut(&mut self) -> &mut dyn NativeMolecule {
        match self {
            #[cfg(feature = "graph")]
            NativeMol::Graph(mol) => mol,
            NativeMol::Table(mol) => mol,
        }
    }
}

const C_H_BOND_LENGTH: f64 = 1.09;

/// Position for the `slot`-th hydrogen added to an atom at `parent`.
pub(crate) fn hydrogen_position(parent: &Point, slot: usize) -> Point {
    const DIRECTIONS: [[f64; 3]; 4] = [
        [1.0, 1.0, 1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, 1.0, -1.0],
        [1.0, -1.0, -1.0],
    ];
    let [x, y, z] = DIRECTIONS[slot % DIRECTIONS.len()];
    parent + Vector3::new(x, y, z).normalize() * C_H_BOND_LENGTH
}

/// Hydrogens that can be folded back into their parent's hydrogen count.
pub(crate) fn is_removable_hydrogen(
    element: Element,
    formal_charge: i8,
    isotope: u16,
    neighbor_elements: &[Element],
) -> bool {
    element.is_hydrogen()
        && formal_charge == 0
        && isotope == 0
        && neighbor_elements.len() == 1
        && !neighbor_elements[0].is_hydrogen()
}
