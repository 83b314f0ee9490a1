//! Borrowed atom views over a molecule's native representation.
//!
//! Atoms are not owned objects: an [`Atom`] is an index into the native engine plus a
//! borrow of the molecule, so every accessor reads the current native state. [`AtomMut`]
//! adds the one per-atom edit the facade exposes.

use super::types::Element;
use crate::error::Error;
use crate::native::{AtomRecord, NativeMol};
use std::fmt;

/// Read-only view of one atom.
#[derive(Clone, Copy)]
pub struct Atom<'a> {
    native: &'a NativeMol,
    idx: usize,
}

impl<'a> Atom<'a> {
    pub(crate) fn new(native: &'a NativeMol, idx: usize) -> Self {
        Self { native, idx }
    }

    fn record(&self) -> Option<AtomRecord> {
        self.native.as_dyn().atom(self.idx)
    }

    /// Native atom index (contiguous for the graph toolkit, a stable id for the table
    /// toolkit).
    pub fn index(&self) -> usize {
        self.idx
    }

    pub fn element(&self) -> Element {
        self.record().map_or(Element::Unknown, |r| r.element)
    }

    pub fn atomic_num(&self) -> u8 {
        self.element().atomic_num()
    }

    pub fn symbol(&self) -> &'static str {
        self.element().symbol()
    }

    pub fn formal_charge(&self) -> i8 {
        self.record().map_or(0, |r| r.formal_charge)
    }

    /// Implicit hydrogens plus bonded hydrogen atoms.
    pub fn total_hydrogen_count(&self) -> u8 {
        self.record().map_or(0, |r| r.total_hydrogens)
    }
}

impl fmt::Debug for Atom<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("index", &self.idx)
            .field("element", &self.element())
            .field("formal_charge", &self.formal_charge())
            .finish()
    }
}

/// Mutable view of one atom.
pub struct AtomMut<'a> {
    native: &'a mut NativeMol,
    idx: usize,
}

impl<'a> AtomMut<'a> {
    pub(crate) fn new(native: &'a mut NativeMol, idx: usize) -> Self {
        Self { native, idx }
    }

    pub fn index(&self) -> usize {
        self.idx
    }

    pub fn as_atom(&self) -> Atom<'_> {
        Atom::new(self.native, self.idx)
    }

    pub fn atomic_num(&self) -> u8 {
        self.as_atom().atomic_num()
    }

    pub fn symbol(&self) -> &'static str {
        self.as_atom().symbol()
    }

    /// Replaces the element of this atom.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAtom`] if the atom has been deleted since the view was taken.
    pub fn set_atomic_num(&mut self, atomic_num: u8) -> Result<(), Error> {
        self.native.as_dyn_mut().set_atomic_num(self.idx, atomic_num)
    }
}
