//! Explicit toolkit context.
//!
//! A [`ChemContext`] carries the toolkit choice through library code so nothing below the
//! entry point consults process-global state. Contexts are small `Copy` values; scoped
//! switches restore the previous toolkit when the guard goes out of scope.

use crate::error::Error;
use crate::io::{MolInputStream, MolOutputStream, ReadOptions, WriteOptions};
use crate::model::mol::Mol;
use crate::toolkit::{self, Toolkit};
use std::ops::{Deref, DerefMut};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChemContext {
    toolkit: Toolkit,
}

impl ChemContext {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }

    /// Context using the process-wide default toolkit (see [`toolkit::default_toolkit`]).
    ///
    /// # Errors
    ///
    /// Propagates an unrecognized or unavailable toolkit named by the environment.
    pub fn from_env() -> Result<Self, Error> {
        toolkit::default_toolkit().map(Self::new)
    }

    pub fn toolkit(&self) -> Toolkit {
        self.toolkit
    }

    pub fn set_toolkit(&mut self, toolkit: Toolkit) {
        self.toolkit = toolkit;
    }

    /// Switches to `toolkit` until the returned guard is dropped.
    pub fn scoped(&mut self, toolkit: Toolkit) -> ScopedToolkit<'_> {
        let previous = std::mem::replace(&mut self.toolkit, toolkit);
        ScopedToolkit {
            context: self,
            previous,
        }
    }

    pub fn mol_from_smiles(&self, smiles: &str) -> Result<Mol, Error> {
        Mol::from_smiles(self.toolkit, smiles)
    }

    pub fn mol_from_molfile(&self, block: &str) -> Result<Mol, Error> {
        Mol::from_molfile(self.toolkit, block)
    }

    /// Opens a molecule file for reading; format and compression come from the file name.
    pub fn open_input(&self, path: impl AsRef<Path>) -> Result<MolInputStream, Error> {
        MolInputStream::open(path, self, ReadOptions::default())
    }

    /// Creates a molecule file for writing; format and compression come from the file name.
    pub fn create_output(&self, path: impl AsRef<Path>) -> Result<MolOutputStream, Error> {
        MolOutputStream::create(path, WriteOptions::default())
    }
}

impl Default for ChemContext {
    /// Uses the first available toolkit without reading the environment.
    fn default() -> Self {
        Self::new(Toolkit::probe())
    }
}

/// Guard returned by [`ChemContext::scoped`].
#[must_use = "the toolkit switch is reverted as soon as the guard is dropped"]
pub struct ScopedToolkit<'a> {
    context: &'a mut ChemContext,
    previous: Toolkit,
}

impl Deref for ScopedToolkit<'_> {
    type Target = ChemContext;

    fn deref(&self) -> &ChemContext {
        self.context
    }
}

impl DerefMut for ScopedToolkit<'_> {
    fn deref_mut(&mut self) -> &mut ChemContext {
        self.context
    }
}

impl Drop for ScopedToolkit<'_> {
    fn drop(&mut self) {
        self.context.toolkit = self.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_switch_restores_previous_toolkit() {
        let mut ctx = ChemContext::new(Toolkit::Table);
        {
            let scoped = ctx.scoped(Toolkit::Graph);
            assert_eq!(scoped.toolkit(), Toolkit::Graph);
        }
        assert_eq!(ctx.toolkit(), Toolkit::Table);
    }

    #[test]
    fn nested_scopes_unwind_in_order() {
        let mut ctx = ChemContext::new(Toolkit::Graph);
        {
            let mut outer = ctx.scoped(Toolkit::Table);
            {
                let inner = outer.scoped(Toolkit::Graph);
                assert_eq!(inner.toolkit(), Toolkit::Graph);
            }
            assert_eq!(outer.toolkit(), Toolkit::Table);
        }
        assert_eq!(ctx.toolkit(), Toolkit::Graph);
    }

    #[test]
    fn molecules_are_built_with_the_context_toolkit() {
        let ctx = ChemContext::new(Toolkit::Table);
        let mol = ctx.mol_from_smiles("CCO").unwrap();
        assert_eq!(mol.toolkit(), Toolkit::Table);
        assert_eq!(mol.num_atoms(), 3);
    }
}
