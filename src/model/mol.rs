//! Toolkit-agnostic molecule facade.
//!
//! [`Mol`] wraps exactly one native molecule and layers a typed property overlay on top of
//! the native tag store. Structural queries and edits are forwarded to the native engine,
//! so toolkit-specific behaviour (index renumbering, hydrogen re-saturation, read-only
//! mode) shows through unchanged.

use super::atom::{Atom, AtomMut};
use super::props::PropValue;
use super::skeleton::Skeleton;
use super::types::{Element, Point};
use crate::error::Error;
use crate::io::molfile;
use crate::native::NativeMol;
use crate::smiles;
use crate::toolkit::Toolkit;
use std::collections::HashMap;

/// Molecule handle: one native representation plus a typed property overlay.
///
/// Property writes go to both layers (the native store receives the display string);
/// reads prefer the overlay so typed values come back unchanged, and fall back to the
/// native store as text.
#[derive(Debug, Clone)]
pub struct Mol {
    native: NativeMol,
    overlay: HashMap<String, PropValue>,
}

impl Mol {
    /// Wraps an existing native molecule with an empty overlay.
    pub fn from_native(native: NativeMol) -> Self {
        Self {
            native,
            overlay: HashMap::new(),
        }
    }

    /// Builds a molecule of `toolkit` from a parsed connection table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolkitUnavailable`] when `toolkit` was compiled out.
    pub fn from_skeleton(toolkit: Toolkit, skeleton: Skeleton) -> Result<Self, Error> {
        NativeMol::from_skeleton(toolkit, skeleton).map(Self::from_native)
    }

    /// Parses a SMILES string into a molecule of `toolkit`.
    ///
    /// # Arguments
    ///
    /// * `toolkit` - Native engine that will own the molecule.
    /// * `smiles` - SMILES text; anything after the first whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed SMILES.
    pub fn from_smiles(toolkit: Toolkit, smiles: &str) -> Result<Self, Error> {
        let text = smiles.split_whitespace().next().unwrap_or("");
        let skeleton = smiles::parse(text)?;
        NativeMol::from_smiles_skeleton(toolkit, skeleton).map(Self::from_native)
    }

    /// Parses a V2000 molfile block (optionally followed by SD data items).
    pub fn from_molfile(toolkit: Toolkit, block: &str) -> Result<Self, Error> {
        let skeleton = molfile::read_record(block, 1)?;
        Self::from_skeleton(toolkit, skeleton)
    }

    pub fn toolkit(&self) -> Toolkit {
        self.native.toolkit()
    }

    pub fn native(&self) -> &NativeMol {
        &self.native
    }

    pub fn native_mut(&mut self) -> &mut NativeMol {
        &mut self.native
    }

    pub fn into_native(self) -> NativeMol {
        self.native
    }

    pub fn title(&self) -> &str {
        self.native.as_dyn().title()
    }

    pub fn set_title(&mut self, title: &str) {
        self.native.as_dyn_mut().set_title(title);
    }

    // Properties

    pub fn contains(&self, key: &str) -> bool {
        self.overlay.contains_key(key) || self.native.as_dyn().tags().contains(key)
    }

    /// Reads a property, preferring the typed overlay over the native text value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] when neither layer holds `key`.
    pub fn get(&self, key: &str) -> Result<PropValue, Error> {
        if let Some(value) = self.overlay.get(key) {
            return Ok(value.clone());
        }
        self.native
            .as_dyn()
            .tags()
            .get(key)
            .map(PropValue::from)
            .ok_or_else(|| Error::key_not_found(key))
    }

    pub fn get_or(&self, key: &str, default: impl Into<PropValue>) -> PropValue {
        self.get(key).unwrap_or_else(|_| default.into())
    }

    /// Writes a property to the native store (as text) and to the overlay.
    pub fn set(&mut self, key: &str, value: impl Into<PropValue>) {
        let value = value.into();
        self.native
            .as_dyn_mut()
            .tags_mut()
            .set(key, value.to_string());
        self.overlay.insert(key.to_string(), value);
    }

    /// Removes a property from both layers; missing keys are ignored.
    pub fn delete(&mut self, key: &str) {
        self.overlay.remove(key);
        self.native.as_dyn_mut().tags_mut().remove(key);
    }

    /// Property keys: native store order first, then overlay-only keys sorted by name.
    pub fn keys(&self) -> Vec<String> {
        let tags = self.native.as_dyn().tags();
        let mut keys: Vec<String> = tags.keys().map(str::to_string).collect();
        let mut extra: Vec<&String> = self
            .overlay
            .keys()
            .filter(|k| !tags.contains(k))
            .collect();
        extra.sort();
        keys.extend(extra.into_iter().cloned());
        keys
    }

    /// Key/value pairs in [`keys`](Self::keys) order, with overlay values substituted.
    pub fn items(&self) -> Vec<(String, PropValue)> {
        self.keys()
            .into_iter()
            .filter_map(|key| self.get(&key).ok().map(|value| (key, value)))
            .collect()
    }

    // Structure

    pub fn num_atoms(&self) -> usize {
        self.native.as_dyn().num_atoms()
    }

    pub fn num_bonds(&self) -> usize {
        self.native.as_dyn().num_bonds()
    }

    pub fn atoms(&self) -> Vec<Atom<'_>> {
        self.native
            .as_dyn()
            .atom_indices()
            .into_iter()
            .map(|idx| Atom::new(&self.native, idx))
            .collect()
    }

    pub fn atom(&self, idx: usize) -> Option<Atom<'_>> {
        self.native
            .as_dyn()
            .atom(idx)
            .map(|_| Atom::new(&self.native, idx))
    }

    pub fn atom_mut(&mut self, idx: usize) -> Option<AtomMut<'_>> {
        self.native.as_dyn().atom(idx)?;
        Some(AtomMut::new(&mut self.native, idx))
    }

    pub fn atom_symbols(&self) -> Vec<&'static str> {
        self.atoms().iter().map(Atom::symbol).collect()
    }

    /// Atomic numbers in atom-list order.
    pub fn atom_types(&self) -> Vec<u8> {
        self.atoms().iter().map(Atom::atomic_num).collect()
    }

    pub fn elements(&self) -> Vec<Element> {
        self.atoms().iter().map(Atom::element).collect()
    }

    /// Sum of formal charges over all atoms.
    pub fn formal_charge(&self) -> i32 {
        self.atoms()
            .iter()
            .map(|a| i32::from(a.formal_charge()))
            .sum()
    }

    pub fn coordinates(&self) -> Option<Vec<Point>> {
        self.native.as_dyn().coordinates()
    }

    /// Replaces all atom positions, listed in atom-list order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentData`] when the number of positions differs from the
    /// number of atoms.
    pub fn set_coordinates(&mut self, coordinates: &[Point]) -> Result<(), Error> {
        self.native.as_dyn_mut().set_coordinates(coordinates)
    }

    /// Deletes the atom with native index `idx` and its bonds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] for a graph molecule that was not made read-write and
    /// [`Error::InvalidAtom`] for an unknown index.
    pub fn delete_atom(&mut self, idx: usize) -> Result<(), Error> {
        self.native.as_dyn_mut().delete_atom(idx)
    }

    /// Converts implicit hydrogens into explicit atoms; with `add_coords` and a conformer
    /// present, new hydrogens are placed next to their parent.
    pub fn add_hydrogens(&mut self, add_coords: bool) {
        self.native.as_dyn_mut().add_hydrogens(add_coords);
    }

    pub fn remove_hydrogens(&mut self) {
        self.native.as_dyn_mut().remove_hydrogens();
    }

    pub fn make_read_write(&mut self) {
        self.native.as_dyn_mut().make_read_write();
    }

    pub fn make_read_only(&mut self) {
        self.native.as_dyn_mut().make_read_only();
    }

    pub fn is_read_only(&self) -> bool {
        self.native.as_dyn().is_read_only()
    }

    // Serialization

    pub fn canonical_smiles(&self) -> String {
        self.native.as_dyn().canonical_smiles(true)
    }

    pub fn canonical_non_isomeric_smiles(&self) -> String {
        self.native.as_dyn().canonical_smiles(false)
    }

    /// V2000 connection table terminated by `M  END`.
    pub fn mol_file(&self) -> String {
        molfile::write_molfile(&self.native.as_dyn().to_skeleton())
    }

    /// Complete SD record: molfile, one data item per property, `$$$$`.
    pub fn sdf_record(&self) -> String {
        let items = self.items();
        molfile::write_sd_record(
            &self.mol_file(),
            items
                .iter()
                .map(|(key, value)| (key.as_str(), value.to_string())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mol(smiles: &str) -> Mol {
        Mol::from_smiles(Toolkit::Table, smiles).unwrap()
    }

    #[test]
    fn set_then_get_returns_the_typed_value() {
        let mut m = mol("CCO");
        m.set("score", 1.0);
        m.set("values", vec![1.5, 2.0]);

        assert_eq!(m.get("score").unwrap(), PropValue::Float(1.0));
        assert_eq!(m.native().as_dyn().tags().get("score"), Some("1.0"));
        assert_eq!(m.native().as_dyn().tags().get("values"), Some("1.5,2.0"));
    }

    #[test]
    fn get_falls_back_to_native_text() {
        let mut m = mol("CCO");
        m.native_mut().as_dyn_mut().tags_mut().set("origin", "vendor");
        assert_eq!(m.get("origin").unwrap(), PropValue::Text("vendor".into()));
        assert!(m.contains("origin"));
    }

    #[test]
    fn missing_keys_report_key_not_found() {
        let m = mol("C");
        let err = m.get("absent").expect_err("key was never set");
        match err {
            Error::KeyNotFound { key } => assert_eq!(key, "absent"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(m.get_or("absent", 5), PropValue::Integer(5));
    }

    #[test]
    fn delete_removes_both_layers() {
        let mut m = mol("C");
        m.set("x", 3);
        m.delete("x");
        m.delete("never-set");
        assert!(!m.contains("x"));
        assert!(m.keys().is_empty());
    }

    #[test]
    fn keys_follow_native_order() {
        let mut m = mol("C");
        m.native_mut().as_dyn_mut().tags_mut().set("b", "1");
        m.set("a", 2);
        m.set("b", 3.5);
        assert_eq!(m.keys(), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(m.items()[0].1, PropValue::Float(3.5));
    }

    #[test]
    fn atom_queries_cover_symbols_types_and_charge() {
        let m = mol("C[N+](C)(C)C.[Cl-]");
        assert_eq!(m.atom_symbols(), vec!["C", "N", "C", "C", "C", "Cl"]);
        assert_eq!(m.atom_types().iter().map(|z| u32::from(*z)).sum::<u32>(), 48);
        assert_eq!(m.formal_charge(), 0);
    }

    #[test]
    fn sdf_record_includes_properties() {
        let mut m = mol("CO");
        m.set_title("methanol");
        m.set("mw", 32.04);
        let record = m.sdf_record();
        assert!(record.starts_with("methanol\n"));
        assert!(record.ends_with("> <mw>\n32.04\n\n$$$$\n"));
    }

    #[test]
    fn set_coordinates_checks_atom_count() {
        let mut m = mol("CC");
        assert!(m.set_coordinates(&[Point::origin()]).is_err());
        m.set_coordinates(&[Point::origin(), Point::new(1.5, 0.0, 0.0)])
            .unwrap();
        assert_eq!(m.coordinates().unwrap().len(), 2);
    }
}
