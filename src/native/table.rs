use super::{AtomRecord, NativeMolecule, hydrogen_position, is_removable_hydrogen};
use crate::error::Error;
use crate::model::skeleton::{Bond, Skeleton, SkeletonAtom, StereoRef, Tetrahedral};
use crate::model::tags::TagStore;
use crate::model::types::{BondOrder, Element, Point};
use crate::smiles::{self, CanonPolicy};
use crate::toolkit::Toolkit;

#[derive(Debug, Clone, PartialEq)]
struct TableAtom {
    element: Element,
    formal_charge: i8,
    isotope: u16,
    aromatic: bool,
    /// Implicit hydrogens, fixed when the atom is created.
    hydrogens: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TableBond {
    a: usize,
    b: usize,
    order: BondOrder,
}

impl TableBond {
    fn partner(&self, idx: usize) -> Option<usize> {
        if self.a == idx {
            Some(self.b)
        } else if self.b == idx {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Slot-table molecule engine.
///
/// Every atom occupies a slot whose id is its index for the lifetime of the molecule;
/// deleting an atom empties the slot and leaves the other ids untouched. Implicit hydrogen
/// counts are stored per atom and never recomputed, so removing a neighbour leaves a
/// radical behind. Coordinates live in a flat array addressed by slot id.
#[derive(Debug, Clone)]
pub struct TableMol {
    slots: Vec<Option<TableAtom>>,
    bonds: Vec<TableBond>,
    coords: Option<Vec<f64>>,
    stereo: Vec<Tetrahedral>,
    title: String,
    tags: TagStore,
}

impl TableMol {
    fn live(&self, idx: usize) -> Option<&TableAtom> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.bonds.iter().filter_map(move |b| b.partner(idx))
    }

    fn position(&self, idx: usize) -> Option<Point> {
        let coords = self.coords.as_ref()?;
        let base = idx * 3;
        Some(Point::new(
            *coords.get(base)?,
            *coords.get(base + 1)?,
            *coords.get(base + 2)?,
        ))
    }

    fn push_slot(&mut self, atom: TableAtom, position: Point) -> usize {
        self.slots.push(Some(atom));
        if let Some(coords) = self.coords.as_mut() {
            coords.extend_from_slice(&[position.x, position.y, position.z]);
        }
        self.slots.len() - 1
    }

    fn clear_slot(&mut self, idx: usize) {
        self.slots[idx] = None;
        self.bonds.retain(|b| b.a != idx && b.b != idx);
    }
}

impl NativeMolecule for TableMol {
    fn toolkit(&self) -> Toolkit {
        Toolkit::Table
    }

    fn from_skeleton(skeleton: Skeleton) -> Self {
        let slots = skeleton
            .atoms
            .iter()
            .enumerate()
            .map(|(idx, atom)| {
                Some(TableAtom {
                    element: atom.element,
                    formal_charge: atom.formal_charge,
                    isotope: atom.isotope,
                    aromatic: atom.aromatic,
                    hydrogens: skeleton.implicit_hydrogens(idx),
                })
            })
            .collect();
        let bonds = skeleton
            .bonds
            .iter()
            .map(|b| TableBond {
                a: b.a1_idx,
                b: b.a2_idx,
                order: b.order,
            })
            .collect();
        let coords = skeleton
            .coordinates
            .map(|points| points.iter().flat_map(|p| [p.x, p.y, p.z]).collect());
        Self {
            slots,
            bonds,
            coords,
            stereo: skeleton.stereo,
            title: skeleton.title,
            tags: skeleton.tags,
        }
    }

    fn to_skeleton(&self) -> Skeleton {
        let ids = self.atom_indices();
        let mut position_of = vec![None; self.slots.len()];
        for (pos, id) in ids.iter().enumerate() {
            position_of[*id] = Some(pos);
        }
        let remap = |id: usize| position_of.get(id).copied().flatten();

        let atoms = ids
            .iter()
            .filter_map(|id| self.live(*id))
            .map(|atom| SkeletonAtom {
                element: atom.element,
                formal_charge: atom.formal_charge,
                isotope: atom.isotope,
                aromatic: atom.aromatic,
                hydrogens: Some(atom.hydrogens),
            })
            .collect();
        let bonds = self
            .bonds
            .iter()
            .filter_map(|b| Some(Bond::new(remap(b.a)?, remap(b.b)?, b.order)))
            .collect();
        let stereo = self
            .stereo
            .iter()
            .filter_map(|centre| centre.remap(remap))
            .collect();
        let coordinates = self.coords.as_ref().map(|_| {
            ids.iter()
                .map(|id| self.position(*id).unwrap_or_else(Point::origin))
                .collect()
        });

        Skeleton {
            title: self.title.clone(),
            atoms,
            bonds,
            stereo,
            coordinates,
            tags: self.tags.clone(),
        }
    }

    fn num_atoms(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn num_bonds(&self) -> usize {
        self.bonds.len()
    }

    fn atom_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|_| idx))
            .collect()
    }

    fn atom(&self, idx: usize) -> Option<AtomRecord> {
        let atom = self.live(idx)?;
        let bonded = self
            .neighbors(idx)
            .filter(|n| self.live(*n).is_some_and(|a| a.element.is_hydrogen()))
            .count() as u8;
        Some(AtomRecord {
            element: atom.element,
            formal_charge: atom.formal_charge,
            total_hydrogens: atom.hydrogens + bonded,
        })
    }

    fn set_atomic_num(&mut self, idx: usize, atomic_num: u8) -> Result<(), Error> {
        let atom = self
            .slots
            .get_mut(idx)
            .and_then(Option::as_mut)
            .ok_or(Error::InvalidAtom { index: idx })?;
        atom.element = Element::from_atomic_num(atomic_num);
        Ok(())
    }

    fn delete_atom(&mut self, idx: usize) -> Result<(), Error> {
        if self.live(idx).is_none() {
            return Err(Error::InvalidAtom { index: idx });
        }
        self.clear_slot(idx);
        self.stereo.retain(|centre| {
            centre.center != idx && !centre.refs.contains(&StereoRef::Atom(idx))
        });
        Ok(())
    }

    fn add_hydrogens(&mut self, add_coords: bool) {
        for parent in self.atom_indices() {
            let count = self.live(parent).map_or(0, |a| a.hydrogens);
            if count == 0 {
                continue;
            }
            if let Some(atom) = self.slots[parent].as_mut() {
                atom.hydrogens = 0;
            }
            let origin = self.position(parent);
            for slot in 0..usize::from(count) {
                let position = match origin {
                    Some(origin) if add_coords => hydrogen_position(&origin, slot),
                    _ => Point::origin(),
                };
                let h = self.push_slot(
                    TableAtom {
                        element: Element::H,
                        formal_charge: 0,
                        isotope: 0,
                        aromatic: false,
                        hydrogens: 0,
                    },
                    position,
                );
                self.bonds.push(TableBond {
                    a: parent,
                    b: h,
                    order: BondOrder::Single,
                });
                if slot == 0 {
                    for centre in self.stereo.iter_mut().filter(|s| s.center == parent) {
                        centre.replace_ref(StereoRef::ImplicitH, StereoRef::Atom(h));
                    }
                }
            }
        }
    }

    fn remove_hydrogens(&mut self) {
        let removable: Vec<(usize, usize)> = self
            .atom_indices()
            .into_iter()
            .filter_map(|idx| {
                let atom = self.live(idx)?;
                let neighbors: Vec<usize> = self.neighbors(idx).collect();
                let neighbor_elements: Vec<Element> = neighbors
                    .iter()
                    .filter_map(|n| self.live(*n).map(|a| a.element))
                    .collect();
                is_removable_hydrogen(
                    atom.element,
                    atom.formal_charge,
                    atom.isotope,
                    &neighbor_elements,
                )
                .then(|| (idx, neighbors[0]))
            })
            .collect();

        for (h, parent) in removable {
            if let Some(atom) = self.slots[parent].as_mut() {
                atom.hydrogens = atom.hydrogens.saturating_add(1);
            }
            for centre in self.stereo.iter_mut().filter(|s| s.center == parent) {
                centre.replace_ref(StereoRef::Atom(h), StereoRef::ImplicitH);
            }
            self.clear_slot(h);
        }
    }

    fn coordinates(&self) -> Option<Vec<Point>> {
        self.coords.as_ref()?;
        Some(
            self.atom_indices()
                .into_iter()
                .map(|id| self.position(id).unwrap_or_else(Point::origin))
                .collect(),
        )
    }

    fn set_coordinates(&mut self, coordinates: &[Point]) -> Result<(), Error> {
        let ids = self.atom_indices();
        if coordinates.len() != ids.len() {
            return Err(Error::inconsistent_data(
                "coordinates",
                None,
                format!(
                    "expected {} positions, got {}",
                    ids.len(),
                    coordinates.len()
                ),
            ));
        }
        let mut flat = self
            .coords
            .take()
            .unwrap_or_else(|| vec![0.0; self.slots.len() * 3]);
        flat.resize(self.slots.len() * 3, 0.0);
        for (id, point) in ids.into_iter().zip(coordinates) {
            flat[id * 3] = point.x;
            flat[id * 3 + 1] = point.y;
            flat[id * 3 + 2] = point.z;
        }
        self.coords = Some(flat);
        Ok(())
    }

    fn canonical_smiles(&self, isomeric: bool) -> String {
        smiles::write(
            &self.to_skeleton(),
            isomeric,
            CanonPolicy::TerminalHighestRankFirst,
        )
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn tags(&self) -> &TagStore {
        &self.tags
    }

    fn tags_mut(&mut self) -> &mut TagStore {
        &mut self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_mol(smiles: &str) -> TableMol {
        TableMol::from_skeleton(smiles::parse(smiles).unwrap())
    }

    #[test]
    fn explicit_hydrogens_are_kept_as_atoms() {
        let mol = table_mol("[H]O[H]");
        assert_eq!(mol.num_atoms(), 3);
        assert_eq!(mol.atom(0).unwrap().total_hydrogens, 2);
    }

    #[test]
    fn deleting_atoms_keeps_ids_and_leaves_radicals() {
        let mut mol = table_mol("COCC");

        mol.delete_atom(0).unwrap();
        assert_eq!(mol.atom_indices(), vec![1, 2, 3]);
        assert_eq!(mol.atom(1).unwrap().total_hydrogens, 0);

        mol.delete_atom(1).unwrap();
        assert_eq!(mol.atom_indices(), vec![2, 3]);
        assert_eq!(mol.canonical_smiles(true), "C[CH2]");
    }

    #[test]
    fn deleting_an_empty_slot_is_an_error() {
        let mut mol = table_mol("CC");
        mol.delete_atom(0).unwrap();
        let err = mol.delete_atom(0).expect_err("slot 0 is already empty");
        match err {
            Error::InvalidAtom { index } => assert_eq!(index, 0),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn coordinates_follow_atom_ids_across_deletions() {
        let mut mol = table_mol("CCO");
        mol.set_coordinates(&[
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.5, 0.0, 0.0),
            Point::new(2.0, 1.0, 0.0),
        ])
        .unwrap();

        mol.delete_atom(1).unwrap();
        let coords = mol.coordinates().unwrap();
        assert_eq!(coords, vec![Point::new(0.0, 0.0, 0.0), Point::new(2.0, 1.0, 0.0)]);

        mol.set_coordinates(&[Point::new(9.0, 0.0, 0.0), Point::new(8.0, 0.0, 0.0)])
            .unwrap();
        assert_eq!(mol.position(2), Some(Point::new(8.0, 0.0, 0.0)));
    }

    #[test]
    fn add_and_remove_hydrogens_round_trip() {
        let mut mol = table_mol("O");
        mol.add_hydrogens(false);
        assert_eq!(mol.num_atoms(), 3);
        assert_eq!(mol.atom(0).unwrap().total_hydrogens, 2);

        mol.remove_hydrogens();
        assert_eq!(mol.num_atoms(), 1);
        assert_eq!(mol.atom(0).unwrap().total_hydrogens, 2);
        assert_eq!(mol.canonical_smiles(true), "O");
    }

    #[test]
    fn edits_are_allowed_without_read_write_mode() {
        let mut mol = table_mol("CC");
        mol.make_read_only();
        assert!(!mol.is_read_only());
        assert!(mol.delete_atom(1).is_ok());
    }
}
