use super::{AtomRecord, NativeMolecule, hydrogen_position, is_removable_hydrogen};
use crate::error::Error;
use crate::model::skeleton::{Bond, Skeleton, SkeletonAtom, StereoRef, Tetrahedral};
use crate::model::tags::TagStore;
use crate::model::types::{BondOrder, Element, Point};
use crate::model::valence;
use crate::smiles::{self, CanonPolicy};
use crate::toolkit::Toolkit;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

#[derive(Debug, Clone, PartialEq)]
struct GraphAtom {
    element: Element,
    formal_charge: i8,
    isotope: u16,
    aromatic: bool,
    /// Fixed implicit hydrogen count; `None` is recomputed from the current bonds.
    hydrogens: Option<u8>,
}

impl GraphAtom {
    fn hydrogen() -> Self {
        Self {
            element: Element::H,
            formal_charge: 0,
            isotope: 0,
            aromatic: false,
            hydrogens: Some(0),
        }
    }
}

impl From<&SkeletonAtom> for GraphAtom {
    fn from(atom: &SkeletonAtom) -> Self {
        Self {
            element: atom.element,
            formal_charge: atom.formal_charge,
            isotope: atom.isotope,
            aromatic: atom.aromatic,
            hydrogens: atom.hydrogens,
        }
    }
}

/// Graph-backed molecule engine.
///
/// Atoms live in an undirected petgraph graph whose node indices are the atom indices.
/// Deleting an atom renumbers every later atom, and implicit hydrogen counts that were not
/// fixed by the input are recomputed from the surviving bonds, so neighbours of a deleted
/// atom are re-saturated. Molecules start read-only; structural edits require
/// [`make_read_write`](NativeMolecule::make_read_write).
#[derive(Debug, Clone)]
pub struct GraphMol {
    graph: UnGraph<GraphAtom, BondOrder>,
    conformer: Option<Vec<Point>>,
    stereo: Vec<Tetrahedral>,
    title: String,
    tags: TagStore,
    editable: bool,
}

impl GraphMol {
    fn node(&self, idx: usize) -> Option<NodeIndex> {
        (idx < self.graph.node_count()).then(|| NodeIndex::new(idx))
    }

    fn implicit_hydrogens(&self, node: NodeIndex) -> u8 {
        let atom = &self.graph[node];
        atom.hydrogens.unwrap_or_else(|| {
            let mut explicit = 0u8;
            let mut aromatic_bond = false;
            for edge in self.graph.edges(node) {
                explicit = explicit.saturating_add(edge.weight().valence());
                aromatic_bond |= *edge.weight() == BondOrder::Aromatic;
            }
            valence::implicit_hydrogens(
                atom.element,
                atom.formal_charge,
                atom.aromatic,
                explicit,
                aromatic_bond,
            )
        })
    }

    fn require_editable(&self, operation: &'static str) -> Result<(), Error> {
        if self.editable {
            Ok(())
        } else {
            Err(Error::ReadOnly { operation })
        }
    }

    /// Drops every atom whose `keep` flag is false, renumbering the survivors in order.
    fn retain_atoms(&mut self, keep: &[bool]) {
        let mut new_index = vec![None; keep.len()];
        let mut next = 0usize;
        for (old, kept) in keep.iter().enumerate() {
            if *kept {
                new_index[old] = Some(next);
                next += 1;
            }
        }

        self.graph = self.graph.filter_map(
            |node, atom| keep[node.index()].then(|| atom.clone()),
            |_, order| Some(*order),
        );
        if let Some(conformer) = self.conformer.as_mut() {
            let mut kept = keep.iter();
            conformer.retain(|_| kept.next().copied().unwrap_or(false));
        }
        self.stereo = self
            .stereo
            .iter()
            .filter_map(|centre| centre.remap(|idx| new_index.get(idx).copied().flatten()))
            .collect();
    }
}

impl NativeMolecule for GraphMol {
    fn toolkit(&self) -> Toolkit {
        Toolkit::Graph
    }

    fn from_skeleton(skeleton: Skeleton) -> Self {
        let mut graph = UnGraph::with_capacity(skeleton.atoms.len(), skeleton.bonds.len());
        for atom in &skeleton.atoms {
            graph.add_node(GraphAtom::from(atom));
        }
        for bond in &skeleton.bonds {
            graph.add_edge(
                NodeIndex::new(bond.a1_idx),
                NodeIndex::new(bond.a2_idx),
                bond.order,
            );
        }
        Self {
            graph,
            conformer: skeleton.coordinates,
            stereo: skeleton.stereo,
            title: skeleton.title,
            tags: skeleton.tags,
            editable: false,
        }
    }

    fn to_skeleton(&self) -> Skeleton {
        let atoms = self
            .graph
            .node_weights()
            .map(|atom| SkeletonAtom {
                element: atom.element,
                formal_charge: atom.formal_charge,
                isotope: atom.isotope,
                aromatic: atom.aromatic,
                hydrogens: atom.hydrogens,
            })
            .collect();
        let bonds = self
            .graph
            .edge_references()
            .map(|edge| Bond::new(edge.source().index(), edge.target().index(), *edge.weight()))
            .collect();
        Skeleton {
            title: self.title.clone(),
            atoms,
            bonds,
            stereo: self.stereo.clone(),
            coordinates: self.conformer.clone(),
            tags: self.tags.clone(),
        }
    }

    fn num_atoms(&self) -> usize {
        self.graph.node_count()
    }

    fn num_bonds(&self) -> usize {
        self.graph.edge_count()
    }

    fn atom_indices(&self) -> Vec<usize> {
        (0..self.graph.node_count()).collect()
    }

    fn atom(&self, idx: usize) -> Option<AtomRecord> {
        let node = self.node(idx)?;
        let atom = &self.graph[node];
        let bonded = self
            .graph
            .neighbors(node)
            .filter(|n| self.graph[*n].element.is_hydrogen())
            .count() as u8;
        Some(AtomRecord {
            element: atom.element,
            formal_charge: atom.formal_charge,
            total_hydrogens: self.implicit_hydrogens(node) + bonded,
        })
    }

    fn set_atomic_num(&mut self, idx: usize, atomic_num: u8) -> Result<(), Error> {
        let node = self.node(idx).ok_or(Error::InvalidAtom { index: idx })?;
        self.graph[node].element = Element::from_atomic_num(atomic_num);
        Ok(())
    }

    fn delete_atom(&mut self, idx: usize) -> Result<(), Error> {
        self.require_editable("delete_atom")?;
        if self.node(idx).is_none() {
            return Err(Error::InvalidAtom { index: idx });
        }
        let keep: Vec<bool> = (0..self.graph.node_count()).map(|i| i != idx).collect();
        self.retain_atoms(&keep);
        Ok(())
    }

    fn add_hydrogens(&mut self, add_coords: bool) {
        let parents: Vec<NodeIndex> = self.graph.node_indices().collect();
        for parent in parents {
            let count = self.implicit_hydrogens(parent);
            if count == 0 {
                continue;
            }
            if self.graph[parent].hydrogens.is_some() {
                self.graph[parent].hydrogens = Some(0);
            }
            for slot in 0..usize::from(count) {
                let h = self.graph.add_node(GraphAtom::hydrogen());
                self.graph.add_edge(parent, h, BondOrder::Single);
                if let Some(conformer) = self.conformer.as_mut() {
                    let position = match conformer.get(parent.index()) {
                        Some(origin) if add_coords => hydrogen_position(origin, slot),
                        _ => Point::origin(),
                    };
                    conformer.push(position);
                }
                if slot == 0 {
                    for centre in self.stereo.iter_mut().filter(|s| s.center == parent.index()) {
                        centre.replace_ref(StereoRef::ImplicitH, StereoRef::Atom(h.index()));
                    }
                }
            }
        }
    }

    fn remove_hydrogens(&mut self) {
        let mut keep = vec![true; self.graph.node_count()];
        for node in self.graph.node_indices() {
            let atom = &self.graph[node];
            let neighbors: Vec<NodeIndex> = self.graph.neighbors(node).collect();
            let neighbor_elements: Vec<Element> =
                neighbors.iter().map(|n| self.graph[*n].element).collect();
            if is_removable_hydrogen(
                atom.element,
                atom.formal_charge,
                atom.isotope,
                &neighbor_elements,
            ) {
                keep[node.index()] = false;
            }
        }
        if keep.iter().all(|k| *k) {
            return;
        }

        for (h_idx, kept) in keep.iter().enumerate() {
            if *kept {
                continue;
            }
            let h = NodeIndex::new(h_idx);
            let Some(parent) = self.graph.neighbors(h).next() else {
                continue;
            };
            if let Some(fixed) = self.graph[parent].hydrogens.as_mut() {
                *fixed = fixed.saturating_add(1);
            }
            for centre in self.stereo.iter_mut().filter(|s| s.center == parent.index()) {
                centre.replace_ref(StereoRef::Atom(h_idx), StereoRef::ImplicitH);
            }
        }
        self.retain_atoms(&keep);
    }

    fn coordinates(&self) -> Option<Vec<Point>> {
        self.conformer.clone()
    }

    fn set_coordinates(&mut self, coordinates: &[Point]) -> Result<(), Error> {
        if coordinates.len() != self.graph.node_count() {
            return Err(Error::inconsistent_data(
                "coordinates",
                None,
                format!(
                    "expected {} positions, got {}",
                    self.graph.node_count(),
                    coordinates.len()
                ),
            ));
        }
        self.conformer = Some(coordinates.to_vec());
        Ok(())
    }

    fn canonical_smiles(&self, isomeric: bool) -> String {
        smiles::write(&self.to_skeleton(), isomeric, CanonPolicy::LowestRankFirst)
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

    fn make_read_write(&mut self) {
        self.editable = true;
    }

    fn make_read_only(&mut self) {
        self.editable = false;
    }

    fn is_read_only(&self) -> bool {
        !self.editable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_mol(smiles: &str) -> GraphMol {
        let mut mol = GraphMol::from_skeleton(smiles::parse(smiles).unwrap());
        mol.remove_hydrogens();
        mol
    }

    #[test]
    fn explicit_hydrogens_are_folded_into_their_parent() {
        let mol = graph_mol("[H]O[H]");
        assert_eq!(mol.num_atoms(), 1);
        assert_eq!(mol.atom(0).unwrap().total_hydrogens, 2);
        assert_eq!(mol.canonical_smiles(true), "O");
    }

    #[test]
    fn delete_atom_requires_read_write_mode() {
        let mut mol = graph_mol("CCO");
        let err = mol.delete_atom(0).expect_err("read-only molecule should reject edits");
        match err {
            Error::ReadOnly { operation } => assert_eq!(operation, "delete_atom"),
            other => panic!("unexpected error: {other:?}"),
        }

        mol.make_read_write();
        assert!(mol.delete_atom(0).is_ok());
        assert_eq!(mol.num_atoms(), 2);
    }

    #[test]
    fn deleting_atoms_renumbers_and_resaturates_neighbours() {
        let mut mol = graph_mol("COCC");
        mol.make_read_write();

        mol.delete_atom(0).unwrap();
        assert_eq!(mol.atom_indices(), vec![0, 1, 2]);
        assert_eq!(mol.atom(0).unwrap().element, Element::O);
        assert_eq!(mol.atom(0).unwrap().total_hydrogens, 1);

        mol.delete_atom(0).unwrap();
        assert_eq!(mol.canonical_smiles(true), "CC");
    }

    #[test]
    fn delete_atom_rejects_out_of_range_indices() {
        let mut mol = graph_mol("CC");
        mol.make_read_write();
        let err = mol.delete_atom(5).expect_err("index 5 does not exist");
        match err {
            Error::InvalidAtom { index } => assert_eq!(index, 5),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn add_and_remove_hydrogens_round_trip() {
        let mut mol = graph_mol("CO");
        mol.add_hydrogens(false);
        assert_eq!(mol.num_atoms(), 6);
        assert_eq!(mol.num_bonds(), 5);
        assert_eq!(mol.atom(0).unwrap().total_hydrogens, 3);

        mol.remove_hydrogens();
        assert_eq!(mol.num_atoms(), 2);
        assert_eq!(mol.canonical_smiles(true), "CO");
    }

    #[test]
    fn added_hydrogens_get_coordinates_near_their_parent() {
        let mut mol = graph_mol("C");
        mol.set_coordinates(&[Point::new(1.0, 1.0, 1.0)]).unwrap();
        mol.add_hydrogens(true);

        let coords = mol.coordinates().unwrap();
        assert_eq!(coords.len(), 5);
        for h in &coords[1..] {
            assert!(((h - coords[0]).norm() - 1.09).abs() < 1e-9);
        }
    }

    #[test]
    fn stereo_survives_explicit_hydrogen_round_trip() {
        let mut mol = graph_mol("N[C@@H](C)C(=O)O");
        let before = mol.canonical_smiles(true);
        mol.add_hydrogens(false);
        mol.remove_hydrogens();
        assert_eq!(mol.canonical_smiles(true), before);
        assert!(before.contains('@'));
    }

    #[test]
    fn set_coordinates_rejects_wrong_length() {
        let mut mol = graph_mol("CC");
        let err = mol
            .set_coordinates(&[Point::origin()])
            .expect_err("one position for two atoms");
        assert!(matches!(err, Error::InconsistentData { .. }));
    }
}
