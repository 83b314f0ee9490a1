//! Toolkit-neutral connection table.
//!
//! A [`Skeleton`] is what the SMILES and molfile parsers produce and what the canonical
//! SMILES and molfile writers consume. Each toolkit builds its native representation from
//! a skeleton and can flatten itself back into one, so the codecs are written once.

use super::tags::TagStore;
use super::types::{BondOrder, Element, Point};
use super::valence;

/// Undirected bond between two skeleton atoms.
///
/// Endpoints are stored in ascending order so equality is independent of the direction in
/// which the bond was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    /// Index of the first atom (always the lesser index after canonicalization).
    pub a1_idx: usize,
    /// Index of the second atom (greater-or-equal to `a1_idx`).
    pub a2_idx: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(idx1: usize, idx2: usize, order: BondOrder) -> Self {
        if idx1 <= idx2 {
            Self {
                a1_idx: idx1,
                a2_idx: idx2,
                order,
            }
        } else {
            Self {
                a1_idx: idx2,
                a2_idx: idx1,
                order,
            }
        }
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.a1_idx == idx || self.a2_idx == idx
    }

    pub fn partner(&self, idx: usize) -> Option<usize> {
        if self.a1_idx == idx {
            Some(self.a2_idx)
        } else if self.a2_idx == idx {
            Some(self.a1_idx)
        } else {
            None
        }
    }
}

/// One neighbour slot around a tetrahedral centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StereoRef {
    Atom(usize),
    ImplicitH,
}

/// Handedness of a tetrahedral centre: looking from the first reference towards the
/// centre, the remaining references run anticlockwise (`@`) or clockwise (`@@`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winding {
    Anticlockwise,
    Clockwise,
}

impl Winding {
    pub fn flipped(self) -> Self {
        match self {
            Winding::Anticlockwise => Winding::Clockwise,
            Winding::Clockwise => Winding::Anticlockwise,
        }
    }

    pub fn smiles_marker(self) -> &'static str {
        match self {
            Winding::Anticlockwise => "@",
            Winding::Clockwise => "@@",
        }
    }
}

/// Tetrahedral stereo centre expressed against an explicit neighbour ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tetrahedral {
    pub center: usize,
    pub refs: Vec<StereoRef>,
    pub winding: Winding,
}

impl Tetrahedral {
    /// Winding of the same centre when its references are listed in `order`.
    ///
    /// Returns `None` when `order` is not a permutation of the stored references.
    pub fn winding_for(&self, order: &[StereoRef]) -> Option<Winding> {
        let odd = permutation_is_odd(&self.refs, order)?;
        Some(if odd {
            self.winding.flipped()
        } else {
            self.winding
        })
    }

    /// Rewrites atom references through `map`; a reference mapped to `None` disappears and
    /// invalidates the centre.
    pub fn remap(&self, map: impl Fn(usize) -> Option<usize>) -> Option<Self> {
        let center = map(self.center)?;
        let refs = self
            .refs
            .iter()
            .map(|r| match r {
                StereoRef::Atom(idx) => map(*idx).map(StereoRef::Atom),
                StereoRef::ImplicitH => Some(StereoRef::ImplicitH),
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            center,
            refs,
            winding: self.winding,
        })
    }

    /// Replaces one reference with another, keeping its slot in the ordering.
    pub fn replace_ref(&mut self, from: StereoRef, to: StereoRef) -> bool {
        match self.refs.iter_mut().find(|r| **r == from) {
            Some(slot) => {
                *slot = to;
                true
            }
            None => false,
        }
    }
}

fn permutation_is_odd(reference: &[StereoRef], order: &[StereoRef]) -> Option<bool> {
    if reference.len() != order.len() {
        return None;
    }
    let mut perm: Vec<usize> = order
        .iter()
        .map(|r| reference.iter().position(|x| x == r))
        .collect::<Option<Vec<_>>>()?;
    let mut swaps = 0usize;
    for i in 0..perm.len() {
        while perm[i] != i {
            let target = perm[i];
            if target >= perm.len() || perm[target] == target {
                return None;
            }
            perm.swap(i, target);
            swaps += 1;
        }
    }
    Some(swaps % 2 == 1)
}

/// Atom record of a [`Skeleton`].
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonAtom {
    pub element: Element,
    pub formal_charge: i8,
    /// Mass number, zero when unspecified.
    pub isotope: u16,
    pub aromatic: bool,
    /// Fixed implicit hydrogen count; `None` derives it from the default valence rules.
    pub hydrogens: Option<u8>,
}

impl SkeletonAtom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            formal_charge: 0,
            isotope: 0,
            aromatic: false,
            hydrogens: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub title: String,
    pub atoms: Vec<SkeletonAtom>,
    pub bonds: Vec<Bond>,
    pub stereo: Vec<Tetrahedral>,
    /// One position per atom when the record carries coordinates.
    pub coordinates: Option<Vec<Point>>,
    pub tags: TagStore,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, atom: SkeletonAtom) -> usize {
        self.atoms.push(atom);
        self.atoms.len() - 1
    }

    /// Adds a bond unless the pair is already bonded; returns whether it was added.
    pub fn add_bond(&mut self, idx1: usize, idx2: usize, order: BondOrder) -> bool {
        let bond = Bond::new(idx1, idx2, order);
        if idx1 == idx2
            || self
                .bonds
                .iter()
                .any(|b| b.a1_idx == bond.a1_idx && b.a2_idx == bond.a2_idx)
        {
            return false;
        }
        self.bonds.push(bond);
        true
    }

    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = (usize, BondOrder)> + '_ {
        self.bonds
            .iter()
            .filter_map(move |b| b.partner(idx).map(|p| (p, b.order)))
    }

    pub fn adjacency(&self) -> Vec<Vec<(usize, BondOrder)>> {
        let mut adjacency = vec![Vec::new(); self.atoms.len()];
        for bond in &self.bonds {
            adjacency[bond.a1_idx].push((bond.a2_idx, bond.order));
            adjacency[bond.a2_idx].push((bond.a1_idx, bond.order));
        }
        adjacency
    }

    /// Implicit hydrogens the default valence rules assign to atom `idx` given its bonds.
    pub fn default_hydrogens(&self, idx: usize) -> u8 {
        let atom = &self.atoms[idx];
        let mut explicit = 0u8;
        let mut aromatic_bond = false;
        for (_, order) in self.neighbors(idx) {
            explicit = explicit.saturating_add(order.valence());
            aromatic_bond |= order == BondOrder::Aromatic;
        }
        valence::implicit_hydrogens(
            atom.element,
            atom.formal_charge,
            atom.aromatic,
            explicit,
            aromatic_bond,
        )
    }

    /// Implicit hydrogens carried by atom `idx` (fixed count or valence-derived).
    pub fn implicit_hydrogens(&self, idx: usize) -> u8 {
        self.atoms[idx]
            .hydrogens
            .unwrap_or_else(|| self.default_hydrogens(idx))
    }

    /// Implicit hydrogens plus bonded hydrogen atoms.
    pub fn total_hydrogens(&self, idx: usize) -> u8 {
        let bonded = self
            .neighbors(idx)
            .filter(|(n, _)| self.atoms[*n].element.is_hydrogen())
            .count() as u8;
        self.implicit_hydrogens(idx) + bonded
    }

    pub fn stereo_of(&self, idx: usize) -> Option<&Tetrahedral> {
        self.stereo.iter().find(|s| s.center == idx)
    }

    /// Freezes every valence-derived hydrogen count into a fixed one.
    pub fn fix_hydrogens(&mut self) {
        for idx in 0..self.atoms.len() {
            if self.atoms[idx].hydrogens.is_none() {
                self.atoms[idx].hydrogens = Some(self.default_hydrogens(idx));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ethanol() -> Skeleton {
        let mut skeleton = Skeleton::new();
        let c1 = skeleton.add_atom(SkeletonAtom::new(Element::C));
        let c2 = skeleton.add_atom(SkeletonAtom::new(Element::C));
        let o = skeleton.add_atom(SkeletonAtom::new(Element::O));
        skeleton.add_bond(c1, c2, BondOrder::Single);
        skeleton.add_bond(c2, o, BondOrder::Single);
        skeleton
    }

    #[test]
    fn bond_new_canonicalizes_endpoints() {
        let bond = Bond::new(5, 2, BondOrder::Double);
        assert_eq!((bond.a1_idx, bond.a2_idx), (2, 5));
        assert_eq!(bond.partner(2), Some(5));
        assert_eq!(bond.partner(7), None);
    }

    #[test]
    fn add_bond_rejects_duplicates_and_self_loops() {
        let mut skeleton = ethanol();
        assert!(!skeleton.add_bond(1, 0, BondOrder::Single));
        assert!(!skeleton.add_bond(2, 2, BondOrder::Single));
        assert_eq!(skeleton.bonds.len(), 2);
    }

    #[test]
    fn hydrogen_counts_follow_valence_rules() {
        let skeleton = ethanol();
        assert_eq!(skeleton.implicit_hydrogens(0), 3);
        assert_eq!(skeleton.implicit_hydrogens(1), 2);
        assert_eq!(skeleton.implicit_hydrogens(2), 1);
    }

    #[test]
    fn fixed_hydrogen_counts_override_valence_rules() {
        let mut skeleton = ethanol();
        skeleton.atoms[0].hydrogens = Some(2);
        assert_eq!(skeleton.implicit_hydrogens(0), 2);
        skeleton.fix_hydrogens();
        assert_eq!(skeleton.atoms[2].hydrogens, Some(1));
    }

    #[test]
    fn total_hydrogens_include_bonded_hydrogen_atoms() {
        let mut skeleton = ethanol();
        let h = skeleton.add_atom(SkeletonAtom::new(Element::H));
        skeleton.add_bond(2, h, BondOrder::Single);
        assert_eq!(skeleton.implicit_hydrogens(2), 0);
        assert_eq!(skeleton.total_hydrogens(2), 1);
    }

    #[test]
    fn winding_flips_with_odd_permutations() {
        let centre = Tetrahedral {
            center: 0,
            refs: vec![
                StereoRef::Atom(1),
                StereoRef::ImplicitH,
                StereoRef::Atom(2),
                StereoRef::Atom(3),
            ],
            winding: Winding::Anticlockwise,
        };
        let swapped = [
            StereoRef::ImplicitH,
            StereoRef::Atom(1),
            StereoRef::Atom(2),
            StereoRef::Atom(3),
        ];
        let rotated = [
            StereoRef::Atom(1),
            StereoRef::Atom(2),
            StereoRef::Atom(3),
            StereoRef::ImplicitH,
        ];
        assert_eq!(centre.winding_for(&swapped), Some(Winding::Clockwise));
        assert_eq!(centre.winding_for(&rotated), Some(Winding::Anticlockwise));
        assert_eq!(centre.winding_for(&rotated[..3]), None);
    }

    #[test]
    fn remap_drops_centres_touching_removed_atoms() {
        let centre = Tetrahedral {
            center: 1,
            refs: vec![StereoRef::Atom(0), StereoRef::Atom(2), StereoRef::Atom(3)],
            winding: Winding::Clockwise,
        };
        let shifted = centre
            .remap(|i| if i == 0 { None } else { Some(i - 1) });
        assert!(shifted.is_none());

        let shifted = centre.remap(|i| Some(i + 10)).unwrap();
        assert_eq!(shifted.center, 11);
        assert_eq!(shifted.refs[0], StereoRef::Atom(10));
    }
}
